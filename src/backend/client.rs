//! HTTP client for the QC analysis backend.
//!
//! This module provides functionality to:
//! - Request presigned upload targets (which also mint the job identifier)
//! - Stream-upload sequence files to object storage without loading them
//!   into memory
//! - Submit uploaded objects for analysis
//! - Poll job status
//! - Fetch finished QC reports
//!
//! # Logging
//!
//! Only HTTP method, path, status code and duration are logged. Request and
//! response bodies are never logged.

use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::info;
use url::Url;

use crate::backend::report::QcReport;
use crate::backend::{JobStatus, UploadTarget};
use crate::config::{ApiConfig, CLIENT_USER_AGENT};
use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the presign endpoint.
#[derive(Debug, Serialize)]
struct PresignRequest<'a> {
    filename: &'a str,
    filesize: u64,
}

/// Response body from the presign endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresignResponse {
    upload_url: String,
    s3_key: String,
    job_id: String,
}

/// Request body for the submit endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    job_id: &'a str,
    s3_key: &'a str,
    filename: &'a str,
}

/// Response body from the status endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: JobStatus,
}

/// Backend error response format.
#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// QcApiClient
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the QC backend API.
///
/// Stateless beyond the configured base address; safe to clone and share.
/// No retries at this layer — retry policy belongs to the callers (the
/// upload path surfaces failures, the polling path waits for the next pass).
#[derive(Debug, Clone)]
pub struct QcApiClient {
    /// The underlying HTTP client.
    http: reqwest::Client,
    /// Base address of the backend API gateway.
    base_url: Url,
}

impl QcApiClient {
    /// Creates a new client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client fails to initialize.
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    /// Asks the backend to mint a presigned upload destination and a job
    /// identifier for the given file.
    ///
    /// # Errors
    ///
    /// - `AppError::BackendError` - API error
    /// - `AppError::ConnectionFailed` - Network error
    pub async fn request_upload_target(
        &self,
        filename: &str,
        size_bytes: u64,
    ) -> Result<UploadTarget, AppError> {
        let url = self.build_url("/upload")?;
        let body = PresignRequest {
            filename,
            filesize: size_bytes,
        };

        let start = Instant::now();
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Presign request failed: {}", e)))?;

        let status = response.status();
        info!(
            "[QC-API] POST /upload -> {} {}ms",
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(parse_error_response(response, status).await);
        }

        let presign: PresignResponse = response.json().await.map_err(|e| {
            AppError::BackendError(format!("Failed to parse presign response: {}", e))
        })?;

        let upload_url = Url::parse(&presign.upload_url).map_err(|e| {
            AppError::BackendError(format!("Backend returned an invalid upload URL: {}", e))
        })?;

        Ok(UploadTarget {
            upload_url,
            storage_key: presign.s3_key,
            job_id: presign.job_id,
        })
    }

    /// Streams the file at `path` to the presigned upload destination.
    ///
    /// The file is streamed directly from disk to the network; it is never
    /// held in memory in full. The transfer bypasses the backend and writes
    /// to object storage directly.
    ///
    /// # Errors
    ///
    /// - `AppError::Internal` - File read error
    /// - `AppError::BackendError` - Storage rejected the write
    /// - `AppError::ConnectionFailed` - Network error
    pub async fn store_file(
        &self,
        target: &UploadTarget,
        path: &std::path::Path,
    ) -> Result<(), AppError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to open sequence file: {}", e)))?;

        let metadata = file
            .metadata()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read file metadata: {}", e)))?;
        let file_size = metadata.len();

        let stream = ReaderStream::new(file);
        let body = reqwest::Body::wrap_stream(stream);

        info!(
            "[QC-API] PUT <upload-target> for job {} ({} bytes)",
            redact_id(&target.job_id),
            file_size
        );

        let start = Instant::now();
        let response = self
            .http
            .put(target.upload_url.clone())
            // Object storage rejects chunked transfer encoding, so the length
            // is declared up front even though the body is streamed.
            .header(CONTENT_LENGTH, file_size)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("File upload failed: {}", e)))?;

        let status = response.status();
        info!(
            "[QC-API] PUT <upload-target> for job {} -> {} {}ms",
            redact_id(&target.job_id),
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(AppError::BackendError(format!(
                "Object storage rejected the upload: HTTP {}",
                status.as_u16()
            )));
        }

        Ok(())
    }

    /// Registers the uploaded object for QC analysis.
    ///
    /// Must only be called after [`store_file`](QcApiClient::store_file)
    /// succeeded; submitting earlier would process against missing input.
    ///
    /// # Errors
    ///
    /// - `AppError::BackendError` - API error
    /// - `AppError::ConnectionFailed` - Network error
    pub async fn submit_job(
        &self,
        job_id: &str,
        storage_key: &str,
        filename: &str,
    ) -> Result<(), AppError> {
        let url = self.build_url("/submit")?;
        let body = SubmitRequest {
            job_id,
            s3_key: storage_key,
            filename,
        };

        let start = Instant::now();
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Job submission failed: {}", e)))?;

        let status = response.status();
        info!(
            "[QC-API] POST /submit (job {}) -> {} {}ms",
            redact_id(job_id),
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(parse_error_response(response, status).await);
        }

        Ok(())
    }

    /// Gets the current status of a job. Side-effect free.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` - Job unknown to the backend
    /// - `AppError::BackendError` - API error or unparseable status
    /// - `AppError::ConnectionFailed` - Network error
    pub async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, AppError> {
        let url = self.build_url(&format!("/job/{}", job_id))?;

        let start = Instant::now();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Status check failed: {}", e)))?;

        let status = response.status();
        info!(
            "[QC-API] GET /job/{} -> {} {}ms",
            redact_id(job_id),
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(parse_error_response(response, status).await);
        }

        let parsed: StatusResponse = response.json().await.map_err(|e| {
            AppError::BackendError(format!("Failed to parse status response: {}", e))
        })?;

        Ok(parsed.status)
    }

    /// Fetches the QC report for a job.
    ///
    /// Meaningful only once [`fetch_status`](QcApiClient::fetch_status)
    /// reports `Succeeded`. The report object is written by the compute
    /// backend after the status flips, so a 404 here maps to
    /// [`AppError::ResultsNotReady`] rather than a hard failure.
    pub async fn fetch_results(&self, job_id: &str) -> Result<QcReport, AppError> {
        let url = self.build_url(&format!("/results/{}", job_id))?;

        let start = Instant::now();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Results fetch failed: {}", e)))?;

        let status = response.status();
        info!(
            "[QC-API] GET /results/{} -> {} {}ms",
            redact_id(job_id),
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::ResultsNotReady(job_id.to_string()));
        }

        if !status.is_success() {
            return Err(parse_error_response(response, status).await);
        }

        let report: QcReport = response.json().await.map_err(|e| {
            AppError::BackendError(format!("Failed to parse QC report: {}", e))
        })?;

        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // URL Builder
    // ─────────────────────────────────────────────────────────────────────────

    /// Joins an API path onto the configured base address.
    fn build_url(&self, path: &str) -> Result<Url, AppError> {
        // Url::join swallows the base path unless it ends with '/', so build
        // by string concatenation against the trimmed base.
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, path))
            .map_err(|e| AppError::Internal(format!("Failed to build URL for {}: {}", path, e)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error Handling
// ─────────────────────────────────────────────────────────────────────────────

/// Parses an error response and maps it to the appropriate AppError.
async fn parse_error_response(
    response: reqwest::Response,
    status: reqwest::StatusCode,
) -> AppError {
    if status == reqwest::StatusCode::NOT_FOUND {
        return AppError::NotFound("Job not found on the backend".to_string());
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("Unable to read error body"));

    if let Ok(err) = serde_json::from_str::<BackendErrorBody>(&body) {
        return AppError::BackendError(err.message);
    }

    AppError::BackendError(format!(
        "HTTP {} - {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown error")
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Redacts a job ID for logging (shows first 8 chars).
fn redact_id(id: &str) -> String {
    if id.len() > 8 {
        format!("{}...", &id[..8])
    } else {
        id.to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
