//! QC backend HTTP client and API interaction layer.
//!
//! This module is the only place the crate performs I/O against the remote
//! compute backend. Key pieces:
//!
//! - [`QcApiClient`] — stateless wrapper over the four backend endpoints
//!   (presign, submit, status, results) plus the direct object-storage PUT
//! - [`JobStatus`] — the remote job state machine as reported by the backend
//! - [`BackendOps`] — trait seam over the client so orchestration and polling
//!   can be exercised against in-process fakes

pub mod client;
pub mod report;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;
use report::QcReport;

pub use client::QcApiClient;

// ─────────────────────────────────────────────────────────────────────────────
// JobStatus
// ─────────────────────────────────────────────────────────────────────────────

/// Remote state of a QC job, as reported by the status endpoint.
///
/// The wire format is the upper-case string form (`"PENDING"`, `"RUNNING"`,
/// ...). The set is closed on purpose: an unknown string fails
/// deserialization, which polling treats as that cycle's fetch failure rather
/// than inventing a catch-all state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    /// Queued on the backend, not yet handed to the compute environment.
    Pending,
    /// Accepted for processing. Initial status of every tracked job.
    Submitted,
    /// Compute environment is provisioning resources.
    Starting,
    /// Waiting for a free slot in the compute environment.
    Runnable,
    /// Analysis in progress.
    Running,
    /// Analysis finished; a report exists (or will shortly).
    Succeeded,
    /// Analysis failed. Terminal; resubmission is the only retry.
    Failed,
}

impl JobStatus {
    /// Converts the status to its wire/display string.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Submitted => "SUBMITTED",
            JobStatus::Starting => "STARTING",
            JobStatus::Runnable => "RUNNABLE",
            JobStatus::Running => "RUNNING",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Returns true if the job can no longer change state.
    ///
    /// Terminal jobs leave the polling working set but stay in the registry.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UploadTarget
// ─────────────────────────────────────────────────────────────────────────────

/// A backend-minted upload destination paired with the job identity it
/// belongs to.
///
/// Issued before any bytes are transferred; the presigned `upload_url` is
/// written to directly, bypassing the backend for the transfer itself.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    /// Time-limited, write-capable object-storage URL.
    pub upload_url: Url,
    /// Storage key the uploaded object will live under.
    pub storage_key: String,
    /// Backend-assigned job identifier.
    pub job_id: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// BackendOps Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait over the remote backend operations, allowing test fakes.
///
/// The upload orchestrator and the status poller are generic over this trait
/// so their sequencing and merge behavior can be verified without a network.
pub trait BackendOps: Send + Sync {
    /// Asks the backend to mint an upload destination and a job identifier.
    /// Must be called before any bytes are transferred.
    fn request_upload_target<'a>(
        &'a self,
        filename: &'a str,
        size_bytes: u64,
    ) -> Pin<Box<dyn Future<Output = Result<UploadTarget, AppError>> + Send + 'a>>;

    /// Transfers the raw file bytes to the destination from
    /// [`request_upload_target`](BackendOps::request_upload_target).
    fn store_file<'a>(
        &'a self,
        target: &'a UploadTarget,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'a>>;

    /// Registers the stored object for processing. Only valid after
    /// [`store_file`](BackendOps::store_file) succeeded.
    fn submit_job<'a>(
        &'a self,
        job_id: &'a str,
        storage_key: &'a str,
        filename: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'a>>;

    /// Cheap, side-effect-free status read.
    fn fetch_status<'a>(
        &'a self,
        job_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<JobStatus, AppError>> + Send + 'a>>;

    /// Fetches the QC report. Meaningful only once the status reads
    /// `Succeeded`; may still return [`AppError::ResultsNotReady`] after that
    /// (eventual consistency), which callers tolerate.
    fn fetch_results<'a>(
        &'a self,
        job_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<QcReport, AppError>> + Send + 'a>>;
}

/// Implementation of BackendOps for the real HTTP client.
impl BackendOps for QcApiClient {
    fn request_upload_target<'a>(
        &'a self,
        filename: &'a str,
        size_bytes: u64,
    ) -> Pin<Box<dyn Future<Output = Result<UploadTarget, AppError>> + Send + 'a>> {
        Box::pin(QcApiClient::request_upload_target(self, filename, size_bytes))
    }

    fn store_file<'a>(
        &'a self,
        target: &'a UploadTarget,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'a>> {
        Box::pin(QcApiClient::store_file(self, target, path))
    }

    fn submit_job<'a>(
        &'a self,
        job_id: &'a str,
        storage_key: &'a str,
        filename: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'a>> {
        Box::pin(QcApiClient::submit_job(self, job_id, storage_key, filename))
    }

    fn fetch_status<'a>(
        &'a self,
        job_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<JobStatus, AppError>> + Send + 'a>> {
        Box::pin(QcApiClient::fetch_status(self, job_id))
    }

    fn fetch_results<'a>(
        &'a self,
        job_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<QcReport, AppError>> + Send + 'a>> {
        Box::pin(QcApiClient::fetch_results(self, job_id))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
