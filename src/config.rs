//! Client configuration for the QC analysis backend.

use std::time::Duration;

use url::Url;

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// User agent string for all backend API requests.
pub const CLIENT_USER_AGENT: &str = "seqcheck/0.1.0";

/// Default request timeout in seconds. Generous because the object-storage
/// transfer of a multi-gigabyte sequence file rides on the same client.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default period between status reconciliation passes.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Environment variable overriding the backend base address.
pub const API_BASE_URL_ENV: &str = "SEQCHECK_API_BASE_URL";

// ─────────────────────────────────────────────────────────────────────────────
// ApiConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for reaching the QC backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base address of the backend API gateway.
    pub base_url: Url,
    /// Period between status reconciliation passes.
    pub poll_interval: Duration,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Creates a configuration for the given base address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the address does not parse as a URL.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Internal(format!("Invalid API base URL: {}", e)))?;

        Ok(Self {
            base_url,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Creates a configuration from the `SEQCHECK_API_BASE_URL` environment
    /// variable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the variable is unset or not a URL.
    pub fn from_env() -> Result<Self, AppError> {
        let base = std::env::var(API_BASE_URL_ENV).map_err(|_| {
            AppError::Internal(format!("{} is not set", API_BASE_URL_ENV))
        })?;
        Self::new(&base)
    }

    /// Overrides the polling period.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
