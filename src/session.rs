//! Session facade produced to the UI layer.
//!
//! A [`QcSession`] owns the wired-together lifecycle manager: the backend
//! client, the job registry, the upload orchestrator, the status poller, and
//! the selection view. The UI reads snapshots and calls the operations here;
//! it never mutates job state directly.
//!
//! All session state is in-memory and dies with the process — job history is
//! deliberately not persisted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendOps, QcApiClient};
use crate::config::ApiConfig;
use crate::error::{AppError, ErrorPresentation};
use crate::jobs::poller::{PassSummary, StatusPoller};
use crate::jobs::registry::{shared_registry, JobRecord, SharedRegistry};
use crate::jobs::selection::SelectionView;
use crate::jobs::upload::{SubmitOutcome, UploadOrchestrator};

// ─────────────────────────────────────────────────────────────────────────────
// ErrorChannel
// ─────────────────────────────────────────────────────────────────────────────

/// Holds the most recent operational error for the UI, cleared by the next
/// successful operation.
#[derive(Debug, Default)]
pub struct ErrorChannel {
    last: RwLock<Option<ErrorPresentation>>,
}

impl ErrorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for display.
    pub async fn set(&self, error: &AppError) {
        *self.last.write().await = Some(error.to_presentation());
    }

    /// Clears the channel after a successful operation.
    pub async fn clear(&self) {
        *self.last.write().await = None;
    }

    /// Returns the currently displayed error, if any.
    pub async fn current(&self) -> Option<ErrorPresentation> {
        self.last.read().await.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// QcSession
// ─────────────────────────────────────────────────────────────────────────────

/// One interactive session of the QC job tracker.
pub struct QcSession<B: BackendOps + 'static> {
    backend: Arc<B>,
    registry: SharedRegistry,
    selection: Arc<SelectionView>,
    orchestrator: UploadOrchestrator<B>,
    poller: StatusPoller<B>,
    poller_cancel: CancellationToken,
    errors: ErrorChannel,
}

impl QcSession<QcApiClient> {
    /// Builds a session against the real backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client fails to initialize.
    pub fn connect(config: &ApiConfig) -> Result<Self, AppError> {
        let client = QcApiClient::new(config)?;
        Ok(Self::with_backend(Arc::new(client), config.poll_interval))
    }
}

impl<B: BackendOps + 'static> QcSession<B> {
    /// Builds a session over an arbitrary backend implementation.
    pub fn with_backend(backend: Arc<B>, poll_interval: Duration) -> Self {
        let registry = shared_registry();
        let selection = Arc::new(SelectionView::new());
        let orchestrator =
            UploadOrchestrator::new(backend.clone(), registry.clone(), selection.clone());
        let poller = StatusPoller::new(backend.clone(), registry.clone(), poll_interval);
        let poller_cancel = poller.cancellation_token();

        Self {
            backend,
            registry,
            selection,
            orchestrator,
            poller,
            poller_cancel,
            errors: ErrorChannel::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Upload Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Submits a batch of sequence files for analysis.
    ///
    /// Accepted files appear as `Submitted` records; the first failure, if
    /// any, lands on the error channel. A fully successful batch clears the
    /// channel.
    pub async fn submit_files(&self, paths: Vec<PathBuf>) -> SubmitOutcome {
        let outcome = self.orchestrator.submit_files(paths).await;

        match outcome.failures.first() {
            Some(failure) => self.errors.set(&failure.error).await,
            None => self.errors.clear().await,
        }

        outcome
    }

    /// Returns true while a submission batch is in flight.
    pub fn is_uploading(&self) -> bool {
        self.orchestrator.is_uploading()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registry Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot of all tracked jobs, most recently submitted first.
    pub async fn jobs(&self) -> Vec<JobRecord> {
        self.registry.read().await.snapshot()
    }

    /// Number of tracked jobs.
    pub async fn job_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Looks up one job by identifier.
    pub async fn job(&self, id: &str) -> Option<JobRecord> {
        self.registry.read().await.get(id).cloned()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────

    /// Focuses a job for detail display, lazily pulling its report when the
    /// job already succeeded but the report has not been merged yet.
    pub async fn select(&self, job_id: &str) -> Result<JobRecord, AppError> {
        match self
            .selection
            .select(job_id, &self.registry, self.backend.as_ref())
            .await
        {
            Ok(record) => {
                self.errors.clear().await;
                Ok(record)
            }
            Err(e) => {
                self.errors.set(&e).await;
                Err(e)
            }
        }
    }

    /// The currently focused record, resolved through the registry so poller
    /// merges are always reflected.
    pub async fn selected(&self) -> Option<JobRecord> {
        self.selection.current(&self.registry).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Polling
    // ─────────────────────────────────────────────────────────────────────────

    /// Starts the recurring reconciliation loop.
    pub fn start_polling(&self) -> JoinHandle<()> {
        self.poller.spawn()
    }

    /// Runs one reconciliation pass immediately.
    pub async fn refresh(&self) -> PassSummary {
        self.poller.run_pass().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Errors / Teardown
    // ─────────────────────────────────────────────────────────────────────────

    /// The most recent operational error, if it has not been superseded by a
    /// successful operation.
    pub async fn last_error(&self) -> Option<ErrorPresentation> {
        self.errors.current().await
    }

    /// Stops the polling loop. In-flight requests finish and their merges
    /// apply; no new passes start.
    pub fn shutdown(&self) {
        self.poller_cancel.cancel();
    }
}

impl<B: BackendOps + 'static> Drop for QcSession<B> {
    fn drop(&mut self) {
        self.poller_cancel.cancel();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
