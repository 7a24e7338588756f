//! Current-selection view over the job registry.
//!
//! The selection stores only a job identifier. The displayed record is
//! recomputed by registry lookup on every read, so merges applied by the
//! poller are visible to the detail panel without any mirroring bookkeeping —
//! the view can never drift from the registry.

use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::BackendOps;
use crate::error::AppError;
use crate::jobs::registry::{JobRecord, JobUpdate, SharedRegistry};

// ─────────────────────────────────────────────────────────────────────────────
// SelectionView
// ─────────────────────────────────────────────────────────────────────────────

/// Holds which job is currently focused for detail display.
#[derive(Debug, Default)]
pub struct SelectionView {
    /// Identifier of the focused job, if any.
    current_id: RwLock<Option<String>>,
}

impl SelectionView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focuses the given job without any remote interaction.
    ///
    /// Used by the upload orchestrator right after inserting a fresh record,
    /// where no results can exist yet.
    pub async fn focus(&self, job_id: &str) {
        *self.current_id.write().await = Some(job_id.to_string());
    }

    /// Clears the focus.
    pub async fn clear(&self) {
        *self.current_id.write().await = None;
    }

    /// Returns the focused job identifier, if any.
    pub async fn current_id(&self) -> Option<String> {
        self.current_id.read().await.clone()
    }

    /// Resolves the focused record by lookup into the registry.
    pub async fn current(&self, registry: &SharedRegistry) -> Option<JobRecord> {
        let id = self.current_id.read().await.clone()?;
        registry.read().await.get(&id).cloned()
    }

    /// Focuses a job and lazily pulls its report if the job has succeeded
    /// but the report has not been merged yet.
    ///
    /// The fetched payload goes through the same registry merge as the
    /// poller's, so when both race for the same job the second arrival is a
    /// no-op rather than a regression.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` - The id is not in the registry.
    /// - Transport/backend errors from the on-demand fetch. A
    ///   `ResultsNotReady` response is swallowed: the report will be merged
    ///   by a later reconciliation pass.
    pub async fn select<B: BackendOps>(
        &self,
        job_id: &str,
        registry: &SharedRegistry,
        backend: &B,
    ) -> Result<JobRecord, AppError> {
        let record = registry
            .read()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("job {} is not tracked", job_id)))?;

        *self.current_id.write().await = Some(job_id.to_string());

        if !record.awaiting_results() {
            return Ok(record);
        }

        // The registry lock is not held across the fetch; an interleaving
        // poller pass may win the race, which the merge rule absorbs.
        match backend.fetch_results(job_id).await {
            Ok(report) => {
                let merged = registry
                    .write()
                    .await
                    .merge_update(job_id, JobUpdate::default().with_results(report));
                Ok(merged.unwrap_or(record))
            }
            Err(e) if e.is_results_not_ready() => {
                debug!("[SELECT] Report for job {} not materialized yet", job_id);
                Ok(record)
            }
            Err(e) => Err(e),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
