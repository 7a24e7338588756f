//! Periodic reconciliation of the job registry against remote status.
//!
//! A single recurring timer drives one reconciliation pass per period. Each
//! pass computes the working set — non-terminal jobs, plus succeeded jobs
//! whose report has not landed yet — and reconciles every member
//! independently and concurrently. An empty working set issues zero remote
//! calls.
//!
//! Failures on this path are silent: a job whose status fetch fails is left
//! unchanged and picked up again next period, so long-running jobs do not
//! spray transient-error noise at the user. Missed ticks are skipped rather
//! than queued, so a slow pass coalesces with the next one instead of
//! piling up overlapping passes.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::{BackendOps, JobStatus};
use crate::jobs::registry::{JobUpdate, SharedRegistry};

// ─────────────────────────────────────────────────────────────────────────────
// PassSummary
// ─────────────────────────────────────────────────────────────────────────────

/// What one reconciliation pass did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Jobs in this pass's working set.
    pub polled: usize,
    /// Status transitions applied to the registry.
    pub transitions: usize,
    /// Reports fetched and merged.
    pub results_fetched: usize,
}

/// What a working-set member needs from the backend this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollKind {
    /// Non-terminal: read the status (and the report on a fresh `Succeeded`).
    Status,
    /// Already succeeded, report still missing: retry the report fetch only.
    ResultsOnly,
}

// ─────────────────────────────────────────────────────────────────────────────
// StatusPoller
// ─────────────────────────────────────────────────────────────────────────────

/// Recurring reconciliation pass over all unfinished jobs in the registry.
pub struct StatusPoller<B> {
    backend: Arc<B>,
    registry: SharedRegistry,
    period: Duration,
    cancel: CancellationToken,
}

impl<B: BackendOps + 'static> StatusPoller<B> {
    pub fn new(backend: Arc<B>, registry: SharedRegistry, period: Duration) -> Self {
        Self {
            backend,
            registry,
            period,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that tears the polling loop down when cancelled.
    ///
    /// Cancellation only prevents new passes; a pass already in flight runs
    /// to completion and its merges apply.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawns the polling loop. The first pass runs one full period after
    /// spawning.
    pub fn spawn(&self) -> JoinHandle<()> {
        let backend = self.backend.clone();
        let registry = self.registry.clone();
        let cancel = self.cancel.clone();
        let period = self.period;

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("[POLLER] Polling loop stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let summary = Self::reconcile(&backend, &registry).await;
                        if summary.transitions > 0 || summary.results_fetched > 0 {
                            info!(
                                "[POLLER] Pass complete: {} polled, {} transition(s), {} report(s)",
                                summary.polled, summary.transitions, summary.results_fetched
                            );
                        }
                    }
                }
            }
        })
    }

    /// Runs one reconciliation pass immediately.
    ///
    /// Exposed for on-demand refresh; the recurring loop calls the same
    /// logic. Safe to race with the loop and with selection-triggered result
    /// fetches — all merges are idempotent.
    pub async fn run_pass(&self) -> PassSummary {
        Self::reconcile(&self.backend, &self.registry).await
    }

    /// One reconciliation pass over the current working set.
    async fn reconcile(backend: &Arc<B>, registry: &SharedRegistry) -> PassSummary {
        // Snapshot the working set without holding the lock across I/O.
        let working: Vec<(String, PollKind)> = {
            let guard = registry.read().await;
            guard
                .snapshot()
                .into_iter()
                .filter_map(|record| {
                    if record.is_active() {
                        Some((record.id, PollKind::Status))
                    } else if record.awaiting_results() {
                        Some((record.id, PollKind::ResultsOnly))
                    } else {
                        None
                    }
                })
                .collect()
        };

        if working.is_empty() {
            return PassSummary::default();
        }

        let polled = working.len();

        // Each job is reconciled independently; one job's slow or failing
        // fetch does not block the others.
        let fetches = working.into_iter().map(|(job_id, kind)| {
            let backend = backend.clone();
            async move {
                let update = match kind {
                    PollKind::Status => Self::fetch_one(&backend, &job_id).await?,
                    PollKind::ResultsOnly => match backend.fetch_results(&job_id).await {
                        Ok(report) => JobUpdate::default().with_results(report),
                        Err(e) => {
                            debug!("[POLLER] Report for job {} still pending: {}", job_id, e);
                            return None;
                        }
                    },
                };
                Some((job_id, update))
            }
        });

        let outcomes = join_all(fetches).await;

        let mut summary = PassSummary {
            polled,
            ..Default::default()
        };

        let mut guard = registry.write().await;
        for (job_id, update) in outcomes.into_iter().flatten() {
            let before = match guard.get(&job_id) {
                Some(record) => (record.status, record.results.is_some()),
                None => continue,
            };

            if let Some(after) = guard.merge_update(&job_id, update) {
                if after.status != before.0 {
                    summary.transitions += 1;
                    debug!(
                        "[POLLER] Job {} transitioned {} -> {}",
                        job_id,
                        before.0.as_str(),
                        after.status.as_str()
                    );
                }
                if after.results.is_some() && !before.1 {
                    summary.results_fetched += 1;
                }
            }
        }

        summary
    }

    /// Fetches one job's status and, on a completed job, attempts the report
    /// fetch in the same pass.
    ///
    /// Returns `None` when the status fetch failed — the record is left
    /// unchanged and the next pass retries.
    async fn fetch_one(backend: &Arc<B>, job_id: &str) -> Option<JobUpdate> {
        let status = match backend.fetch_status(job_id).await {
            Ok(status) => status,
            Err(e) => {
                debug!("[POLLER] Status fetch for job {} failed: {}", job_id, e);
                return None;
            }
        };

        let mut update = JobUpdate::status(status);

        if status == JobStatus::Succeeded {
            // Status and report availability may be observed out of order; a
            // missing report here is retried on later passes because the
            // record stays in the working set while `results` is null.
            match backend.fetch_results(job_id).await {
                Ok(report) => update = update.with_results(report),
                Err(e) => {
                    debug!("[POLLER] Report for job {} not ready yet: {}", job_id, e);
                }
            }
        }

        Some(update)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
