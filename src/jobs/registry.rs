//! In-memory registry of tracked QC jobs.
//!
//! The registry is the only shared mutable state in the crate. It exposes
//! exactly two mutators — [`JobRegistry::insert`] and
//! [`JobRegistry::merge_update`] — so a whole record can never be replaced
//! wholesale. Updates arriving from the poller and from user-triggered result
//! fetches are merged field-wise; a result payload, once present, is never
//! overwritten. That rule makes concurrent result fetches for the same job
//! commutative and idempotent, so whichever arrives second is a no-op.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::backend::report::QcReport;
use crate::backend::JobStatus;

// ─────────────────────────────────────────────────────────────────────────────
// JobRecord
// ─────────────────────────────────────────────────────────────────────────────

/// One tracked unit of analysis work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    /// Backend-assigned identifier. Unique within the registry.
    pub id: String,
    /// Original file name. Immutable after creation.
    pub source_filename: String,
    /// Size of the uploaded file in bytes. Immutable after creation.
    pub size_bytes: u64,
    /// Last status observed from the backend.
    pub status: JobStatus,
    /// Unix timestamp (seconds) of submission. Set once at creation.
    pub submitted_at: i64,
    /// QC report; set at most once, only after the job succeeded.
    pub results: Option<QcReport>,
}

impl JobRecord {
    /// Creates a freshly submitted record with no results.
    pub fn new(id: String, source_filename: String, size_bytes: u64, submitted_at: i64) -> Self {
        Self {
            id,
            source_filename,
            size_bytes,
            status: JobStatus::Submitted,
            submitted_at,
            results: None,
        }
    }

    /// Returns true while the job is still eligible for status polling.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Returns true when the job finished but its report has not landed yet.
    /// Such jobs stay in the reconciliation pass for the results fetch only.
    pub fn awaiting_results(&self) -> bool {
        self.status == JobStatus::Succeeded && self.results.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JobUpdate
// ─────────────────────────────────────────────────────────────────────────────

/// Field-wise delta applied to a record by [`JobRegistry::merge_update`].
///
/// Absent fields leave the existing value untouched.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub results: Option<QcReport>,
}

impl JobUpdate {
    /// A delta carrying only a status transition.
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            results: None,
        }
    }

    /// Attaches a fetched report to the delta.
    pub fn with_results(mut self, results: QcReport) -> Self {
        self.results = Some(results);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JobRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered collection of job records, most recently submitted first.
///
/// Records are kept for the session's lifetime; there is no eviction.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Vec<JobRecord>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new record at the front of the ordering.
    ///
    /// # Panics
    ///
    /// Panics if a record with the same id already exists. Job ids are minted
    /// by the backend per presign call, so a duplicate is a programming
    /// error, not a runtime path.
    pub fn insert(&mut self, record: JobRecord) {
        assert!(
            !self.jobs.iter().any(|j| j.id == record.id),
            "duplicate job id inserted: {}",
            record.id
        );
        self.jobs.insert(0, record);
    }

    /// Merges a delta into the record with the given id.
    ///
    /// - `status` is applied when present.
    /// - `results` is applied only when the record has none yet; an
    ///   already-present report is never overwritten, regardless of payload.
    ///
    /// Returns a clone of the merged record, or `None` for an unknown id.
    pub fn merge_update(&mut self, id: &str, update: JobUpdate) -> Option<JobRecord> {
        let record = self.jobs.iter_mut().find(|j| j.id == id)?;

        if let Some(status) = update.status {
            record.status = status;
        }
        if record.results.is_none() {
            if let Some(results) = update.results {
                record.results = Some(results);
            }
        }

        Some(record.clone())
    }

    /// Looks up a record by id.
    pub fn get(&self, id: &str) -> Option<&JobRecord> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Returns all records, most recently submitted first.
    pub fn snapshot(&self) -> Vec<JobRecord> {
        self.jobs.clone()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// The registry as shared between the orchestrator, the poller, and the
/// session facade.
pub type SharedRegistry = Arc<RwLock<JobRegistry>>;

/// Creates an empty shared registry.
pub fn shared_registry() -> SharedRegistry {
    Arc::new(RwLock::new(JobRegistry::new()))
}

/// Returns the current unix timestamp in seconds.
pub(crate) fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs() as i64
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> JobRecord {
        JobRecord::new(id.to_string(), format!("{}.fastq", id), 1_000_000, 1_700_000_000)
    }

    fn report(label: &str) -> QcReport {
        QcReport {
            filename: label.to_string(),
            summary: Vec::new(),
            basic_stats: None,
            report_modules: Default::default(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Insert / Lookup Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn insert_orders_most_recent_first() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));
        registry.insert(record("j2"));
        registry.insert(record("j3"));

        let ids: Vec<_> = registry.snapshot().into_iter().map(|j| j.id).collect();

        assert_eq!(ids, vec!["j3", "j2", "j1"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    #[should_panic(expected = "duplicate job id")]
    fn duplicate_insert_panics() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));
        registry.insert(record("j1"));
    }

    #[test]
    fn get_finds_records_by_id() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));
        registry.insert(record("j2"));

        assert_eq!(registry.get("j1").unwrap().source_filename, "j1.fastq");
        assert!(registry.get("j9").is_none());
    }

    #[test]
    fn new_records_start_submitted_without_results() {
        let rec = record("j1");

        assert_eq!(rec.status, JobStatus::Submitted);
        assert!(rec.results.is_none());
        assert!(rec.is_active());
        assert!(!rec.awaiting_results());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Merge Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn merge_applies_status_and_preserves_other_fields() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));

        let merged = registry
            .merge_update("j1", JobUpdate::status(JobStatus::Running))
            .unwrap();

        assert_eq!(merged.status, JobStatus::Running);
        assert_eq!(merged.source_filename, "j1.fastq");
        assert_eq!(merged.size_bytes, 1_000_000);
        assert!(merged.results.is_none());
    }

    #[test]
    fn merge_without_results_never_clears_an_existing_report() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));
        registry.merge_update(
            "j1",
            JobUpdate::status(JobStatus::Succeeded).with_results(report("p")),
        );

        // A later status-only merge must leave the report alone.
        let merged = registry
            .merge_update("j1", JobUpdate::status(JobStatus::Succeeded))
            .unwrap();

        assert_eq!(merged.results, Some(report("p")));
    }

    #[test]
    fn merge_skips_results_when_already_populated() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));
        registry.merge_update(
            "j1",
            JobUpdate::status(JobStatus::Succeeded).with_results(report("first")),
        );

        // Even a different payload must not replace the stored one.
        let merged = registry
            .merge_update("j1", JobUpdate::default().with_results(report("second")))
            .unwrap();

        assert_eq!(merged.results, Some(report("first")));
    }

    #[test]
    fn merging_the_same_payload_twice_is_idempotent() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));

        let update = JobUpdate::status(JobStatus::Succeeded).with_results(report("p"));
        registry.merge_update("j1", update.clone());
        let once = registry.snapshot();

        registry.merge_update("j1", update);
        let twice = registry.snapshot();

        assert_eq!(once, twice);
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));
        let before = registry.snapshot();

        registry.merge_update("j1", JobUpdate::default());

        assert_eq!(registry.snapshot(), before);
    }

    #[test]
    fn merge_unknown_id_returns_none() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));

        assert!(registry
            .merge_update("j9", JobUpdate::status(JobStatus::Running))
            .is_none());
    }

    #[test]
    fn merge_leaves_unrelated_records_untouched() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));
        registry.insert(record("j2"));

        registry.merge_update("j2", JobUpdate::status(JobStatus::Failed));

        assert_eq!(registry.get("j1").unwrap().status, JobStatus::Submitted);
        assert_eq!(registry.get("j2").unwrap().status, JobStatus::Failed);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Working Set Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn terminal_records_are_not_active() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));
        registry.merge_update("j1", JobUpdate::status(JobStatus::Failed));

        assert!(!registry.get("j1").unwrap().is_active());
    }

    #[test]
    fn succeeded_without_report_awaits_results() {
        let mut registry = JobRegistry::new();
        registry.insert(record("j1"));
        registry.merge_update("j1", JobUpdate::status(JobStatus::Succeeded));

        let rec = registry.get("j1").unwrap();
        assert!(!rec.is_active());
        assert!(rec.awaiting_results());

        registry.merge_update("j1", JobUpdate::default().with_results(report("p")));
        assert!(!registry.get("j1").unwrap().awaiting_results());
    }
}
