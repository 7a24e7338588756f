//! Upload orchestration: the presign → store → submit protocol.
//!
//! Each file runs the three remote steps strictly in order; different files
//! run concurrently with each other. A record only reaches the registry after
//! the final step succeeds, so partially-uploaded files are never visible as
//! jobs — the transient `uploading` flag is the only externally observable
//! signal before then.
//!
//! Failure handling is per-file: a failed step aborts that file's pipeline,
//! surfaces one error, and leaves every other file and every existing job
//! untouched. A failure after the presign (or after storage) strands a
//! backend-side job id (or stored object) with no registry record; the
//! protocol has no cleanup call, and the orphan is accepted.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::backend::BackendOps;
use crate::error::AppError;
use crate::jobs::registry::{current_timestamp, JobRecord, SharedRegistry};
use crate::jobs::selection::SelectionView;
use crate::validation;

// ─────────────────────────────────────────────────────────────────────────────
// Outcome Types
// ─────────────────────────────────────────────────────────────────────────────

/// One file that did not make it through the submission protocol.
#[derive(Debug)]
pub struct UploadFailure {
    /// Name of the offending file.
    pub filename: String,
    /// The step failure that aborted its pipeline.
    pub error: AppError,
}

/// Result of one `submit_files` batch.
#[derive(Debug, Default)]
pub struct SubmitOutcome {
    /// Job ids of successfully submitted files, in completion order.
    pub accepted: Vec<String>,
    /// Files whose pipeline aborted, with the reason.
    pub failures: Vec<UploadFailure>,
}

impl SubmitOutcome {
    /// Returns true if every file in the batch was accepted.
    pub fn all_accepted(&self) -> bool {
        self.failures.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UploadOrchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Drives the three-step submission protocol and inserts accepted jobs into
/// the registry.
pub struct UploadOrchestrator<B> {
    backend: Arc<B>,
    registry: SharedRegistry,
    selection: Arc<SelectionView>,
    uploading: Arc<AtomicBool>,
}

impl<B: BackendOps + 'static> UploadOrchestrator<B> {
    pub fn new(backend: Arc<B>, registry: SharedRegistry, selection: Arc<SelectionView>) -> Self {
        Self {
            backend,
            registry,
            selection,
            uploading: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true while a submission batch is in flight.
    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }

    /// Submits a batch of sequence files for analysis.
    ///
    /// Files are processed concurrently; each either lands as a new
    /// `Submitted` record in the registry (and becomes the current
    /// selection) or is reported in the outcome's failure list. The batch
    /// itself never fails as a whole.
    pub async fn submit_files(&self, paths: Vec<PathBuf>) -> SubmitOutcome {
        if paths.is_empty() {
            return SubmitOutcome::default();
        }

        self.uploading.store(true, Ordering::SeqCst);
        info!("[UPLOAD] Starting submission batch of {} file(s)", paths.len());

        let mut join_set: JoinSet<Result<String, UploadFailure>> = JoinSet::new();
        for path in paths {
            let backend = self.backend.clone();
            let registry = self.registry.clone();
            let selection = self.selection.clone();
            join_set.spawn(async move {
                Self::submit_one(backend, registry, selection, path).await
            });
        }

        let mut outcome = SubmitOutcome::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(job_id)) => outcome.accepted.push(job_id),
                Ok(Err(failure)) => {
                    warn!(
                        "[UPLOAD] {} aborted: {}",
                        failure.filename, failure.error
                    );
                    outcome.failures.push(failure);
                }
                Err(e) => {
                    warn!("[UPLOAD] Submission task panicked: {}", e);
                    outcome.failures.push(UploadFailure {
                        filename: String::from("<unknown>"),
                        error: AppError::Internal(format!("Submission task failed: {}", e)),
                    });
                }
            }
        }

        self.uploading.store(false, Ordering::SeqCst);
        info!(
            "[UPLOAD] Batch finished: {} accepted, {} failed",
            outcome.accepted.len(),
            outcome.failures.len()
        );

        outcome
    }

    /// Runs the full pipeline for a single file.
    ///
    /// Strictly ordered: validate, presign, store, submit, then insert. The
    /// record is constructed the moment the job identifier is known to be
    /// live on the backend, i.e. after the submit step confirms it.
    async fn submit_one(
        backend: Arc<B>,
        registry: SharedRegistry,
        selection: Arc<SelectionView>,
        path: PathBuf,
    ) -> Result<String, UploadFailure> {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let fail = |error: AppError| UploadFailure {
            filename: display_name.clone(),
            error,
        };

        // Step 0: screen the input before any network traffic.
        let meta = validation::validate(&path).await.map_err(&fail)?;

        // Step 1: mint the upload destination and the job identity.
        let target = backend
            .request_upload_target(&meta.filename, meta.size_bytes)
            .await
            .map_err(&fail)?;

        info!(
            "[UPLOAD] {} -> job {} ({} bytes)",
            meta.filename, target.job_id, meta.size_bytes
        );

        // Step 2: transfer the bytes. A failure here strands the job id from
        // step 1 on the backend; no record is created for it.
        backend.store_file(&target, &path).await.map_err(&fail)?;

        // Step 3: register the stored object for processing. A failure here
        // strands the stored object; accepted, not retried.
        backend
            .submit_job(&target.job_id, &target.storage_key, &meta.filename)
            .await
            .map_err(&fail)?;

        // Step 4: only now does the job become visible to the UI.
        let record = JobRecord::new(
            target.job_id.clone(),
            meta.filename,
            meta.size_bytes,
            current_timestamp(),
        );
        registry.write().await.insert(record);
        selection.focus(&target.job_id).await;

        Ok(target.job_id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::Ordering as AtomicOrdering;

    use tempfile::TempDir;

    use crate::backend::JobStatus;
    use crate::jobs::registry::shared_registry;
    use crate::jobs::testing::FakeBackend;

    struct Fixture {
        _temp_dir: TempDir,
        backend: Arc<FakeBackend>,
        registry: SharedRegistry,
        selection: Arc<SelectionView>,
        orchestrator: UploadOrchestrator<FakeBackend>,
    }

    impl Fixture {
        fn new() -> Self {
            let backend = Arc::new(FakeBackend::new());
            let registry = shared_registry();
            let selection = Arc::new(SelectionView::new());
            let orchestrator = UploadOrchestrator::new(
                backend.clone(),
                registry.clone(),
                selection.clone(),
            );
            Self {
                _temp_dir: TempDir::new().expect("temp dir"),
                backend,
                registry,
                selection,
                orchestrator,
            }
        }

        /// Writes a fixture file of the given size and returns its path.
        fn write_file(&self, name: &str, size: usize) -> PathBuf {
            let path = self._temp_dir.path().join(name);
            std::fs::write(&path, vec![b'A'; size]).expect("write fixture");
            path
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Happy Path Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn single_file_lands_as_submitted_record() {
        let fx = Fixture::new();
        let path = fx.write_file("sample.fastq", 1_000_000);

        let outcome = fx.orchestrator.submit_files(vec![path]).await;

        assert!(outcome.all_accepted());
        assert_eq!(outcome.accepted.len(), 1);

        let registry = fx.registry.read().await;
        assert_eq!(registry.len(), 1);
        let record = registry.get(&outcome.accepted[0]).unwrap();
        assert_eq!(record.source_filename, "sample.fastq");
        assert_eq!(record.size_bytes, 1_000_000);
        assert_eq!(record.status, JobStatus::Submitted);
        assert!(record.results.is_none());
        drop(registry);

        // The freshly submitted job becomes the current selection.
        assert_eq!(
            fx.selection.current_id().await,
            Some(outcome.accepted[0].clone())
        );

        // Exactly one call per protocol step.
        assert_eq!(fx.backend.presign_calls.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(fx.backend.store_calls.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(fx.backend.submit_calls.load(AtomicOrdering::SeqCst), 1);

        assert!(!fx.orchestrator.is_uploading());
    }

    #[tokio::test]
    async fn concurrent_files_get_distinct_correctly_attributed_records() {
        let fx = Fixture::new();
        let paths = vec![
            fx.write_file("a.fastq", 100),
            fx.write_file("b.fastq.gz", 200),
            fx.write_file("c.fq.gz", 300),
        ];

        let outcome = fx.orchestrator.submit_files(paths).await;

        assert!(outcome.all_accepted());
        assert_eq!(outcome.accepted.len(), 3);

        let distinct: HashSet<_> = outcome.accepted.iter().collect();
        assert_eq!(distinct.len(), 3, "job ids must be unique");

        // Each record carries exactly its own filename and size, regardless
        // of how the uploads interleaved.
        let registry = fx.registry.read().await;
        assert_eq!(registry.len(), 3);
        let by_name = |name: &str| {
            registry
                .snapshot()
                .into_iter()
                .find(|r| r.source_filename == name)
                .unwrap_or_else(|| panic!("no record for {}", name))
        };
        assert_eq!(by_name("a.fastq").size_bytes, 100);
        assert_eq!(by_name("b.fastq.gz").size_bytes, 200);
        assert_eq!(by_name("c.fq.gz").size_bytes, 300);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let fx = Fixture::new();

        let outcome = fx.orchestrator.submit_files(Vec::new()).await;

        assert!(outcome.all_accepted());
        assert!(outcome.accepted.is_empty());
        assert_eq!(fx.backend.total_calls(), 0);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Failure Isolation Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn presign_failure_aborts_before_any_transfer() {
        let fx = Fixture::new();
        let path = fx.write_file("sample.fastq", 1_000);
        fx.backend.fail_presign_for("sample.fastq");

        let outcome = fx.orchestrator.submit_files(vec![path]).await;

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].filename, "sample.fastq");
        assert!(fx.registry.read().await.is_empty());
        assert_eq!(fx.backend.store_calls.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(fx.backend.submit_calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_failure_creates_no_record_and_spares_other_files() {
        let fx = Fixture::new();
        let good = fx.write_file("good.fastq", 500);
        let bad = fx.write_file("bad.fastq", 500);
        fx.backend.fail_store_for("bad.fastq");

        let outcome = fx.orchestrator.submit_files(vec![good, bad]).await;

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].filename, "bad.fastq");
        assert!(matches!(
            outcome.failures[0].error,
            AppError::ConnectionFailed(_)
        ));

        // Only the good file is tracked; the failed one was never inserted.
        let registry = fx.registry.read().await;
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot()[0].source_filename, "good.fastq");

        // The submit step never ran for the failed file.
        assert_eq!(fx.backend.submit_calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn submit_failure_after_storage_creates_no_record() {
        let fx = Fixture::new();
        let path = fx.write_file("sample.fastq", 500);
        fx.backend.fail_submit_for("sample.fastq");

        let outcome = fx.orchestrator.submit_files(vec![path]).await;

        // Storage succeeded, but the job never became trackable: the stored
        // object is an accepted orphan.
        assert_eq!(fx.backend.store_calls.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(fx.registry.read().await.is_empty());
    }

    #[tokio::test]
    async fn failure_leaves_previously_submitted_jobs_untouched() {
        let fx = Fixture::new();
        let first = fx.write_file("first.fastq", 100);
        let outcome = fx.orchestrator.submit_files(vec![first]).await;
        let first_id = outcome.accepted[0].clone();

        let second = fx.write_file("second.fastq", 100);
        fx.backend.fail_store_for("second.fastq");
        let outcome = fx.orchestrator.submit_files(vec![second]).await;

        assert_eq!(outcome.failures.len(), 1);
        let registry = fx.registry.read().await;
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&first_id).unwrap().status, JobStatus::Submitted);
    }

    #[tokio::test]
    async fn invalid_file_is_rejected_without_network_traffic() {
        let fx = Fixture::new();
        let path = fx.write_file("notes.txt", 100);

        let outcome = fx.orchestrator.submit_files(vec![path]).await;

        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            outcome.failures[0].error,
            AppError::UnsupportedFile(_)
        ));
        assert_eq!(fx.backend.total_calls(), 0);
        assert!(fx.registry.read().await.is_empty());
    }

    #[tokio::test]
    async fn uploading_flag_is_clear_outside_a_batch() {
        let fx = Fixture::new();
        assert!(!fx.orchestrator.is_uploading());

        let path = fx.write_file("sample.fastq", 100);
        fx.orchestrator.submit_files(vec![path]).await;

        assert!(!fx.orchestrator.is_uploading());
    }
}
