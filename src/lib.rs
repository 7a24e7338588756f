//! seqcheck — client-side lifecycle manager for asynchronous FASTQ
//! quality-control jobs.
//!
//! Large sequence files are submitted to a remote compute backend through a
//! three-step protocol (presign, direct object-storage upload, submit), then
//! tracked in an in-memory registry that a recurring poller reconciles
//! against remote status. Finished reports are merged into their job record
//! exactly once, no matter how many fetch paths race for them.
//!
//! The intended consumer is a frontend shell: it calls
//! [`QcSession::submit_files`], renders [`QcSession::jobs`] and
//! [`QcSession::selected`], and maps statuses to badges via
//! [`presentation::badge_for`]. Nothing outside this crate mutates job state.
//!
//! ```no_run
//! use seqcheck::{ApiConfig, QcSession};
//!
//! # async fn run() -> Result<(), seqcheck::AppError> {
//! let config = ApiConfig::new("https://qc.example.com")?;
//! let session = QcSession::connect(&config)?;
//! let _poller = session.start_polling();
//!
//! let outcome = session
//!     .submit_files(vec!["sample.fastq".into()])
//!     .await;
//! println!("accepted {} job(s)", outcome.accepted.len());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod jobs;
pub mod presentation;
pub mod session;
pub mod validation;

pub use backend::{BackendOps, JobStatus, QcApiClient, UploadTarget};
pub use config::ApiConfig;
pub use error::{AppError, ErrorPresentation};
pub use jobs::{
    JobRecord, JobRegistry, JobUpdate, PassSummary, SelectionView, StatusPoller, SubmitOutcome,
    UploadFailure, UploadOrchestrator,
};
pub use session::{ErrorChannel, QcSession};
