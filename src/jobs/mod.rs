//! Job lifecycle management: registry, upload orchestration, status polling,
//! and the current-selection view.
//!
//! Data flows in one direction: the orchestrator inserts freshly submitted
//! records into the registry, the poller reconciles them against remote
//! status, and the selection view mirrors whatever the registry holds. The
//! UI layer only ever reads snapshots and calls the operations exposed here;
//! it never mutates job state directly.

pub mod poller;
pub mod registry;
pub mod selection;
pub mod upload;

pub use poller::{PassSummary, StatusPoller};
pub use registry::{shared_registry, JobRecord, JobRegistry, JobUpdate, SharedRegistry};
pub use selection::SelectionView;
pub use upload::{SubmitOutcome, UploadFailure, UploadOrchestrator};

// ─────────────────────────────────────────────────────────────────────────────
// Test Support
// ─────────────────────────────────────────────────────────────────────────────
