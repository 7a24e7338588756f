use serde::Serialize;
use thiserror::Error;

/// User-friendly error presentation for the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPresentation {
    pub title: String,
    pub message: String,
    pub action: Option<String>,
}

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Network ───────────────────────────────────────────────────────────────
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    // ── API ───────────────────────────────────────────────────────────────────
    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend has marked the job complete but the report object has not
    /// materialized yet. Callers on the polling path treat this as "no update
    /// this cycle", never as a user-visible failure.
    #[error("Results not yet available for job {0}")]
    ResultsNotReady(String),

    // ── Jobs ──────────────────────────────────────────────────────────────────
    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    // ── Input files ───────────────────────────────────────────────────────────
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("File exceeds the size limit: {0}")]
    FileTooLarge(String),

    #[error("File is empty: {0}")]
    EmptyFile(String),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Converts the error into a user-friendly presentation suitable for UI
    /// display.
    pub fn to_presentation(&self) -> ErrorPresentation {
        match self {
            // ── Network ───────────────────────────────────────────────────────
            AppError::ConnectionFailed(_) => ErrorPresentation {
                title: "Connection Failed".into(),
                message: "Could not reach the analysis backend. Please check your internet connection and the configured API address.".into(),
                action: Some("Check network and retry".into()),
            },

            // ── API ───────────────────────────────────────────────────────────
            AppError::BackendError(msg) => ErrorPresentation {
                title: "Backend Error".into(),
                message: msg.clone(),
                action: None,
            },

            AppError::NotFound(msg) => ErrorPresentation {
                title: "Not Found".into(),
                message: msg.clone(),
                action: None,
            },

            AppError::ResultsNotReady(_) => ErrorPresentation {
                title: "Results Pending".into(),
                message: "The QC report is still being written. It will appear automatically once ready.".into(),
                action: Some("Wait for the next refresh".into()),
            },

            // ── Jobs ──────────────────────────────────────────────────────────
            AppError::JobFailed { job_id: _, message } => ErrorPresentation {
                title: "Analysis Failed".into(),
                message: message.clone(),
                action: Some("Resubmit the file to retry".into()),
            },

            // ── Input files ───────────────────────────────────────────────────
            AppError::UnsupportedFile(name) => ErrorPresentation {
                title: "Unsupported File".into(),
                message: format!(
                    "{} is not a recognized sequence file. Accepted formats: .fastq, .fastq.gz, .fq.gz.",
                    name
                ),
                action: Some("Choose a FASTQ file".into()),
            },

            AppError::FileTooLarge(name) => ErrorPresentation {
                title: "File Too Large".into(),
                message: format!("{} exceeds the 5 GB per-file limit.", name),
                action: Some("Split or compress the file".into()),
            },

            AppError::EmptyFile(name) => ErrorPresentation {
                title: "Empty File".into(),
                message: format!("{} contains no data.", name),
                action: Some("Check the file and try again".into()),
            },

            // ── Generic ───────────────────────────────────────────────────────
            AppError::Internal(_) => ErrorPresentation {
                title: "Unexpected Error".into(),
                message: "Something went wrong. Please try again.".into(),
                action: Some("Try again".into()),
            },
        }
    }

    /// Returns true for the eventual-consistency signal from the results
    /// endpoint, which polling treats as a non-event.
    pub fn is_results_not_ready(&self) -> bool {
        matches!(self, AppError::ResultsNotReady(_))
    }
}
