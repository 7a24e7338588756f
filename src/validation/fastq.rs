//! Pre-flight screening of sequence files.
//!
//! Screening is metadata-only: the accepted-format check looks at the file
//! name and the size check at the file system, so arbitrarily large inputs
//! are screened without reading a byte of sequence data. Runs before any
//! network call in the upload pipeline.

use std::path::Path;

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// File name suffixes accepted for submission (matched case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".fastq", ".fastq.gz", ".fq.gz"];

/// Maximum accepted file size (5 GB).
pub const MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024 * 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata of a screened, accepted input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// File name without its directory, as shown to the user and the backend.
    pub filename: String,
    /// Size in bytes.
    pub size_bytes: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Screens a file for submission.
///
/// # Errors
///
/// - `AppError::UnsupportedFile` - Unrecognized extension
/// - `AppError::EmptyFile` - Zero-byte file
/// - `AppError::FileTooLarge` - Over the 5 GB limit
/// - `AppError::Internal` - The path is unreadable or not a regular file
pub async fn validate(path: &Path) -> Result<FileMeta, AppError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            AppError::Internal(format!("Path has no file name: {}", path.display()))
        })?;

    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        AppError::Internal(format!("Failed to read metadata for {}: {}", filename, e))
    })?;

    if !metadata.is_file() {
        return Err(AppError::Internal(format!(
            "{} is not a regular file",
            filename
        )));
    }

    screen(&filename, metadata.len())
}

/// The pure screening rules, separated from file-system access.
pub fn screen(filename: &str, size_bytes: u64) -> Result<FileMeta, AppError> {
    if !has_supported_extension(filename) {
        return Err(AppError::UnsupportedFile(filename.to_string()));
    }
    if size_bytes == 0 {
        return Err(AppError::EmptyFile(filename.to_string()));
    }
    if size_bytes > MAX_FILE_SIZE_BYTES {
        return Err(AppError::FileTooLarge(filename.to_string()));
    }

    Ok(FileMeta {
        filename: filename.to_string(),
        size_bytes,
    })
}

/// Returns true if the file name carries one of the accepted suffixes.
fn has_supported_extension(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
