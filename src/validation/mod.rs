//! Input screening for sequence files before submission.

mod fastq;

pub use fastq::{
    screen, validate, FileMeta, MAX_FILE_SIZE_BYTES, SUPPORTED_EXTENSIONS,
};
