//! Error types for the export crate.

use std::io;
use thiserror::Error;

/// Errors raised while writing derivation outputs.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Output file or directory could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The output document could not be serialized.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The workbook archive could not be assembled.
    #[error("Workbook archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The output directory does not exist or is not a directory.
    #[error("Output directory not found: {0}")]
    MissingDirectory(String),
}

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
