//! Error types for the core crate.
//!
//! Everything here is a structural problem with the input: shapes and
//! lengths that disagree, or values that can never describe a stent.
//! These are detected before any numeric work starts.

use std::io;
use thiserror::Error;

/// Errors raised while reading or validating a stent specification.
#[derive(Error, Debug)]
pub enum SpecError {
    /// The link matrix does not have (num_rings - 1) rows and crowns_per_ring columns.
    #[error(
        "Link matrix shape mismatch: expected {expected_rows}x{expected_cols} \
         (num_rings-1 x crowns_per_ring), got {actual_rows}x{actual_cols}"
    )]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    /// One row of the link matrix has a different width from the first row.
    #[error("Ragged link matrix: row {row} has {actual} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A link matrix entry other than 0 or 1.
    #[error("Invalid link value {value} at row {row}, column {col} (expected 0 or 1)")]
    InvalidLinkValue { row: usize, col: usize, value: i64 },

    /// A per-ring (or per-row/column) list has the wrong number of entries.
    #[error("'{field}' has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// A scalar is out of its valid domain.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// The input document could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input document is not valid JSON or is missing fields.
    #[error("Malformed input document: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SpecError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for specification handling.
pub type SpecResult<T> = Result<T, SpecError>;

/// Fails unless `value` is finite and strictly positive.
pub(crate) fn require_positive(field: &str, value: f64) -> SpecResult<()> {
    if !value.is_finite() {
        return Err(SpecError::invalid(field, format!("{} is not finite", value)));
    }
    if value <= 0.0 {
        return Err(SpecError::invalid(
            field,
            format!("must be > 0, got {}", value),
        ));
    }
    Ok(())
}
