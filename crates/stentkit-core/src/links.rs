//! Ring-to-ring link topology.

use crate::error::{SpecError, SpecResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean grid of shape (R-1) x C.
///
/// Row `i` is the interface between ring `i+1` and ring `i+2` (1-based
/// rings); column `j` is crown column `j`. `true` means the two rings are
/// joined by a link strut at that column.
///
/// Serialized as a 2D array of 0/1 integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i64>>", into = "Vec<Vec<u8>>")]
pub struct LinkMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl LinkMatrix {
    /// A matrix with no links at all.
    pub fn unlinked(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        }
    }

    /// Build from row-major booleans. Every row must have the same width.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> SpecResult<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(SpecError::RaggedMatrix {
                    row: i,
                    expected: cols,
                    actual: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether interface `row` is linked at crown column `col`.
    ///
    /// Panics if the index is out of bounds.
    pub fn is_linked(&self, row: usize, col: usize) -> bool {
        assert!(row < self.rows && col < self.cols, "link index out of bounds");
        self.cells[row * self.cols + col]
    }

    /// Set a single entry.
    pub fn set(&mut self, row: usize, col: usize, linked: bool) {
        assert!(row < self.rows && col < self.cols, "link index out of bounds");
        self.cells[row * self.cols + col] = linked;
    }

    /// Builder-style variant of [`LinkMatrix::set`].
    pub fn with_link(mut self, row: usize, col: usize) -> Self {
        self.set(row, col, true);
        self
    }

    pub fn link_count(&self) -> usize {
        self.cells.iter().filter(|&&l| l).count()
    }

    /// Fails unless the shape is exactly `expected`. Never resizes.
    pub fn expect_shape(&self, expected: (usize, usize)) -> SpecResult<()> {
        if self.shape() != expected {
            return Err(SpecError::ShapeMismatch {
                expected_rows: expected.0,
                expected_cols: expected.1,
                actual_rows: self.rows,
                actual_cols: self.cols,
            });
        }
        Ok(())
    }

    /// Row-major 0/1 rendering, as used in documents and tables.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.iter().map(|&l| u8::from(l)).collect())
            .collect()
    }
}

impl TryFrom<Vec<Vec<i64>>> for LinkMatrix {
    type Error = SpecError;

    fn try_from(raw: Vec<Vec<i64>>) -> Result<Self, Self::Error> {
        let mut rows = Vec::with_capacity(raw.len());
        for (r, row) in raw.into_iter().enumerate() {
            let mut out = Vec::with_capacity(row.len());
            for (c, value) in row.into_iter().enumerate() {
                match value {
                    0 => out.push(false),
                    1 => out.push(true),
                    _ => {
                        return Err(SpecError::InvalidLinkValue {
                            row: r,
                            col: c,
                            value,
                        })
                    }
                }
            }
            rows.push(out);
        }
        Self::from_rows(rows)
    }
}

impl From<LinkMatrix> for Vec<Vec<u8>> {
    fn from(matrix: LinkMatrix) -> Self {
        matrix.to_rows()
    }
}

/// Column label as it appears in `links.matrix_cols`.
///
/// Input documents use either plain column indices or free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnLabel {
    Index(u64),
    Name(String),
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{}", i),
            Self::Name(s) => write!(f, "{}", s),
        }
    }
}

/// The `links` object of an input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSection {
    pub matrix: LinkMatrix,
    /// Human labels per interface row, e.g. "1-2"
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Labels per crown column
    #[serde(default)]
    pub matrix_cols: Vec<ColumnLabel>,
}

impl LinkSection {
    /// A section with default labels for the given matrix.
    pub fn new(matrix: LinkMatrix) -> Self {
        let mut section = Self {
            matrix,
            interfaces: Vec::new(),
            matrix_cols: Vec::new(),
        };
        section.fill_default_labels();
        section
    }

    /// Fill in missing labels: "1-2", "2-3", ... for rows and 0..C for columns.
    pub fn fill_default_labels(&mut self) {
        if self.interfaces.is_empty() {
            self.interfaces = (0..self.matrix.rows())
                .map(|i| format!("{}-{}", i + 1, i + 2))
                .collect();
        }
        if self.matrix_cols.is_empty() {
            self.matrix_cols = (0..self.matrix.cols() as u64)
                .map(ColumnLabel::Index)
                .collect();
        }
    }

    /// Labels must match the matrix once they are present.
    pub fn validate_labels(&self) -> SpecResult<()> {
        if !self.interfaces.is_empty() && self.interfaces.len() != self.matrix.rows() {
            return Err(SpecError::LengthMismatch {
                field: "links.interfaces".to_string(),
                expected: self.matrix.rows(),
                actual: self.interfaces.len(),
            });
        }
        if !self.matrix_cols.is_empty() && self.matrix_cols.len() != self.matrix.cols() {
            return Err(SpecError::LengthMismatch {
                field: "links.matrix_cols".to_string(),
                expected: self.matrix.cols(),
                actual: self.matrix_cols.len(),
            });
        }
        Ok(())
    }
}
