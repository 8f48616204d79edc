//! Link matrix to gap matrix.
//!
//! Each ring interface row is classified as proximal (first), distal
//! (last) or body; the link flag then selects one of the five policy
//! values. Nothing is computed beyond the lookup.

use serde::Serialize;
use stentkit_core::{GapPolicy, LinkMatrix, SpecResult};

/// Position of a ring interface along the stent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    Proximal,
    Body,
    Distal,
}

impl InterfaceKind {
    /// Classify row `row` of `rows` interface rows.
    ///
    /// A single interface row counts as proximal.
    pub fn classify(row: usize, rows: usize) -> Self {
        if row == 0 {
            Self::Proximal
        } else if row + 1 == rows {
            Self::Distal
        } else {
            Self::Body
        }
    }

    /// Gap (mm) this interface gets from `policy`.
    pub fn gap_mm(self, linked: bool, policy: &GapPolicy) -> f64 {
        match (self, linked) {
            (Self::Body, true) => policy.body_linked_mm,
            (Self::Body, false) => policy.body_unlinked_mm,
            (_, true) => policy.end_linked_mm,
            (Self::Proximal, false) => policy.end_unlinked_prox_mm,
            (Self::Distal, false) => policy.end_unlinked_dist_mm,
        }
    }
}

/// Axial gap (mm) below each ring of each column, shape (R-1) x C.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GapMatrix {
    rows: Vec<Vec<f64>>,
}

impl GapMatrix {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    pub fn column_sum(&self, col: usize) -> f64 {
        self.rows.iter().map(|row| row[col]).sum()
    }

    pub fn column_sums(&self) -> Vec<f64> {
        (0..self.cols()).map(|c| self.column_sum(c)).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows.clone()
    }
}

/// Resolve every interface of `links` to a gap.
///
/// `expected_shape` is (num_rings - 1, crowns_per_ring); a matrix of any
/// other shape is rejected.
pub fn resolve(
    links: &LinkMatrix,
    policy: &GapPolicy,
    expected_shape: (usize, usize),
) -> SpecResult<GapMatrix> {
    links.expect_shape(expected_shape)?;

    let (rows, cols) = links.shape();
    let gaps = (0..rows)
        .map(|r| {
            let kind = InterfaceKind::classify(r, rows);
            (0..cols)
                .map(|c| kind.gap_mm(links.is_linked(r, c), policy))
                .collect()
        })
        .collect();

    Ok(GapMatrix::from_rows(gaps))
}
