//! Ring heights and axial stack positions.

use crate::column_scale::ColumnScale;
use crate::gap_policy::GapMatrix;
use serde::Serialize;

/// Ring height (mm) for every ring of every column, rings x columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RingHeights {
    rows: Vec<Vec<f64>>,
}

impl RingHeights {
    pub fn get(&self, ring: usize, col: usize) -> f64 {
        self.rows[ring][col]
    }

    pub fn rings(&self) -> usize {
        self.rows.len()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows.clone()
    }
}

/// `height_factors[r] * scale[c]` for each ring and column.
pub fn ring_heights(height_factors: &[f64], scales: &[ColumnScale]) -> RingHeights {
    RingHeights {
        rows: height_factors
            .iter()
            .map(|&f| scales.iter().map(|s| s.ring_height_mm(f)).collect())
            .collect(),
    }
}

/// Axial positions of every ring in one column.
///
/// Y grows from the proximal end: a ring's top is its smaller Y.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStack {
    pub col: usize,
    pub ring_top_y_mm: Vec<f64>,
    pub ring_bottom_y_mm: Vec<f64>,
    pub y_bottom_of_stent_mm: f64,
}

/// Walk each column from the proximal end, inserting the resolved gap
/// after every ring except the last.
pub fn stack(heights: &RingHeights, gaps: &GapMatrix, columns: usize) -> Vec<ColumnStack> {
    let rings = heights.rings();
    (0..columns)
        .map(|col| {
            let mut tops = Vec::with_capacity(rings);
            let mut bottoms = Vec::with_capacity(rings);
            let mut y = 0.0;
            for ring in 0..rings {
                tops.push(y);
                y += heights.get(ring, col);
                bottoms.push(y);
                if ring + 1 < rings {
                    y += gaps.get(ring, col);
                }
            }
            ColumnStack {
                col,
                ring_top_y_mm: tops,
                ring_bottom_y_mm: bottoms,
                y_bottom_of_stent_mm: y,
            }
        })
        .collect()
}
