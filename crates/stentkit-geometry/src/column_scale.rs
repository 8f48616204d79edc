//! Per-column height scale.
//!
//! Every crown column must close to the requested length, so each column
//! gets its own mm-per-factor scale: `(L - Σ gaps) / Σ factors`.

use crate::error::{DerivationError, DerivationResult};
use crate::gap_policy::GapMatrix;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnScale {
    pub sum_gaps_mm: f64,
    pub scale_mm_per_factor: f64,
}

impl ColumnScale {
    /// Height (mm) of a ring with the given factor in this column.
    pub fn ring_height_mm(&self, factor: f64) -> f64 {
        factor * self.scale_mm_per_factor
    }
}

/// Scale every column of `gaps`.
///
/// A column whose gaps leave no positive length for its rings stops the
/// derivation; every ring in that column would be meaningless.
pub fn scale(
    length_mm: f64,
    height_factors: &[f64],
    gaps: &GapMatrix,
    columns: usize,
) -> DerivationResult<Vec<ColumnScale>> {
    let factor_sum: f64 = height_factors.iter().sum();

    (0..columns)
        .map(|col| {
            let sum_gaps_mm = gaps.column_sum(col);
            let remaining_mm = length_mm - sum_gaps_mm;
            let scale_mm_per_factor = remaining_mm / factor_sum;
            if scale_mm_per_factor.is_nan() || scale_mm_per_factor <= 0.0 {
                return Err(DerivationError::InfeasibleColumn {
                    column: col,
                    sum_gaps_mm,
                    length_mm,
                    remaining_mm,
                });
            }
            Ok(ColumnScale {
                sum_gaps_mm,
                scale_mm_per_factor,
            })
        })
        .collect()
}
