//! Error types for the geometry crate.
//!
//! Two layers: [`GeometryError`] is what a single crown solve can report,
//! [`DerivationError`] is what can stop a whole derivation.

use crate::cells::CellFault;
use stentkit_core::SpecError;
use thiserror::Error;

/// Errors from a single crown arc solve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A solver input is non-finite or not strictly positive.
    #[error("Invalid crown input '{name}': {value}")]
    InvalidInput { name: &'static str, value: f64 },

    /// The solved arc does not fit the rectangle it was solved in.
    #[error(
        "Infeasible crown geometry: chord {chord_mm:.6} mm, sagitta {sagitta_mm:.6} mm, \
         arms ({x_arm_mm:.6}, {y_arm_mm:.6}) mm"
    )]
    InfeasibleArc {
        chord_mm: f64,
        sagitta_mm: f64,
        x_arm_mm: f64,
        y_arm_mm: f64,
    },

    /// The strut leg and the arc never meet tangentially inside the
    /// rectangle; the only sign change is the turning point of the leg.
    #[error(
        "No tangency point inside the rectangle: residual {residual:e} at delta {delta_deg:.3} deg"
    )]
    NoTangency { delta_deg: f64, residual: f64 },
}

impl GeometryError {
    pub(crate) fn no_tangency(delta_rad: f64, residual: f64) -> Self {
        Self::NoTangency {
            delta_deg: delta_rad.to_degrees(),
            residual,
        }
    }
}

/// Errors that abort a derivation.
#[derive(Error, Debug)]
pub enum DerivationError {
    /// The input failed a structural precondition.
    #[error("Invalid specification: {0}")]
    Spec(#[from] SpecError),

    /// The gaps in one column leave no room for the rings.
    #[error(
        "Column {column} is infeasible: gaps sum to {sum_gaps_mm} mm, \
         leaving {remaining_mm} mm of the requested {length_mm} mm for rings"
    )]
    InfeasibleColumn {
        column: usize,
        sum_gaps_mm: f64,
        length_mm: f64,
        remaining_mm: f64,
    },

    /// A cell faulted while the abort policy was active.
    #[error("Cell (ring {ring}, column {col}) failed: {fault}")]
    CellAborted {
        ring: usize,
        col: usize,
        fault: CellFault,
    },
}

/// Result type alias for crown solves.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Result type alias for derivations.
pub type DerivationResult<T> = Result<T, DerivationError>;
