//! The full derivation pipeline.
//!
//! Gap resolution, column scaling and ring stacking each finish before the
//! next stage starts; the cell stage then runs over every (ring, column)
//! independently. Structural problems stop everything. A cell that cannot
//! be built is either recorded on the cell or stops the derivation,
//! depending on [`FaultPolicy`].

use crate::cells::{Cell, CellGeometryBuilder};
use crate::column_scale::{self, ColumnScale};
use crate::error::{DerivationError, DerivationResult};
use crate::gap_policy::{self, GapMatrix};
use crate::ring_stack::{self, ColumnStack, RingHeights};
use crate::root_finding::SolverSettings;
use serde::{Deserialize, Serialize};
use stentkit_core::{InputDocument, SpecError};

/// What to do when a cell faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Record the fault on the cell and keep going
    #[default]
    Isolate,
    /// Stop at the first faulted cell (ring-major order)
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveOptions {
    pub solver: SolverSettings,
    pub fault_policy: FaultPolicy,
}

/// Everything derived from one input document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Derivation {
    pub gaps_matrix: GapMatrix,
    pub sum_gaps_in_col_mm: Vec<f64>,
    pub scale_mm_per_factor_by_col: Vec<f64>,
    pub ring_heights_mm: RingHeights,
    pub stack_positions_by_column: Vec<ColumnStack>,
    /// Ring-major: all columns of ring 1, then ring 2, ...
    pub cells: Vec<Cell>,
}

impl Derivation {
    pub fn columns(&self) -> usize {
        self.scale_mm_per_factor_by_col.len()
    }

    pub fn column_scale(&self, col: usize) -> ColumnScale {
        ColumnScale {
            sum_gaps_mm: self.sum_gaps_in_col_mm[col],
            scale_mm_per_factor: self.scale_mm_per_factor_by_col[col],
        }
    }

    /// The cell at `ring` (1-based) and `col`.
    pub fn cell(&self, ring: usize, col: usize) -> Option<&Cell> {
        if ring == 0 || col >= self.columns() {
            return None;
        }
        self.cells.get((ring - 1) * self.columns() + col)
    }

    pub fn faulted_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.is_faulted())
    }

    pub fn has_faults(&self) -> bool {
        self.faulted_cells().next().is_some()
    }
}

/// Runs derivations with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct StentDeriver {
    options: DeriveOptions,
}

impl StentDeriver {
    pub fn new(options: DeriveOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DeriveOptions {
        &self.options
    }

    /// Derive the full pattern of `doc`.
    pub fn derive(&self, doc: &InputDocument) -> DerivationResult<Derivation> {
        if !self.options.solver.is_valid() {
            return Err(SpecError::invalid("solver", "scan interval or tolerances out of range").into());
        }
        doc.validate()?;

        let params = &doc.parameters;
        let columns = params.crowns_per_ring;
        let policy = doc.effective_gap_policy();
        if let Some(fold_lock) = &doc.fold_lock {
            tracing::debug!(
                "Fold-lock {} at {} um sets end_linked_mm = {}",
                fold_lock.material(),
                fold_lock.balloon_wall_um,
                policy.end_linked_mm
            );
        }

        let gaps = gap_policy::resolve(&doc.links.matrix, &policy, params.link_shape())?;
        let scales = column_scale::scale(params.length_mm, &params.height_factors, &gaps, columns)?;
        let heights = ring_stack::ring_heights(&params.height_factors, &scales);
        let stacks = ring_stack::stack(&heights, &gaps, columns);

        let cells =
            CellGeometryBuilder::new(params, &heights, &stacks, self.options.solver).build_all();

        for cell in &cells {
            if let Some(fault) = &cell.fault {
                if self.options.fault_policy == FaultPolicy::Abort {
                    return Err(DerivationError::CellAborted {
                        ring: cell.ring,
                        col: cell.col,
                        fault: fault.clone(),
                    });
                }
                tracing::warn!("Cell (ring {}, column {}): {}", cell.ring, cell.col, fault);
            } else if cell.geometry.as_ref().is_some_and(|g| !g.solver_converged) {
                tracing::warn!(
                    "Cell (ring {}, column {}): crown solve did not converge, using best estimate",
                    cell.ring,
                    cell.col
                );
            }
        }

        let derivation = Derivation {
            gaps_matrix: gaps,
            sum_gaps_in_col_mm: scales.iter().map(|s| s.sum_gaps_mm).collect(),
            scale_mm_per_factor_by_col: scales.iter().map(|s| s.scale_mm_per_factor).collect(),
            ring_heights_mm: heights,
            stack_positions_by_column: stacks,
            cells,
        };

        tracing::info!(
            "Derived {} cells ({} rings x {} columns), {} faulted",
            derivation.cells.len(),
            params.num_rings,
            columns,
            derivation.faulted_cells().count()
        );

        Ok(derivation)
    }
}

/// Derive with default options.
pub fn derive(doc: &InputDocument) -> DerivationResult<Derivation> {
    StentDeriver::default().derive(doc)
}
