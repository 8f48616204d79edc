//! Per-cell crown geometry
//!
//! A cell is one ring in one crown column. Each cell solves its crown from
//! the full-wave rectangle (ring height by pitch), decides which long edge
//! carries the left and right crown, insets the strut clearance edges by
//! the crown margin and places the two chord segments after the lateral
//! keep-out.
//!
//! Cells only read shared context, so they can be built in any order; with
//! the `parallel` feature [`CellGeometryBuilder::build_all`] uses rayon.

use crate::crown_arc::{solve_full_wave, QuarterSolution};
use crate::ring_stack::{ColumnStack, RingHeights};
use crate::root_finding::SolverSettings;
use serde::Serialize;
use std::f64::consts::FRAC_PI_2;
use stentkit_core::StentParameters;
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Below this, tan δ is treated as zero in the keep-out formula.
const TAN_DELTA_EPSILON: f64 = 1e-8;

/// Long edge of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePosition {
    Top,
    Bottom,
}

/// Which way round a cell's crowns sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Left crown on the bottom edge, right crown on the top edge
    Base,
    /// Left crown on the top edge, right crown on the bottom edge
    Flipped,
}

impl Phase {
    /// Phase of the cell at `ring` (1-based) and `col` (0-based).
    ///
    /// Odd rings pair with even columns; adjacent cells in either direction
    /// always get opposite phases so the crowns interlock.
    pub fn for_cell(ring: usize, col: usize) -> Self {
        let ring_parity = ring % 2 == 1;
        let col_parity = col % 2 == 0;
        if ring_parity == col_parity {
            Self::Base
        } else {
            Self::Flipped
        }
    }

    /// (left crown, right crown) edges.
    pub fn positions(self) -> (EdgePosition, EdgePosition) {
        match self {
            Self::Base => (EdgePosition::Bottom, EdgePosition::Top),
            Self::Flipped => (EdgePosition::Top, EdgePosition::Bottom),
        }
    }
}

/// Whether the raw keep-out had to be clamped, and to which bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepoutClamp {
    None,
    Minimum,
    Maximum,
}

/// A chord line segment, serialized as `[[x1, y1], [x2, y2]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChordSegment(pub [f64; 2], pub [f64; 2]);

impl ChordSegment {
    pub fn start(&self) -> [f64; 2] {
        self.0
    }

    pub fn end(&self) -> [f64; 2] {
        self.1
    }

    pub fn length(&self) -> f64 {
        (self.1[0] - self.0[0]).hypot(self.1[1] - self.0[1])
    }
}

/// Why a cell has no geometry.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellFault {
    /// The crown did not fit its rectangle.
    #[error("infeasible crown arc: {message}")]
    InfeasibleArc { message: String },

    /// The minimum keep-out leaves no room for both crowns.
    #[error(
        "keep-out overlap: minimum {x_keepout_min_mm} mm exceeds the \
         available {x_keepout_max_mm} mm"
    )]
    KeepoutOverlap {
        x_keepout_min_mm: f64,
        x_keepout_max_mm: f64,
    },
}

/// Solved geometry of a feasible cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellGeometry {
    /// Y of the strut clearance edge below the top chord
    pub y_top_edge_mm: f64,
    /// Y of the strut clearance edge above the bottom chord
    pub y_bottom_edge_mm: f64,
    #[serde(rename = "Rc_mm")]
    pub rc_mm: f64,
    pub theta_deg: f64,
    pub delta_deg: f64,
    pub chord_center_len_mm: f64,
    pub sagitta_center_mm: f64,
    pub outer_sagitta_mm: f64,
    pub arc_length_mm: f64,
    /// Sagitta plus half the strut width
    #[serde(rename = "M_mm")]
    pub m_mm: f64,
    pub x_keepout_mm: f64,
    pub x_keepout_raw_mm: f64,
    pub x_keepout_max_mm: f64,
    pub keepout_clamp: KeepoutClamp,
    /// Inclination of the strut from the left chord end to the right chord start
    pub alpha_deg: f64,
    pub left_cl: ChordSegment,
    pub right_cl: ChordSegment,
    pub solver_converged: bool,
}

/// One (ring, column) cell of the pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    /// 1-based ring number
    pub ring: usize,
    /// 0-based crown column
    pub col: usize,
    pub x_left_mm: f64,
    pub x_right_mm: f64,
    pub y_top_chord_mm: f64,
    pub y_bottom_chord_mm: f64,
    pub left_crown_pos: EdgePosition,
    pub right_crown_pos: EdgePosition,
    #[serde(flatten)]
    pub geometry: Option<CellGeometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<CellFault>,
}

impl Cell {
    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    pub fn phase(&self) -> Phase {
        Phase::for_cell(self.ring, self.col)
    }
}

/// Lateral keep-out for one crown pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keepout {
    pub applied_mm: f64,
    pub raw_mm: f64,
    pub max_mm: f64,
    pub clamp: KeepoutClamp,
}

/// Clamp the tangency keep-out into `[minimum, ½(pitch - 2c)]`.
///
/// Fails when the window is empty, i.e. the minimum alone would push the
/// two crowns into each other.
pub fn keepout(
    pitch_mm: f64,
    chord_mm: f64,
    height_mm: f64,
    delta_rad: f64,
    minimum_mm: f64,
) -> Result<Keepout, CellFault> {
    let free = pitch_mm - 2.0 * chord_mm;
    let tan_delta = delta_rad.tan();
    let raw_mm = if tan_delta < TAN_DELTA_EPSILON {
        0.5 * free
    } else {
        0.5 * (free - height_mm / tan_delta)
    };
    let max_mm = 0.5 * free;

    if max_mm < minimum_mm {
        return Err(CellFault::KeepoutOverlap {
            x_keepout_min_mm: minimum_mm,
            x_keepout_max_mm: max_mm,
        });
    }

    let (applied_mm, clamp) = if raw_mm < minimum_mm {
        (minimum_mm, KeepoutClamp::Minimum)
    } else if raw_mm > max_mm {
        (max_mm, KeepoutClamp::Maximum)
    } else {
        (raw_mm, KeepoutClamp::None)
    };

    Ok(Keepout {
        applied_mm,
        raw_mm,
        max_mm,
        clamp,
    })
}

/// Builds cells from the stacked rings of a derivation.
pub struct CellGeometryBuilder<'a> {
    params: &'a StentParameters,
    heights: &'a RingHeights,
    stacks: &'a [ColumnStack],
    settings: SolverSettings,
}

impl<'a> CellGeometryBuilder<'a> {
    pub fn new(
        params: &'a StentParameters,
        heights: &'a RingHeights,
        stacks: &'a [ColumnStack],
        settings: SolverSettings,
    ) -> Self {
        Self {
            params,
            heights,
            stacks,
            settings,
        }
    }

    /// Build the cell at `ring` (0-based) and `col`.
    pub fn build(&self, ring: usize, col: usize) -> Cell {
        let pitch = self.params.pitch_mm();
        let stack = &self.stacks[col];
        let y_top = stack.ring_top_y_mm[ring];
        let y_bottom = stack.ring_bottom_y_mm[ring];
        let (left_pos, right_pos) = Phase::for_cell(ring + 1, col).positions();

        let mut cell = Cell {
            ring: ring + 1,
            col,
            x_left_mm: col as f64 * pitch,
            x_right_mm: (col + 1) as f64 * pitch,
            y_top_chord_mm: y_top,
            y_bottom_chord_mm: y_bottom,
            left_crown_pos: left_pos,
            right_crown_pos: right_pos,
            geometry: None,
            fault: None,
        };

        let strut_width = self.params.strut_width_mm_by_ring[ring];
        let height = self.heights.get(ring, col);
        let solution = match solve_full_wave(
            height,
            pitch,
            strut_width,
            self.params.arc_radius_mm(ring),
            &self.settings,
        ) {
            Ok(solution) => solution,
            Err(e) => {
                cell.fault = Some(CellFault::InfeasibleArc {
                    message: e.to_string(),
                });
                return cell;
            }
        };

        match self.place(&cell, &solution, strut_width) {
            Ok(geometry) => cell.geometry = Some(geometry),
            Err(fault) => cell.fault = Some(fault),
        }
        cell
    }

    fn place(
        &self,
        cell: &Cell,
        solution: &QuarterSolution,
        strut_width: f64,
    ) -> Result<CellGeometry, CellFault> {
        let length = self.params.length_mm;
        let chord = solution.chord_center_mm;
        let margin = solution.sagitta_center_mm + 0.5 * strut_width;

        let keepout = keepout(
            self.params.pitch_mm(),
            chord,
            solution.height_mm,
            solution.delta_rad,
            self.params.x_keepout_min_mm,
        )?;
        let xk = keepout.applied_mm;

        let edge_y = |pos: EdgePosition| match pos {
            EdgePosition::Top => cell.y_top_chord_mm,
            EdgePosition::Bottom => cell.y_bottom_chord_mm,
        };
        let y_left = edge_y(cell.left_crown_pos);
        let y_right = edge_y(cell.right_crown_pos);

        let left_cl = ChordSegment(
            [cell.x_left_mm + xk, y_left],
            [cell.x_left_mm + xk + chord, y_left],
        );
        let right_cl = ChordSegment(
            [cell.x_right_mm - xk - chord, y_right],
            [cell.x_right_mm - xk, y_right],
        );

        let dx = right_cl.start()[0] - left_cl.end()[0];
        let dy = y_right - y_left;
        let alpha = if dx.abs() > 1e-12 {
            dy.atan2(dx)
        } else {
            FRAC_PI_2
        };

        Ok(CellGeometry {
            y_top_edge_mm: (cell.y_top_chord_mm + margin).clamp(0.0, length),
            y_bottom_edge_mm: (cell.y_bottom_chord_mm - margin).clamp(0.0, length),
            rc_mm: solution.radius_mm,
            theta_deg: solution.theta_deg(),
            delta_deg: solution.delta_deg(),
            chord_center_len_mm: chord,
            sagitta_center_mm: solution.sagitta_center_mm,
            outer_sagitta_mm: solution.outer_sagitta_mm,
            arc_length_mm: solution.arc_length_mm(),
            m_mm: margin,
            x_keepout_mm: xk,
            x_keepout_raw_mm: keepout.raw_mm,
            x_keepout_max_mm: keepout.max_mm,
            keepout_clamp: keepout.clamp,
            alpha_deg: alpha.to_degrees(),
            left_cl,
            right_cl,
            solver_converged: solution.converged(),
        })
    }

    fn indices(&self) -> Vec<(usize, usize)> {
        let cols = self.stacks.len();
        (0..self.params.num_rings)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .collect()
    }

    /// Every cell, ring-major.
    #[cfg(not(feature = "parallel"))]
    pub fn build_all(&self) -> Vec<Cell> {
        self.indices()
            .into_iter()
            .map(|(r, c)| self.build(r, c))
            .collect()
    }

    /// Every cell, ring-major.
    #[cfg(feature = "parallel")]
    pub fn build_all(&self) -> Vec<Cell> {
        self.indices()
            .into_par_iter()
            .map(|(r, c)| self.build(r, c))
            .collect()
    }
}
