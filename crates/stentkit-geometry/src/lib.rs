//! # StentKit Geometry
//!
//! Turns a validated [`stentkit_core::InputDocument`] into the flattened
//! strut pattern of the stent.
//!
//! The pipeline runs in this order:
//!
//! 1. [`gap_policy`] resolves the link matrix into axial gaps
//! 2. [`column_scale`] finds the mm-per-factor scale that closes each column
//! 3. [`ring_stack`] turns scales into ring heights and Y positions
//! 4. [`cells`] solves every crown ([`crown_arc`]) and places its chords
//!
//! [`derivation::StentDeriver`] drives all four.

pub mod cells;
pub mod column_scale;
pub mod crown_arc;
pub mod derivation;
pub mod error;
pub mod gap_policy;
pub mod ring_stack;
pub mod root_finding;

pub use cells::{
    Cell, CellFault, CellGeometry, CellGeometryBuilder, ChordSegment, EdgePosition, KeepoutClamp,
    Phase,
};
pub use column_scale::ColumnScale;
pub use crown_arc::{solve_full_wave, solve_quarter, CrownArc, QuarterSolution};
pub use derivation::{derive, Derivation, DeriveOptions, FaultPolicy, StentDeriver};
pub use error::{DerivationError, DerivationResult, GeometryError, GeometryResult};
pub use gap_policy::{GapMatrix, InterfaceKind};
pub use ring_stack::{ColumnStack, RingHeights};
pub use root_finding::{find_root, SolveReport, SolverSettings};
