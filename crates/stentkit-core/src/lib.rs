//! # StentKit Core
//!
//! Core types for describing a stent pattern before anything is derived
//! from it:
//!
//! - [`StentParameters`]: overall dimensions, ring/crown counts, per-ring
//!   strut widths and height factors
//! - [`LinkMatrix`]: which ring interfaces are linked at which crown column
//! - [`GapPolicy`]: the five gap rules that turn links into gaps
//! - [`InputDocument`]: the whole minimal specification as read from disk
//!
//! Structural validation lives here as well, so every downstream stage can
//! assume shapes and lengths agree.

pub mod data;
pub mod document;
pub mod error;
pub mod gaps;
pub mod links;
pub mod parameters;

pub use data::fold_lock::{fold_lock_gap_mm, BalloonMaterial, FoldLockSpec};
pub use document::InputDocument;
pub use error::{SpecError, SpecResult};
pub use gaps::GapPolicy;
pub use links::{ColumnLabel, LinkMatrix, LinkSection};
pub use parameters::{StentParameters, DEFAULT_KEEPOUT_MIN_MM};
