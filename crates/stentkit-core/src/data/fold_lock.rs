//! Balloon fold-lock gap table
//!
//! The end interfaces of a crimped stent leave room for the folded balloon
//! wall. The required window depends on the balloon material and its wall
//! thickness; the values below are the fixed design table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Balloon materials with a fold-lock entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalloonMaterial {
    Pebax,
    /// Cyclic olefin copolymer
    Coc,
    Nylon,
    Polyurethane,
    /// PTFE / Teflon
    Ptfe,
    /// Anything else; uses the Pebax row
    Other,
}

impl BalloonMaterial {
    /// Classify a free-text material name, case-insensitively.
    ///
    /// Unknown names map to [`BalloonMaterial::Other`] rather than failing.
    pub fn classify(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        if name.contains("pebax") {
            Self::Pebax
        } else if name.contains("coc") || name.contains("cyclic olefin") {
            Self::Coc
        } else if name.contains("nylon") {
            Self::Nylon
        } else if name.contains("polyurethane") || name.contains("pu") {
            Self::Polyurethane
        } else if name.contains("ptfe") || name.contains("teflon") {
            Self::Ptfe
        } else {
            Self::Other
        }
    }

    /// Gap per wall-thickness band: <=12, <=16, <=20, >20 µm.
    fn bands(self) -> [f64; 4] {
        match self {
            Self::Pebax | Self::Other => [0.095, 0.095, 0.100, 0.110],
            Self::Coc => [0.105, 0.105, 0.115, 0.125],
            Self::Nylon => [0.110, 0.115, 0.125, 0.135],
            Self::Polyurethane => [0.100, 0.105, 0.115, 0.125],
            Self::Ptfe => [0.120, 0.125, 0.135, 0.150],
        }
    }
}

impl fmt::Display for BalloonMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pebax => write!(f, "Pebax"),
            Self::Coc => write!(f, "COC"),
            Self::Nylon => write!(f, "Nylon"),
            Self::Polyurethane => write!(f, "Polyurethane"),
            Self::Ptfe => write!(f, "PTFE"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// Fold-lock end gap (mm) for a balloon material and wall thickness (µm).
pub fn fold_lock_gap_mm(material: BalloonMaterial, wall_um: f64) -> f64 {
    let bands = material.bands();
    if wall_um <= 12.0 {
        bands[0]
    } else if wall_um <= 16.0 {
        bands[1]
    } else if wall_um <= 20.0 {
        bands[2]
    } else {
        bands[3]
    }
}

/// Optional `fold_lock` object of an input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldLockSpec {
    pub balloon_material: String,
    pub balloon_wall_um: f64,
}

impl FoldLockSpec {
    pub fn material(&self) -> BalloonMaterial {
        BalloonMaterial::classify(&self.balloon_material)
    }

    /// The table value this spec selects.
    pub fn gap_mm(&self) -> f64 {
        fold_lock_gap_mm(self.material(), self.balloon_wall_um)
    }
}
