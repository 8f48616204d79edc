//! Global stent parameters.

use crate::error::{require_positive, SpecError, SpecResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Lateral keep-out used when the input does not specify one (mm).
pub const DEFAULT_KEEPOUT_MIN_MM: f64 = 0.010;

fn default_keepout_min() -> f64 {
    DEFAULT_KEEPOUT_MIN_MM
}

/// Overall dimensions and per-ring properties of the stent.
///
/// Rings are stacked along the axial (Y) direction; crowns repeat around
/// the circumference and define the columns of the flattened pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StentParameters {
    /// Expanded outer diameter (mm)
    pub diameter_mm: f64,
    /// Total axial length the rings and gaps must close to (mm)
    pub length_mm: f64,
    /// Number of axial rings (R)
    pub num_rings: usize,
    /// Crowns per ring, identical for every ring (C)
    pub crowns_per_ring: usize,
    /// Strut width for each ring (mm), length R
    pub strut_width_mm_by_ring: Vec<f64>,
    /// Relative ring height factors, length R, all > 0
    pub height_factors: Vec<f64>,
    /// Crown arc radius as a multiple of the ring's strut width
    #[serde(rename = "R_factor")]
    pub r_factor: f64,
    /// Minimum lateral keep-out from each cell boundary (mm)
    #[serde(default = "default_keepout_min")]
    pub x_keepout_min_mm: f64,
}

impl StentParameters {
    /// Circumference of the expanded stent, π·D (mm).
    pub fn circumference_mm(&self) -> f64 {
        PI * self.diameter_mm
    }

    /// Circumferential width of one crown column (mm).
    pub fn pitch_mm(&self) -> f64 {
        self.circumference_mm() / self.crowns_per_ring as f64
    }

    /// Crown arc centerline radius for a ring (0-based index).
    pub fn arc_radius_mm(&self, ring: usize) -> f64 {
        self.r_factor * self.strut_width_mm_by_ring[ring]
    }

    pub fn height_factor_sum(&self) -> f64 {
        self.height_factors.iter().sum()
    }

    /// Shape of the link matrix these parameters require.
    pub fn link_shape(&self) -> (usize, usize) {
        (self.num_rings.saturating_sub(1), self.crowns_per_ring)
    }

    /// Checks counts, list lengths and scalar domains.
    pub fn validate(&self) -> SpecResult<()> {
        require_positive("diameter_mm", self.diameter_mm)?;
        require_positive("length_mm", self.length_mm)?;
        require_positive("R_factor", self.r_factor)?;

        if self.num_rings < 2 {
            return Err(SpecError::invalid(
                "num_rings",
                format!("at least 2 rings are required, got {}", self.num_rings),
            ));
        }
        if self.crowns_per_ring == 0 {
            return Err(SpecError::invalid("crowns_per_ring", "must be > 0"));
        }

        if self.strut_width_mm_by_ring.len() != self.num_rings {
            return Err(SpecError::LengthMismatch {
                field: "strut_width_mm_by_ring".to_string(),
                expected: self.num_rings,
                actual: self.strut_width_mm_by_ring.len(),
            });
        }
        if self.height_factors.len() != self.num_rings {
            return Err(SpecError::LengthMismatch {
                field: "height_factors".to_string(),
                expected: self.num_rings,
                actual: self.height_factors.len(),
            });
        }

        for (i, w) in self.strut_width_mm_by_ring.iter().enumerate() {
            require_positive(&format!("strut_width_mm_by_ring[{}]", i), *w)?;
        }
        for (i, f) in self.height_factors.iter().enumerate() {
            require_positive(&format!("height_factors[{}]", i), *f)?;
        }

        if !self.x_keepout_min_mm.is_finite() || self.x_keepout_min_mm < 0.0 {
            return Err(SpecError::invalid(
                "x_keepout_min_mm",
                format!("must be >= 0, got {}", self.x_keepout_min_mm),
            ));
        }

        Ok(())
    }
}
