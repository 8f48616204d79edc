//! Gap rules between adjacent rings.

use crate::error::{require_positive, SpecResult};
use serde::{Deserialize, Serialize};

/// Five gap distances (mm) selected by interface position and link state.
///
/// Interior interfaces (neither the first nor the last row of the link
/// matrix) use the `body_*` values. The first and last rows use
/// `end_linked_mm` when linked, otherwise the proximal or distal value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapPolicy {
    pub body_linked_mm: f64,
    pub body_unlinked_mm: f64,
    pub end_linked_mm: f64,
    pub end_unlinked_prox_mm: f64,
    pub end_unlinked_dist_mm: f64,
}

impl GapPolicy {
    /// Same gap everywhere.
    pub fn uniform(gap_mm: f64) -> Self {
        Self {
            body_linked_mm: gap_mm,
            body_unlinked_mm: gap_mm,
            end_linked_mm: gap_mm,
            end_unlinked_prox_mm: gap_mm,
            end_unlinked_dist_mm: gap_mm,
        }
    }

    pub fn validate(&self) -> SpecResult<()> {
        require_positive("gaps_policy.body_linked_mm", self.body_linked_mm)?;
        require_positive("gaps_policy.body_unlinked_mm", self.body_unlinked_mm)?;
        require_positive("gaps_policy.end_linked_mm", self.end_linked_mm)?;
        require_positive("gaps_policy.end_unlinked_prox_mm", self.end_unlinked_prox_mm)?;
        require_positive("gaps_policy.end_unlinked_dist_mm", self.end_unlinked_dist_mm)?;
        Ok(())
    }
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            body_linked_mm: 0.160,
            body_unlinked_mm: 0.160,
            end_linked_mm: 0.095,
            end_unlinked_prox_mm: 0.095,
            end_unlinked_dist_mm: 0.100,
        }
    }
}
