//! Scan, bracket and bisect
//!
//! A one-dimensional root finder for continuous residuals on an angle
//! interval. The interval is scanned in fixed steps for a sign change; the
//! first bracket found is bisected. If no sign change exists, a small
//! bracket around the scan point of smallest |f| is bisected instead and
//! the result is reported as not converged.
//!
//! No logging happens here. Everything a caller needs to judge the answer
//! is in the returned [`SolveReport`].

use serde::{Deserialize, Serialize};

/// Tuning for [`find_root`]. Angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Lower end of the scan interval
    pub scan_start_deg: f64,
    /// Upper end of the scan interval
    pub scan_end_deg: f64,
    /// Step of the coarse scan
    pub scan_step_deg: f64,
    /// Width of the fallback bracket around the best scan point
    pub fallback_span_deg: f64,
    /// Bisection iteration cap
    pub max_iterations: u32,
    /// Stop when |f(mid)| falls below this
    pub residual_tolerance: f64,
    /// Stop when the bracket is narrower than this (radians)
    pub bracket_tolerance_rad: f64,
    /// A bracketed answer with |f| above this straddled a pole, not a root
    pub pole_residual_limit: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            scan_start_deg: 5.0,
            scan_end_deg: 89.9,
            scan_step_deg: 0.05,
            fallback_span_deg: 5.0,
            max_iterations: 120,
            residual_tolerance: 1e-14,
            bracket_tolerance_rad: 1e-12,
            pole_residual_limit: 1e-6,
        }
    }
}

impl SolverSettings {
    /// Checks that the settings describe a usable scan.
    pub fn is_valid(&self) -> bool {
        self.scan_start_deg > 0.0
            && self.scan_end_deg < 90.0
            && self.scan_start_deg < self.scan_end_deg
            && self.scan_step_deg > 0.0
            && self.fallback_span_deg > 0.0
            && self.max_iterations > 0
            && self.residual_tolerance > 0.0
            && self.bracket_tolerance_rad > 0.0
            && self.pole_residual_limit > 0.0
    }
}

/// Outcome of a root search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    /// Best estimate of the root (radians)
    pub root: f64,
    /// f(root)
    pub residual: f64,
    /// Bisection iterations used
    pub iterations: u32,
    /// Whether the scan found a sign change
    pub bracketed: bool,
    /// Whether bisection met the residual or bracket tolerance
    pub tolerance_met: bool,
    /// Bracketed, within tolerance, and not a pole
    pub converged: bool,
}

impl SolveReport {
    /// The bracket closed on a sign change that is not a root: the
    /// residual blows up instead of vanishing.
    pub fn crossed_pole(&self) -> bool {
        self.bracketed && self.tolerance_met && !self.converged
    }
}

/// Find a root of `f` on the interval described by `settings`.
pub fn find_root<F>(f: F, settings: &SolverSettings) -> SolveReport
where
    F: Fn(f64) -> f64,
{
    let scan_lo = settings.scan_start_deg.to_radians();
    let scan_hi = settings.scan_end_deg.to_radians();
    let step = settings.scan_step_deg.to_radians();

    let mut best_x = scan_lo;
    let mut best_abs = f(scan_lo).abs();
    let mut prev_x = scan_lo;
    let mut prev_f = f(scan_lo);
    let mut bracket = (prev_f == 0.0).then_some((scan_lo, scan_lo));

    let mut k = 1u32;
    while bracket.is_none() {
        let x = scan_lo + f64::from(k) * step;
        if x > scan_hi + 1e-12 {
            break;
        }
        let fx = f(x);
        if fx.abs() < best_abs {
            best_abs = fx.abs();
            best_x = x;
        }
        if fx == 0.0 {
            bracket = Some((x, x));
            break;
        }
        if prev_f * fx < 0.0 {
            bracket = Some((prev_x, x));
            break;
        }
        prev_x = x;
        prev_f = fx;
        k += 1;
    }

    let bracketed = bracket.is_some();
    let (mut lo, mut hi) = bracket.unwrap_or_else(|| {
        let half = 0.5 * settings.fallback_span_deg.to_radians();
        (
            (best_x - half).max(1e-6_f64.to_radians()),
            (best_x + half).min(scan_hi),
        )
    });

    let mut f_lo = f(lo);
    let mut iterations = 0;
    let mut within_tolerance = false;
    let mut root = 0.5 * (lo + hi);

    while iterations < settings.max_iterations {
        iterations += 1;
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid.abs() < settings.residual_tolerance || (hi - lo) < settings.bracket_tolerance_rad {
            root = mid;
            within_tolerance = true;
            break;
        }
        if f_lo * f_mid < 0.0 {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
        root = 0.5 * (lo + hi);
    }

    let mut residual = f(root);
    if !bracketed && best_abs < residual.abs() {
        root = best_x;
        residual = f(best_x);
    }

    SolveReport {
        root,
        residual,
        iterations,
        bracketed,
        tolerance_met: within_tolerance,
        converged: bracketed
            && within_tolerance
            && residual.is_finite()
            && residual.abs() <= settings.pole_residual_limit,
    }
}
