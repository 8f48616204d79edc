//! Crown arc geometry
//!
//! A crown is a circular arc of centerline radius `R` joining two straight
//! strut legs. Inside its quarter rectangle (half the wave height by half
//! the crown pitch) the legs run from the outer corner and touch the arc at
//! the contact half-angle `δ`. This module has two halves:
//!
//! - closed forms for when θ and R are already known
//! - [`solve_quarter`] / [`solve_full_wave`], which find δ from the
//!   rectangle by solving the tangency condition
//!   `tan δ = 2(H - w/2 - R(1 - cos δ)) / (W - 2R sin δ)`
//!
//! Both use the circular-arc sagitta `R(1 - cos(θ/2))`, so for the same R and
//! θ they agree to rounding.

use crate::error::{GeometryError, GeometryResult};
use crate::root_finding::{find_root, SolveReport, SolverSettings};

/// Smallest denominator magnitude in the tangency residual.
const DENOMINATOR_EPSILON: f64 = 1e-14;

/// Sagitta of a circular arc with included angle `theta_deg`.
pub fn sagitta_from_theta(radius: f64, theta_deg: f64) -> f64 {
    radius * (1.0 - (0.5 * theta_deg.to_radians()).cos())
}

/// Chord length of a circular arc with included angle `theta_deg`.
pub fn chord_from_theta(radius: f64, theta_deg: f64) -> f64 {
    2.0 * radius * (0.5 * theta_deg.to_radians()).sin()
}

pub fn arc_length_from_theta(radius: f64, theta_deg: f64) -> f64 {
    radius * theta_deg.to_radians()
}

pub fn curvature_from_radius(radius: f64) -> f64 {
    1.0 / radius
}

/// Included angle (degrees) of the arc with the given sagitta.
///
/// The cosine argument is clamped to [-1, 1], so a sagitta beyond 2R reads
/// as a full 360° arc instead of NaN.
pub fn theta_from_sagitta(radius: f64, sagitta: f64) -> f64 {
    let c = (1.0 - sagitta / radius).clamp(-1.0, 1.0);
    2.0 * c.acos().to_degrees()
}

/// Radius of the arc with the given included angle and sagitta.
pub fn radius_from_theta_sagitta(theta_deg: f64, sagitta: f64) -> f64 {
    sagitta / (1.0 - (0.5 * theta_deg.to_radians()).cos())
}

/// R / w
pub fn radius_to_width_ratio(radius: f64, strut_width: f64) -> f64 {
    radius / strut_width
}

/// (w/2) / R, the inner-fiber strain index of a crown.
pub fn geometric_index(radius: f64, strut_width: f64) -> f64 {
    0.5 * strut_width / radius
}

/// A crown arc known by radius and included angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrownArc {
    pub radius_mm: f64,
    pub theta_deg: f64,
}

impl CrownArc {
    pub fn new(radius_mm: f64, theta_deg: f64) -> Self {
        Self {
            radius_mm,
            theta_deg,
        }
    }

    /// Body crown reference design.
    pub fn body_reference() -> Self {
        Self::new(0.200, 72.0)
    }

    /// End crown reference design.
    pub fn end_reference() -> Self {
        Self::new(0.130, 90.0)
    }

    pub fn sagitta_mm(&self) -> f64 {
        sagitta_from_theta(self.radius_mm, self.theta_deg)
    }

    pub fn chord_mm(&self) -> f64 {
        chord_from_theta(self.radius_mm, self.theta_deg)
    }

    pub fn arc_length_mm(&self) -> f64 {
        arc_length_from_theta(self.radius_mm, self.theta_deg)
    }

    pub fn curvature(&self) -> f64 {
        curvature_from_radius(self.radius_mm)
    }

    pub fn radius_to_width_ratio(&self, strut_width: f64) -> f64 {
        radius_to_width_ratio(self.radius_mm, strut_width)
    }

    pub fn geometric_index(&self, strut_width: f64) -> f64 {
        geometric_index(self.radius_mm, strut_width)
    }
}

/// A solved crown in its quarter rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarterSolution {
    /// Contact half-angle δ (radians)
    pub delta_rad: f64,
    /// 2R sin δ
    pub chord_center_mm: f64,
    /// R(1 - cos δ)
    pub sagitta_center_mm: f64,
    /// (R + w/2)(1 - cos δ)
    pub outer_sagitta_mm: f64,
    /// Horizontal run of the straight leg
    pub x_arm_mm: f64,
    /// Vertical rise of the straight leg
    pub y_arm_mm: f64,
    /// w/2 + R(1 - cos δ)
    pub y_chord_mm: f64,
    pub radius_mm: f64,
    /// Rectangle the crown was solved in, as passed by the caller
    pub height_mm: f64,
    pub width_mm: f64,
    pub report: SolveReport,
}

impl QuarterSolution {
    pub fn delta_deg(&self) -> f64 {
        self.delta_rad.to_degrees()
    }

    /// Included angle θ = 2δ (degrees).
    pub fn theta_deg(&self) -> f64 {
        2.0 * self.delta_deg()
    }

    pub fn arc_length_mm(&self) -> f64 {
        self.radius_mm * 2.0 * self.delta_rad
    }

    pub fn converged(&self) -> bool {
        self.report.converged
    }

    /// The same arc as a closed-form [`CrownArc`].
    pub fn arc(&self) -> CrownArc {
        CrownArc::new(self.radius_mm, self.theta_deg())
    }
}

fn require_input(name: &'static str, value: f64) -> GeometryResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidInput { name, value })
    }
}

/// Tangency residual `tan δ - RHS(δ)` for a quarter rectangle.
fn tangency_residual(delta: f64, height: f64, width: f64, strut_width: f64, radius: f64) -> f64 {
    let rise = height - 0.5 * strut_width - radius * (1.0 - delta.cos());
    let mut run = width - 2.0 * radius * delta.sin();
    if run.abs() < DENOMINATOR_EPSILON {
        run = DENOMINATOR_EPSILON.copysign(run);
    }
    delta.tan() - 2.0 * rise / run
}

/// Solve a crown in a quarter rectangle of half-height `height` and
/// half-width `width`.
///
/// A solve that does not converge still returns its best estimate with
/// `report.converged == false`. A solution whose arc or tangency point does
/// not fit the rectangle is an error, as is a bracket that closed on the
/// pole of the residual (arc wider than the quarter rectangle).
pub fn solve_quarter(
    height: f64,
    width: f64,
    strut_width: f64,
    radius: f64,
    settings: &SolverSettings,
) -> GeometryResult<QuarterSolution> {
    require_input("height", height)?;
    require_input("width", width)?;
    require_input("strut_width", strut_width)?;
    require_input("radius", radius)?;

    let report = find_root(
        |d| tangency_residual(d, height, width, strut_width, radius),
        settings,
    );
    let delta = report.root;
    if report.crossed_pole() {
        return Err(GeometryError::no_tangency(delta, report.residual));
    }
    let (sin_d, cos_d) = delta.sin_cos();

    let chord = 2.0 * radius * sin_d;
    let sagitta = radius * (1.0 - cos_d);
    let x_arm = 0.5 * (width - 2.0 * radius * sin_d);
    let y_chord = 0.5 * strut_width + sagitta;
    let y_arm = height - y_chord;

    if sagitta <= 0.0 || chord <= 0.0 || x_arm < 0.0 || y_arm < 0.0 {
        return Err(GeometryError::InfeasibleArc {
            chord_mm: chord,
            sagitta_mm: sagitta,
            x_arm_mm: x_arm,
            y_arm_mm: y_arm,
        });
    }

    Ok(QuarterSolution {
        delta_rad: delta,
        chord_center_mm: chord,
        sagitta_center_mm: sagitta,
        outer_sagitta_mm: (radius + 0.5 * strut_width) * (1.0 - cos_d),
        x_arm_mm: x_arm,
        y_arm_mm: y_arm,
        y_chord_mm: y_chord,
        radius_mm: radius,
        height_mm: height,
        width_mm: width,
        report,
    })
}

/// Solve a crown from its full wave: `height` is the full wave height and
/// `width` the full crown pitch. Both are halved into the quarter rectangle;
/// the returned solution echoes the full-wave inputs.
pub fn solve_full_wave(
    height: f64,
    width: f64,
    strut_width: f64,
    radius: f64,
    settings: &SolverSettings,
) -> GeometryResult<QuarterSolution> {
    require_input("height", height)?;
    require_input("width", width)?;
    let mut solution = solve_quarter(0.5 * height, 0.5 * width, strut_width, radius, settings)?;
    solution.height_mm = height;
    solution.width_mm = width;
    Ok(solution)
}
