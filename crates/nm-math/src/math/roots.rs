//! Real roots of linear and quadratic polynomials.
//!
//! The quadratic solver avoids the cancellation of the textbook formula by
//! computing `q = -(b + sign(b)·√disc) / 2` and taking the roots `q/a` and
//! `c/q`. A leading coefficient that is negligible next to the others falls
//! back to the linear solve.

use serde::{Deserialize, Serialize};

use super::stable::is_negligible;

/// Relative size below which a leading coefficient is treated as zero.
pub const LEADING_COEFF_REL_TOL: f64 = 1e-9;

/// Real roots of a polynomial, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RealRoots {
    /// No real root.
    None,
    /// A single (possibly repeated) root.
    One(f64),
    /// Two distinct roots, `lo < hi`.
    Two(f64, f64),
    /// The polynomial is identically zero; every point is a root.
    All,
}

impl RealRoots {
    /// Iterate over the finite roots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = f64> {
        let (first, second) = match *self {
            RealRoots::None | RealRoots::All => (None, None),
            RealRoots::One(r) => (Some(r), None),
            RealRoots::Two(lo, hi) => (Some(lo), Some(hi)),
        };
        first.into_iter().chain(second)
    }

    /// Smallest root strictly greater than `x0`.
    pub fn first_after(&self, x0: f64) -> Option<f64> {
        self.iter().find(|&r| r > x0)
    }
}

/// Solve `b·x + c = 0`.
pub fn solve_linear(b: f64, c: f64) -> RealRoots {
    if b == 0.0 {
        return if c == 0.0 {
            RealRoots::All
        } else {
            RealRoots::None
        };
    }
    let root = -c / b;
    if root.is_finite() {
        RealRoots::One(root)
    } else {
        RealRoots::None
    }
}

/// Solve `a·x² + b·x + c = 0` over the reals.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> RealRoots {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return RealRoots::None;
    }
    if is_negligible(a, b.abs().max(c.abs()), LEADING_COEFF_REL_TOL) && (b != 0.0 || c != 0.0) {
        return solve_linear(b, c);
    }
    if a == 0.0 {
        return solve_linear(b, c);
    }

    let disc = b * b - 4.0 * a * c;
    // Tangent case: rounding can push a zero discriminant slightly negative.
    let tangent_tol = 4.0 * f64::EPSILON * (b * b).max((4.0 * a * c).abs());
    if disc < -tangent_tol {
        return RealRoots::None;
    }
    if disc.abs() <= tangent_tol {
        return RealRoots::One(-b / (2.0 * a));
    }

    let sqrt_disc = disc.sqrt();
    let sign = if b >= 0.0 { 1.0 } else { -1.0 };
    let q = -0.5 * (b + sign * sqrt_disc);
    let r1 = q / a;
    let r2 = if q != 0.0 { c / q } else { -r1 };

    let (lo, hi) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };
    if lo == hi {
        RealRoots::One(lo)
    } else {
        RealRoots::Two(lo, hi)
    }
}
