//! Least-squares quadratic fitting.
//!
//! Fits `y = a·x² + b·x + c` by ordinary least squares. The abscissa is
//! centered on its mean and scaled into `[-1, 1]` before the normal equations
//! are formed, so the 3×3 system stays well conditioned whether the samples
//! span minutes or months. The system is solved in closed form by Gaussian
//! elimination with partial pivoting; there is no iteration.
//!
//! # Example
//!
//! ```
//! use nm_math::fit_quadratic;
//!
//! let xs = [0.0, 1.0, 2.0, 3.0];
//! let ys = [1.0, 2.0, 5.0, 10.0]; // x² + 1
//! let fit = fit_quadratic(&xs, &ys).unwrap();
//! assert!((fit.curvature() - 2.0).abs() < 1e-9);
//! assert!((fit.slope_at(3.0) - 6.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::roots::{solve_quadratic, RealRoots};
use super::stable::{stable_mean, NeumaierSum};

/// Minimum number of points for a quadratic fit.
pub const MIN_QUADRATIC_POINTS: usize = 3;

/// Pivot magnitude (relative to the point count) below which the normal
/// matrix is treated as singular.
const SINGULAR_PIVOT_TOL: f64 = 1e-10;

/// Normalized coefficients smaller than this fraction of the curve's level are
/// rounding residue.
const ROUNDING_REL_TOL: f64 = 1e-12;

/// Errors from polynomial fitting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("abscissa and ordinate lengths differ: {xs} vs {ys}")]
    LengthMismatch { xs: usize, ys: usize },

    #[error("too few points for fit: have {have}, need {need}")]
    TooFewPoints { have: usize, need: usize },

    #[error("non-finite input at index {index}")]
    NonFinite { index: usize },

    #[error("normal equations are singular (abscissa has fewer than 3 distinct values)")]
    Singular,
}

/// Expanded polynomial coefficients `y = a·x² + b·x + c`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Result of a least-squares quadratic fit.
///
/// Stored in normalized form `y = p2·v² + p1·v + p0` with
/// `v = (x - center) / scale`; accessors evaluate in the caller's `x` units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticFit {
    /// Mean of the abscissa.
    pub center: f64,
    /// Largest distance of any abscissa value from `center`.
    pub scale: f64,
    /// `[p0, p1, p2]` in normalized coordinates.
    pub normalized: [f64; 3],
    /// Number of points fitted.
    pub n: usize,
    /// Sum of squared residuals.
    pub residual_sum_sq: f64,
    /// Coefficient of determination (1.0 for a constant, perfectly fit series).
    pub r_squared: f64,
}

impl QuadraticFit {
    fn normalize(&self, x: f64) -> f64 {
        (x - self.center) / self.scale
    }

    /// Fitted value at `x`.
    pub fn value_at(&self, x: f64) -> f64 {
        let v = self.normalize(x);
        let [p0, p1, p2] = self.normalized;
        (p2 * v + p1) * v + p0
    }

    /// First derivative dy/dx at `x`.
    pub fn slope_at(&self, x: f64) -> f64 {
        let v = self.normalize(x);
        let [_, p1, p2] = self.normalized;
        (2.0 * p2 * v + p1) / self.scale
    }

    /// Second derivative d²y/dx² (constant for a quadratic).
    pub fn curvature(&self) -> f64 {
        2.0 * self.normalized[2] / (self.scale * self.scale)
    }

    /// Coefficients of the fit expanded back into `x` units.
    pub fn coefficients(&self) -> Coefficients {
        let [p0, p1, p2] = self.normalized;
        let m = self.center;
        let s = self.scale;
        Coefficients {
            a: p2 / (s * s),
            b: p1 / s - 2.0 * p2 * m / (s * s),
            c: p2 * m * m / (s * s) - p1 * m / s + p0,
        }
    }

    /// Smallest `x > after` at which the fitted curve equals `level`.
    ///
    /// Returns None when the curve never reaches `level` beyond `after`.
    pub fn crossing_after(&self, after: f64, level: f64) -> Option<f64> {
        let [p0, p1, p2] = self.normalized;
        // Rounding residue in the higher terms would otherwise place a
        // spurious root far beyond the data.
        let tol = ROUNDING_REL_TOL * p0.abs().max(level.abs());
        let clean = |p: f64| if p.abs() <= tol { 0.0 } else { p };
        let roots = solve_quadratic(clean(p2), clean(p1), p0 - level);
        if roots == RealRoots::All {
            return None;
        }
        roots
            .iter()
            .map(|v| self.center + self.scale * v)
            .find(|&x| x > after && x.is_finite())
    }
}

/// Fit a least-squares quadratic through `(xs[i], ys[i])`.
pub fn fit_quadratic(xs: &[f64], ys: &[f64]) -> Result<QuadraticFit, FitError> {
    if xs.len() != ys.len() {
        return Err(FitError::LengthMismatch {
            xs: xs.len(),
            ys: ys.len(),
        });
    }
    let n = xs.len();
    if n < MIN_QUADRATIC_POINTS {
        return Err(FitError::TooFewPoints {
            have: n,
            need: MIN_QUADRATIC_POINTS,
        });
    }
    if let Some(index) = xs
        .iter()
        .zip(ys)
        .position(|(x, y)| !x.is_finite() || !y.is_finite())
    {
        return Err(FitError::NonFinite { index });
    }

    let center = stable_mean(xs).ok_or(FitError::TooFewPoints {
        have: 0,
        need: MIN_QUADRATIC_POINTS,
    })?;
    let scale = xs.iter().map(|x| (x - center).abs()).fold(0.0, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return Err(FitError::Singular);
    }

    // Power sums of v and moments of y against v.
    let mut s = [NeumaierSum::new(); 5];
    let mut t = [NeumaierSum::new(); 3];
    for (&x, &y) in xs.iter().zip(ys) {
        let v = (x - center) / scale;
        let v2 = v * v;
        s[0].add(1.0);
        s[1].add(v);
        s[2].add(v2);
        s[3].add(v2 * v);
        s[4].add(v2 * v2);
        t[0].add(y);
        t[1].add(v * y);
        t[2].add(v2 * y);
    }
    let s: Vec<f64> = s.iter().map(NeumaierSum::value).collect();
    let matrix = [
        [s[0], s[1], s[2]],
        [s[1], s[2], s[3]],
        [s[2], s[3], s[4]],
    ];
    let rhs = [t[0].value(), t[1].value(), t[2].value()];

    let normalized = solve3(matrix, rhs, SINGULAR_PIVOT_TOL * n as f64).ok_or(FitError::Singular)?;

    let mut fit = QuadraticFit {
        center,
        scale,
        normalized,
        n,
        residual_sum_sq: 0.0,
        r_squared: 1.0,
    };

    let mean_y = stable_mean(ys).unwrap_or(0.0);
    let mut ss_res = NeumaierSum::new();
    let mut ss_tot = NeumaierSum::new();
    for (&x, &y) in xs.iter().zip(ys) {
        let r = y - fit.value_at(x);
        ss_res.add(r * r);
        ss_tot.add((y - mean_y) * (y - mean_y));
    }
    fit.residual_sum_sq = ss_res.value().max(0.0);
    let ss_tot = ss_tot.value();
    fit.r_squared = if ss_tot > 0.0 {
        (1.0 - fit.residual_sum_sq / ss_tot).clamp(0.0, 1.0)
    } else {
        1.0
    };

    Ok(fit)
}

/// Solve a 3×3 linear system by Gaussian elimination with partial pivoting.
///
/// Returns None if any pivot falls below `pivot_tol`.
fn solve3(mut m: [[f64; 3]; 3], mut rhs: [f64; 3], pivot_tol: f64) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot_row = (col..3).max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))?;
        if m[pivot_row][col].abs() < pivot_tol {
            return None;
        }
        m.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in (col + 1)..3 {
            let factor = m[row][col] / m[col][col];
            for k in col..3 {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = [0.0; 3];
    for row in (0..3).rev() {
        let mut acc = rhs[row];
        for k in (row + 1)..3 {
            acc -= m[row][k] * x[k];
        }
        x[row] = acc / m[row][row];
    }
    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}
