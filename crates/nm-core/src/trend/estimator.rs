//! Derivative estimation by least-squares quadratic fit.
//!
//! Timestamps are re-expressed as days since the oldest retained sample, a
//! quadratic is fitted over the whole window, and the first and second
//! derivatives are read off at the newest sample.

use chrono::{DateTime, Utc};
use nm_math::{fit_quadratic, FitError, QuadraticFit, MIN_QUADRATIC_POINTS};

use super::{Sample, TrendError};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Fractional days from `origin` to `ts`.
pub fn days_between(origin: DateTime<Utc>, ts: DateTime<Utc>) -> f64 {
    let delta = ts - origin;
    match delta.num_microseconds() {
        Some(us) => us as f64 / (SECONDS_PER_DAY * 1e6),
        None => delta.num_milliseconds() as f64 / (SECONDS_PER_DAY * 1e3),
    }
}

/// Fit of one window, evaluated at its newest sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivativeEstimate {
    pub fit: QuadraticFit,
    /// Time of the newest sample in days since the oldest.
    pub t_n: f64,
    /// Rate of change at `t_n`, value units per day.
    pub first_derivative: f64,
    /// Acceleration, value units per day².
    pub second_derivative: f64,
    pub n_points: usize,
}

impl DerivativeEstimate {
    /// True when the fit passes through every point because there are
    /// only as many points as coefficients.
    pub fn is_exact(&self) -> bool {
        self.n_points == MIN_QUADRATIC_POINTS
    }
}

/// Stateless quadratic-fit derivative estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivativeEstimator;

impl DerivativeEstimator {
    /// Estimate derivatives at the newest sample.
    ///
    /// Returns `Ok(None)` for fewer than three samples and
    /// `Err(DegenerateWindow)` when the timestamps cannot support a fit.
    pub fn estimate(&self, samples: &[Sample]) -> Result<Option<DerivativeEstimate>, TrendError> {
        let (first, last) = match (samples.first(), samples.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Ok(None),
        };
        if samples.len() >= 2 && first.timestamp == last.timestamp {
            return Err(TrendError::DegenerateWindow);
        }
        if samples.len() < MIN_QUADRATIC_POINTS {
            return Ok(None);
        }

        let origin = first.timestamp;
        let ts: Vec<f64> = samples
            .iter()
            .map(|s| days_between(origin, s.timestamp))
            .collect();
        let ys: Vec<f64> = samples.iter().map(|s| s.value).collect();

        let fit = fit_quadratic(&ts, &ys).map_err(|e| match e {
            FitError::NonFinite { index } => TrendError::NonFiniteValue {
                value: ys.get(index).copied().unwrap_or(f64::NAN),
            },
            _ => TrendError::DegenerateWindow,
        })?;

        let t_n = days_between(origin, last.timestamp);
        Ok(Some(DerivativeEstimate {
            fit,
            t_n,
            first_derivative: fit.slope_at(t_n),
            second_derivative: fit.curvature(),
            n_points: samples.len(),
        }))
    }
}
