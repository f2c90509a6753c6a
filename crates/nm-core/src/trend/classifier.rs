//! Trend classification against a metric-relative noise floor.

use super::analysis::TrendKind;

/// Maps derivative estimates to a [`TrendKind`].
///
/// The noise floor is `max(absolute, relative · |current|)`, so drift that is
/// small compared to the metric's magnitude is not reported as growth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendClassifier {
    pub absolute_noise_floor: f64,
    pub relative_noise_fraction: f64,
}

impl Default for TrendClassifier {
    fn default() -> Self {
        TrendClassifier {
            absolute_noise_floor: 0.01,
            relative_noise_fraction: 0.005,
        }
    }
}

impl TrendClassifier {
    pub fn new(absolute_noise_floor: f64, relative_noise_fraction: f64) -> Self {
        TrendClassifier {
            absolute_noise_floor,
            relative_noise_fraction,
        }
    }

    /// Classifier with both floors scaled by `factor` (used for exact fits).
    pub fn widened(&self, factor: f64) -> Self {
        TrendClassifier {
            absolute_noise_floor: self.absolute_noise_floor * factor,
            relative_noise_fraction: self.relative_noise_fraction * factor,
        }
    }

    pub fn noise_floor(&self, current_value: f64) -> f64 {
        self.absolute_noise_floor
            .max(self.relative_noise_fraction * current_value.abs())
    }

    /// Classify a rate/acceleration pair.
    ///
    /// A slope inside the floor is `Stable` whatever the acceleration.
    pub fn classify(&self, first_derivative: f64, second_derivative: f64, current_value: f64) -> TrendKind {
        if !first_derivative.is_finite() || !second_derivative.is_finite() {
            return TrendKind::Unknown;
        }
        let floor = self.noise_floor(current_value);
        let d1 = first_derivative;
        let d2 = second_derivative;

        if d1.abs() <= floor {
            return TrendKind::Stable;
        }
        let rising = d1 > 0.0;
        if d2.abs() <= floor {
            return if rising {
                TrendKind::IncreasingLinear
            } else {
                TrendKind::DecreasingLinear
            };
        }
        match (rising, d2 > 0.0) {
            (true, true) => TrendKind::AcceleratingGrowth,
            (true, false) => TrendKind::DeceleratingGrowth,
            (false, false) => TrendKind::AcceleratingDecline,
            (false, true) => TrendKind::DeceleratingDecline,
        }
    }
}
