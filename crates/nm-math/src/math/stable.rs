//! Numerically stable accumulation and comparison primitives.

/// Running sum with Neumaier compensation.
///
/// Keeps a correction term for the low-order bits lost on each addition, so
/// sums over values of mixed magnitude (e.g. byte counts near 1e13 alongside
/// small residuals) do not drift.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one term.
    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    /// Current compensated total.
    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for NeumaierSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}

/// Compensated sum of a sequence.
///
/// Returns 0.0 for empty input and NaN if any input is NaN.
pub fn stable_sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut acc = NeumaierSum::new();
    acc.extend(values);
    acc.value()
}

/// Compensated arithmetic mean. Returns None for empty input.
pub fn stable_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(stable_sum(values.iter().copied()) / values.len() as f64)
}

/// Approximate equality with combined absolute and relative tolerance.
///
/// NaN never compares equal; infinities compare equal only to the same
/// infinity.
pub fn approx_eq(a: f64, b: f64, abs_tol: f64, rel_tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() || b.is_infinite() {
        return a == b;
    }
    let diff = (a - b).abs();
    diff <= abs_tol || diff <= rel_tol * a.abs().max(b.abs())
}

/// True if `x` is negligible next to `reference` at relative tolerance `rel_tol`.
///
/// A zero reference makes only exact zero negligible.
pub fn is_negligible(x: f64, reference: f64, rel_tol: f64) -> bool {
    if x == 0.0 {
        return true;
    }
    x.abs() <= rel_tol * reference.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neumaier_recovers_small_terms() {
        // Naive summation loses the 1.0 entirely.
        let values = [1e16, 1.0, -1e16];
        let naive: f64 = values.iter().sum();
        assert_eq!(naive, 0.0);
        assert_eq!(stable_sum(values), 1.0);
    }

    #[test]
    fn test_stable_sum_empty() {
        assert_eq!(stable_sum(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_stable_sum_nan() {
        assert!(stable_sum([1.0, f64::NAN]).is_nan());
    }

    #[test]
    fn test_stable_mean() {
        assert_eq!(stable_mean(&[]), None);
        assert_eq!(stable_mean(&[2.0, 4.0, 6.0]), Some(4.0));
    }

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(1.0, 1.0 + 1e-12, 1e-9, 0.0));
        assert!(approx_eq(1e12, 1e12 + 1.0, 0.0, 1e-9));
        assert!(!approx_eq(1.0, 1.1, 1e-3, 1e-3));
        assert!(!approx_eq(f64::NAN, f64::NAN, 1.0, 1.0));
        assert!(approx_eq(f64::INFINITY, f64::INFINITY, 0.0, 0.0));
        assert!(!approx_eq(f64::INFINITY, f64::NEG_INFINITY, 0.0, 0.0));
    }

    #[test]
    fn test_is_negligible() {
        assert!(is_negligible(0.0, 0.0, 1e-9));
        assert!(is_negligible(1e-12, 10.0, 1e-9));
        assert!(!is_negligible(1e-3, 10.0, 1e-9));
        assert!(!is_negligible(1e-30, 0.0, 1e-9));
    }
}
