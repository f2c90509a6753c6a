//! Extrapolation of the fitted curve.

use nm_math::{Coefficients, QuadraticFit};

/// Projects a fitted quadratic forward from the newest sample time `t_n`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecaster {
    fit: QuadraticFit,
    t_n: f64,
}

impl Forecaster {
    pub fn new(fit: QuadraticFit, t_n: f64) -> Self {
        Forecaster { fit, t_n }
    }

    /// Forecaster over raw coefficients `a·t² + b·t + c`.
    pub fn from_coefficients(coefficients: Coefficients, t_n: f64) -> Self {
        let Coefficients { a, b, c } = coefficients;
        let fit = QuadraticFit {
            center: 0.0,
            scale: 1.0,
            normalized: [c, b, a],
            n: 0,
            residual_sum_sq: 0.0,
            r_squared: 1.0,
        };
        Forecaster { fit, t_n }
    }

    pub fn t_n(&self) -> f64 {
        self.t_n
    }

    /// Fitted value `horizon_days` after the newest sample.
    pub fn project(&self, horizon_days: f64) -> f64 {
        self.fit.value_at(self.t_n + horizon_days)
    }

    /// Days from `t_n` until the trajectory first reaches `limit`.
    ///
    /// The fitted curve is shifted to pass through `current_value` at `t_n`,
    /// so the search starts below the limit and a lower limit is always
    /// reached no later than a higher one. None when no limit is given, when
    /// `current_value` is already at or over it, or when the trajectory never
    /// reaches it in forward time. Limits are ceilings.
    pub fn estimate_days_until_limit(&self, current_value: f64, limit: Option<f64>) -> Option<f64> {
        let limit = limit.filter(|l| l.is_finite())?;
        if !current_value.is_finite() || current_value >= limit {
            return None;
        }
        let offset = current_value - self.fit.value_at(self.t_n);
        let root = self.fit.crossing_after(self.t_n, limit - offset)?;
        let days = root - self.t_n;
        (days > 0.0 && days.is_finite()).then_some(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nm_math::fit_quadratic;

    fn linear_forecaster() -> Forecaster {
        // 100, 102, ..., 118 on days 0..9
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 100.0 + 2.0 * x).collect();
        Forecaster::new(fit_quadratic(&xs, &ys).unwrap(), 9.0)
    }

    #[test]
    fn test_project_linear() {
        let f = linear_forecaster();
        assert!((f.project(1.0) - 120.0).abs() < 1e-9);
        assert!((f.project(7.0) - 132.0).abs() < 1e-9);
    }

    #[test]
    fn test_days_until_limit_linear() {
        let f = linear_forecaster();
        let eta = f.estimate_days_until_limit(118.0, Some(200.0)).unwrap();
        assert!((eta - 41.0).abs() < 1e-6);
        let eta = f.estimate_days_until_limit(118.0, Some(130.0)).unwrap();
        assert!((eta - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_limit_or_already_breached() {
        let f = linear_forecaster();
        assert_eq!(f.estimate_days_until_limit(118.0, None), None);
        assert_eq!(f.estimate_days_until_limit(118.0, Some(118.0)), None);
        assert_eq!(f.estimate_days_until_limit(118.0, Some(50.0)), None);
        assert_eq!(f.estimate_days_until_limit(118.0, Some(f64::NAN)), None);
    }

    #[test]
    fn test_receding_trajectory_never_crosses() {
        // y = 100 - 2t
        let f = Forecaster::from_coefficients(Coefficients { a: 0.0, b: -2.0, c: 100.0 }, 5.0);
        assert_eq!(f.estimate_days_until_limit(90.0, Some(150.0)), None);
    }

    #[test]
    fn test_quadratic_smallest_forward_root() {
        // y = t² crosses 100 at t = 10; t_n = 4 → 6 days.
        let f = Forecaster::from_coefficients(Coefficients { a: 1.0, b: 0.0, c: 0.0 }, 4.0);
        let eta = f.estimate_days_until_limit(16.0, Some(100.0)).unwrap();
        assert!((eta - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_newest_sample_below_fit_keeps_eta_monotone() {
        // +2/day with alternating ±1.5 noise; the last sample lands under
        // the fitted line, so limits just above it sit below the curve.
        let xs: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs
            .iter()
            .map(|x| 100.0 + 2.0 * x + if *x as i64 % 2 == 0 { 1.5 } else { -1.5 })
            .collect();
        let current = ys[19];
        let f = Forecaster::new(fit_quadratic(&xs, &ys).unwrap(), 19.0);
        assert!(f.project(0.0) > 137.0);

        let etas: Vec<f64> = [137.0, 138.0, 140.0, 160.0]
            .iter()
            .map(|&l| f.estimate_days_until_limit(current, Some(l)).unwrap())
            .collect();
        assert!(etas[0] > 0.0);
        assert!(etas.windows(2).all(|w| w[0] <= w[1]), "etas = {:?}", etas);
    }

    #[test]
    fn test_decelerating_growth_that_peaks_below_limit() {
        // y = -t² + 10t peaks at 25 (t = 5).
        let f = Forecaster::from_coefficients(Coefficients { a: -1.0, b: 10.0, c: 0.0 }, 2.0);
        assert_eq!(f.estimate_days_until_limit(16.0, Some(30.0)), None);
        let eta = f.estimate_days_until_limit(16.0, Some(24.0)).unwrap();
        assert!((eta - 2.0).abs() < 1e-9);
    }
}
