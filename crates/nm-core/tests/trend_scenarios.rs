//! End-to-end trend scenarios over the public window API.
//!
//! Each test builds a window the way a collector would, by appending
//! samples in time order, and checks the resulting analysis.

use chrono::{DateTime, Duration, TimeZone, Utc};
use nm_core::trend::AnalysisStatus;
use nm_core::{AlertLevel, SampleWindow, TrendKind, TrendSettings};

fn day(d: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() + Duration::days(d)
}

fn window_of(values: &[f64], window_size: usize) -> SampleWindow {
    let mut w = SampleWindow::new(TrendSettings {
        window_size,
        ..TrendSettings::default()
    })
    .unwrap();
    for (i, &v) in values.iter().enumerate() {
        w.push(day(i as i64), v).unwrap();
    }
    w
}

fn disk_series() -> Vec<f64> {
    (0..10).map(|i| 100.0 + 2.0 * i as f64).collect()
}

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

// ============================================================================
// Capacity scenarios
// ============================================================================

mod capacity {
    use super::*;

    #[test]
    fn linear_disk_growth_with_distant_limit_is_info() {
        let analysis = window_of(&disk_series(), 30).analyze(Some(200.0));

        assert_eq!(analysis.n_points, 10);
        assert_eq!(analysis.current_value, 118.0);
        assert_eq!(analysis.time_span, Duration::days(9));
        assert!(close(analysis.first_derivative.unwrap(), 2.0, 1e-9));
        assert!(close(analysis.second_derivative.unwrap(), 0.0, 1e-9));
        assert_eq!(analysis.trend, TrendKind::IncreasingLinear);
        assert!(close(analysis.days_until_limit.unwrap(), 41.0, 1e-6));
        assert_eq!(analysis.alert_level, AlertLevel::Info);
        assert!(close(analysis.projected_value_1d.unwrap(), 120.0, 1e-6));
        assert!(close(analysis.projected_value_7d.unwrap(), 132.0, 1e-6));
    }

    #[test]
    fn linear_disk_growth_with_near_limit_is_critical() {
        let analysis = window_of(&disk_series(), 30).analyze(Some(130.0));

        assert!(close(analysis.days_until_limit.unwrap(), 6.0, 1e-6));
        assert_eq!(analysis.alert_level, AlertLevel::Critical);
    }

    #[test]
    fn eta_inside_a_month_is_warning() {
        // (150 - 118) / 2 = 16 days
        let analysis = window_of(&disk_series(), 30).analyze(Some(150.0));

        assert!(close(analysis.days_until_limit.unwrap(), 16.0, 1e-6));
        assert_eq!(analysis.alert_level, AlertLevel::Warning);
    }

    #[test]
    fn flat_series_is_stable_and_quiet() {
        let analysis = window_of(&[50.0; 5], 30).analyze(Some(100.0));

        assert_eq!(analysis.trend, TrendKind::Stable);
        assert_eq!(analysis.alert_level, AlertLevel::None);
        assert_eq!(analysis.days_until_limit, None);
    }

    #[test]
    fn breached_limit_is_critical_regardless_of_trend() {
        let analysis = window_of(&[210.0, 208.0, 207.0, 206.0, 205.0], 30).analyze(Some(200.0));

        assert_eq!(analysis.current_value, 205.0);
        assert!(analysis.is_breached());
        assert_eq!(analysis.days_until_limit, None);
        assert_eq!(analysis.alert_level, AlertLevel::Critical);
    }

    #[test]
    fn receding_from_limit_has_no_eta() {
        let values: Vec<f64> = (0..10).map(|i| 180.0 - 3.0 * i as f64).collect();
        let analysis = window_of(&values, 30).analyze(Some(200.0));

        assert_eq!(analysis.trend, TrendKind::DecreasingLinear);
        assert_eq!(analysis.days_until_limit, None);
        assert_eq!(analysis.alert_level, AlertLevel::Info);
    }
}

// ============================================================================
// Shape classification
// ============================================================================

mod shapes {
    use super::*;

    fn quadratic(v0: f64, r: f64, s: f64) -> Vec<f64> {
        (0..10)
            .map(|i| {
                let t = i as f64;
                v0 + r * t + 0.5 * s * t * t
            })
            .collect()
    }

    #[test]
    fn accelerating_growth() {
        let analysis = window_of(&quadratic(10.0, 2.0, 1.0), 30).analyze(None);
        assert!(close(analysis.second_derivative.unwrap(), 1.0, 1e-9));
        assert_eq!(analysis.trend, TrendKind::AcceleratingGrowth);
        // Acceleration with no ceiling is worth a warning on its own.
        assert_eq!(analysis.alert_level, AlertLevel::Warning);
    }

    #[test]
    fn decelerating_growth() {
        let analysis = window_of(&quadratic(0.0, 20.0, -1.0), 30).analyze(None);
        assert!(close(analysis.second_derivative.unwrap(), -1.0, 1e-9));
        assert!(close(analysis.first_derivative.unwrap(), 11.0, 1e-9));
        assert_eq!(analysis.trend, TrendKind::DeceleratingGrowth);
        assert_eq!(analysis.alert_level, AlertLevel::Info);
    }

    #[test]
    fn accelerating_decline() {
        let analysis = window_of(&quadratic(200.0, -2.0, -1.0), 30).analyze(None);
        assert!(close(analysis.second_derivative.unwrap(), -1.0, 1e-9));
        assert_eq!(analysis.trend, TrendKind::AcceleratingDecline);
        assert_eq!(analysis.alert_level, AlertLevel::Warning);
    }

    #[test]
    fn decelerating_decline() {
        let analysis = window_of(&quadratic(200.0, -20.0, 1.0), 30).analyze(None);
        assert!(close(analysis.first_derivative.unwrap(), -11.0, 1e-9));
        assert_eq!(analysis.trend, TrendKind::DeceleratingDecline);
        assert_eq!(analysis.alert_level, AlertLevel::Info);
    }

    #[test]
    fn accelerating_growth_toward_limit_uses_curved_eta() {
        // value = 10 + 2t + 0.5t², at t = 9: 68.5, slope 11.
        // Crossing 100: 0.5t² + 2t - 90 = 0 → t = -2 + sqrt(184) ≈ 11.565
        let analysis = window_of(&quadratic(10.0, 2.0, 1.0), 30).analyze(Some(100.0));
        let expected = -2.0 + 184f64.sqrt() - 9.0;
        assert!(close(analysis.days_until_limit.unwrap(), expected, 1e-6));
        assert_eq!(analysis.alert_level, AlertLevel::Critical);
    }
}

// ============================================================================
// Degraded windows
// ============================================================================

mod degraded {
    use super::*;

    #[test]
    fn fewer_than_three_samples_is_unknown() {
        for n in 0..3 {
            let values: Vec<f64> = (0..n).map(|i| i as f64 * 100.0).collect();
            let analysis = window_of(&values, 30).analyze(Some(1000.0));
            assert_eq!(analysis.n_points, n);
            assert_eq!(analysis.trend, TrendKind::Unknown);
            assert_eq!(analysis.first_derivative, None);
            assert_eq!(analysis.second_derivative, None);
            assert_eq!(analysis.projected_value_1d, None);
            assert_eq!(analysis.projected_value_7d, None);
            assert_eq!(analysis.days_until_limit, None);
            assert_eq!(analysis.alert_level, AlertLevel::None);
            assert_eq!(analysis.status, AnalysisStatus::InsufficientData);
        }
    }

    #[test]
    fn identical_timestamps_degrade_instead_of_failing() {
        let mut w = SampleWindow::with_capacity(10).unwrap();
        for v in [1.0, 5.0, 9.0, 12.0] {
            w.push(day(0), v).unwrap();
        }
        let analysis = w.analyze(Some(20.0));
        assert_eq!(analysis.n_points, 4);
        assert_eq!(analysis.trend, TrendKind::Unknown);
        assert_eq!(analysis.first_derivative, None);
        assert_eq!(analysis.alert_level, AlertLevel::None);
        assert_eq!(analysis.status, AnalysisStatus::DegenerateWindow);
        assert_eq!(analysis.time_span, Duration::zero());
    }

    #[test]
    fn full_filesystem_with_short_history_is_critical() {
        let analysis = window_of(&[200.0, 205.0], 30).analyze(Some(200.0));
        assert_eq!(analysis.trend, TrendKind::Unknown);
        assert_eq!(analysis.status, AnalysisStatus::InsufficientData);
        assert_eq!(analysis.alert_level, AlertLevel::Critical);

        let mut w = SampleWindow::with_capacity(10).unwrap();
        for v in [190.0, 201.0, 205.0] {
            w.push(day(0), v).unwrap();
        }
        let analysis = w.analyze(Some(200.0));
        assert_eq!(analysis.status, AnalysisStatus::DegenerateWindow);
        assert_eq!(analysis.alert_level, AlertLevel::Critical);
    }

    #[test]
    fn three_point_window_is_exact_but_classified_cautiously() {
        // Three points fit a quadratic exactly; the noise floor is widened.
        // Slope 0.08/day against a floor of roughly 0.05 (0.10 when widened).
        let three = window_of(&[10.0, 10.08, 10.16], 30).analyze(None);
        let many = window_of(&[10.0, 10.08, 10.16, 10.24, 10.32], 30).analyze(None);
        assert!(three.noise_floor.unwrap() > many.noise_floor.unwrap());
        assert_eq!(three.trend, TrendKind::Stable);
        assert_eq!(many.trend, TrendKind::IncreasingLinear);
    }
}

// ============================================================================
// Window behaviour
// ============================================================================

mod window {
    use super::*;

    #[test]
    fn eviction_keeps_most_recent_in_order() {
        let w = window_of(&(0..37).map(|i| i as f64).collect::<Vec<_>>(), 30);
        let snapshot = w.snapshot();
        assert_eq!(snapshot.len(), 30);
        let values: Vec<f64> = snapshot.iter().map(|s| s.value).collect();
        let expected: Vec<f64> = (7..37).map(|i| i as f64).collect();
        assert_eq!(values, expected);
        assert_eq!(snapshot[0].timestamp, day(7));
    }

    #[test]
    fn repeated_analysis_is_identical() {
        let w = window_of(&[3.0, 7.5, 6.1, 9.9, 14.2, 13.0], 30);
        let first = w.analyze(Some(40.0));
        let second = w.analyze(Some(40.0));
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn analysis_serializes_span_in_seconds() {
        let analysis = window_of(&disk_series(), 30).analyze(Some(200.0));
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["time_span_secs"], serde_json::json!(9.0 * 86_400.0));
        assert_eq!(json["trend"], "increasing_linear");
        assert_eq!(json["alert_level"], "info");
    }
}
