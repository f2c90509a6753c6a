//! Analysis result types and the end-to-end pipeline.

use chrono::{DateTime, TimeDelta, Utc};
use nm_config::AnalyzerConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

use super::alert::AlertPolicy;
use super::classifier::TrendClassifier;
use super::estimator::{DerivativeEstimate, DerivativeEstimator};
use super::forecaster::Forecaster;
use super::{Sample, TrendError};

/// Shape of a metric's recent behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendKind {
    Stable,
    IncreasingLinear,
    DecreasingLinear,
    AcceleratingGrowth,
    DeceleratingGrowth,
    AcceleratingDecline,
    DeceleratingDecline,
    Unknown,
}

impl TrendKind {
    pub const ALL: &'static [TrendKind] = &[
        TrendKind::Stable,
        TrendKind::IncreasingLinear,
        TrendKind::DecreasingLinear,
        TrendKind::AcceleratingGrowth,
        TrendKind::DeceleratingGrowth,
        TrendKind::AcceleratingDecline,
        TrendKind::DeceleratingDecline,
        TrendKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendKind::Stable => "stable",
            TrendKind::IncreasingLinear => "increasing_linear",
            TrendKind::DecreasingLinear => "decreasing_linear",
            TrendKind::AcceleratingGrowth => "accelerating_growth",
            TrendKind::DeceleratingGrowth => "decelerating_growth",
            TrendKind::AcceleratingDecline => "accelerating_decline",
            TrendKind::DeceleratingDecline => "decelerating_decline",
            TrendKind::Unknown => "unknown",
        }
    }

    /// Human label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            TrendKind::Stable => "Stable",
            TrendKind::IncreasingLinear => "Increasing (linear)",
            TrendKind::DecreasingLinear => "Decreasing (linear)",
            TrendKind::AcceleratingGrowth => "Accelerating growth",
            TrendKind::DeceleratingGrowth => "Decelerating growth",
            TrendKind::AcceleratingDecline => "Accelerating decline",
            TrendKind::DeceleratingDecline => "Decelerating decline",
            TrendKind::Unknown => "Unknown",
        }
    }

    pub fn is_accelerating(&self) -> bool {
        matches!(
            self,
            TrendKind::AcceleratingGrowth | TrendKind::AcceleratingDecline
        )
    }
}

impl fmt::Display for TrendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity assigned to a trend. Ordered from quietest to most urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    #[default]
    None,
    Info,
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::None => "none",
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the analysis ran to completion or degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[default]
    Complete,
    /// Fewer samples than the classification minimum.
    InsufficientData,
    /// Timestamps do not span a usable interval.
    DegenerateWindow,
}

impl AnalysisStatus {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, AnalysisStatus::Complete)
    }
}

/// Numeric knobs for one analysis, flattened from [`AnalyzerConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSettings {
    pub window_size: usize,
    pub min_points_for_classification: usize,
    pub classifier: TrendClassifier,
    pub small_sample_noise_multiplier: f64,
    pub alerts: AlertPolicy,
    pub short_horizon_days: f64,
    pub long_horizon_days: f64,
}

impl Default for TrendSettings {
    fn default() -> Self {
        TrendSettings::from(&AnalyzerConfig::default())
    }
}

impl From<&AnalyzerConfig> for TrendSettings {
    fn from(config: &AnalyzerConfig) -> Self {
        TrendSettings {
            window_size: config.window_size,
            min_points_for_classification: config.min_points_for_classification,
            classifier: TrendClassifier::new(
                config.absolute_noise_floor,
                config.relative_noise_fraction,
            ),
            small_sample_noise_multiplier: config.small_sample_noise_multiplier,
            alerts: AlertPolicy {
                critical_days: config.alerts.critical_days,
                warning_days: config.alerts.warning_days,
            },
            short_horizon_days: config.horizons.short_days,
            long_horizon_days: config.horizons.long_days,
        }
    }
}

mod span_secs {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(span: &TimeDelta, s: S) -> Result<S::Ok, S::Error> {
        let secs = span
            .num_microseconds()
            .map(|us| us as f64 / 1e6)
            .unwrap_or_else(|| span.num_milliseconds() as f64 / 1e3);
        s.serialize_f64(secs)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TimeDelta, D::Error> {
        let secs = f64::deserialize(d)?;
        if !secs.is_finite() {
            return Err(serde::de::Error::custom("time span must be finite"));
        }
        Ok(TimeDelta::microseconds((secs * 1e6).round() as i64))
    }
}

/// Result of one `analyze()` call. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendAnalysis {
    /// Samples used.
    pub n_points: usize,
    /// Newest minus oldest sample time, serialized as seconds.
    #[serde(rename = "time_span_secs", with = "span_secs")]
    #[schemars(with = "f64")]
    pub time_span: TimeDelta,
    /// Value of the newest sample (0 for an empty window).
    pub current_value: f64,
    /// Timestamp of the newest sample.
    pub latest_timestamp: Option<DateTime<Utc>>,
    /// Rate of change, value units per day.
    pub first_derivative: Option<f64>,
    /// Acceleration, value units per day².
    pub second_derivative: Option<f64>,
    pub trend: TrendKind,
    pub projected_value_1d: Option<f64>,
    pub projected_value_7d: Option<f64>,
    /// Days until the fitted curve reaches `limit`.
    pub days_until_limit: Option<f64>,
    pub alert_level: AlertLevel,
    /// Ceiling the analysis was run against.
    pub limit: Option<f64>,
    /// Noise floor used for classification.
    pub noise_floor: Option<f64>,
    /// Goodness of fit of the quadratic.
    pub r_squared: Option<f64>,
    #[serde(default)]
    pub status: AnalysisStatus,
}

impl TrendAnalysis {
    fn degraded(samples: &[Sample], limit: Option<f64>, status: AnalysisStatus) -> Self {
        let (first, last) = (samples.first(), samples.last());
        let breached = match (last, limit) {
            (Some(s), Some(l)) => s.value >= l,
            _ => false,
        };
        TrendAnalysis {
            n_points: samples.len(),
            time_span: time_span(samples),
            current_value: last.map(|s| s.value).unwrap_or(0.0),
            latest_timestamp: last.map(|s| s.timestamp),
            first_derivative: None,
            second_derivative: None,
            trend: TrendKind::Unknown,
            projected_value_1d: None,
            projected_value_7d: None,
            days_until_limit: None,
            alert_level: if breached {
                AlertLevel::Critical
            } else {
                AlertLevel::None
            },
            limit,
            noise_floor: None,
            r_squared: None,
            status: if first.is_none() {
                AnalysisStatus::InsufficientData
            } else {
                status
            },
        }
    }

    /// True when the limit is set and the newest value has reached it.
    pub fn is_breached(&self) -> bool {
        self.n_points > 0 && self.limit.is_some_and(|l| self.current_value >= l)
    }
}

fn time_span(samples: &[Sample]) -> TimeDelta {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => last.timestamp - first.timestamp,
        _ => TimeDelta::zero(),
    }
}

/// Run the full pipeline over `samples` (oldest first).
///
/// Insufficient or degenerate windows produce a degraded analysis with
/// trend `unknown` and no derivatives or projections. Its alert level is
/// `none` unless the newest value has already reached the limit.
pub fn analyze_samples(samples: &[Sample], settings: &TrendSettings, limit: Option<f64>) -> TrendAnalysis {
    let limit = limit.filter(|l| l.is_finite());
    let min_points = settings.min_points_for_classification.max(nm_math::MIN_QUADRATIC_POINTS);

    if samples.len() < min_points {
        debug!(
            target: "analysis.degraded",
            n_points = samples.len(),
            min_points,
            "insufficient data for classification"
        );
        return TrendAnalysis::degraded(samples, limit, AnalysisStatus::InsufficientData);
    }

    let estimate = match DerivativeEstimator.estimate(samples) {
        Ok(Some(estimate)) => estimate,
        Ok(None) => {
            return TrendAnalysis::degraded(samples, limit, AnalysisStatus::InsufficientData);
        }
        Err(TrendError::DegenerateWindow) => {
            debug!(
                target: "analysis.degraded",
                n_points = samples.len(),
                "degenerate window"
            );
            return TrendAnalysis::degraded(samples, limit, AnalysisStatus::DegenerateWindow);
        }
        Err(e) => {
            // The window rejects non-finite values, so this is unreachable
            // for windowed input; treat any other failure as no data.
            debug!(target: "analysis.degraded", error = %e, "estimator failed");
            return TrendAnalysis::degraded(samples, limit, AnalysisStatus::DegenerateWindow);
        }
    };

    complete_analysis(samples, settings, &estimate, limit)
}

fn complete_analysis(
    samples: &[Sample],
    settings: &TrendSettings,
    estimate: &DerivativeEstimate,
    limit: Option<f64>,
) -> TrendAnalysis {
    let newest = samples[samples.len() - 1];
    let current = newest.value;

    let classifier = if estimate.is_exact() {
        settings.classifier.widened(settings.small_sample_noise_multiplier)
    } else {
        settings.classifier
    };
    let noise_floor = classifier.noise_floor(current);
    let trend = classifier.classify(estimate.first_derivative, estimate.second_derivative, current);

    let forecaster = Forecaster::new(estimate.fit, estimate.t_n);
    let projected_1d = forecaster.project(settings.short_horizon_days);
    let projected_7d = forecaster.project(settings.long_horizon_days);
    let days_until_limit = forecaster.estimate_days_until_limit(current, limit);

    let alert_level = settings.alerts.assign(trend, days_until_limit, current, limit);

    trace!(
        target: "analysis.finished",
        n_points = samples.len(),
        d1 = estimate.first_derivative,
        d2 = estimate.second_derivative,
        trend = %trend,
        alert = %alert_level,
        "trend analysis complete"
    );

    TrendAnalysis {
        n_points: samples.len(),
        time_span: time_span(samples),
        current_value: current,
        latest_timestamp: Some(newest.timestamp),
        first_derivative: Some(estimate.first_derivative),
        second_derivative: Some(estimate.second_derivative),
        trend,
        projected_value_1d: finite(projected_1d),
        projected_value_7d: finite(projected_7d),
        days_until_limit,
        alert_level,
        limit,
        noise_floor: Some(noise_floor),
        r_squared: Some(estimate.fit.r_squared),
        status: AnalysisStatus::Complete,
    }
}

fn finite(x: f64) -> Option<f64> {
    x.is_finite().then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn daily(values: &[f64]) -> Vec<Sample> {
        let t0 = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(t0 + Duration::days(i as i64), v))
            .collect()
    }

    #[test]
    fn test_empty_window() {
        let a = analyze_samples(&[], &TrendSettings::default(), Some(10.0));
        assert_eq!(a.n_points, 0);
        assert_eq!(a.trend, TrendKind::Unknown);
        assert_eq!(a.alert_level, AlertLevel::None);
        assert_eq!(a.status, AnalysisStatus::InsufficientData);
        assert!(!a.is_breached());
    }

    #[test]
    fn test_degenerate_window_is_degraded_not_error() {
        let t0 = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
        let samples: Vec<Sample> = (0..5).map(|i| Sample::new(t0, i as f64)).collect();
        let a = analyze_samples(&samples, &TrendSettings::default(), None);
        assert_eq!(a.status, AnalysisStatus::DegenerateWindow);
        assert_eq!(a.trend, TrendKind::Unknown);
        assert_eq!(a.first_derivative, None);
        assert_eq!(a.alert_level, AlertLevel::None);
        assert_eq!(a.time_span, TimeDelta::zero());
    }

    #[test]
    fn test_breached_short_window_is_critical() {
        let a = analyze_samples(&daily(&[99.0, 100.0]), &TrendSettings::default(), Some(100.0));
        assert_eq!(a.status, AnalysisStatus::InsufficientData);
        assert_eq!(a.trend, TrendKind::Unknown);
        assert_eq!(a.days_until_limit, None);
        assert!(a.is_breached());
        assert_eq!(a.alert_level, AlertLevel::Critical);

        let a = analyze_samples(&daily(&[99.0, 100.0]), &TrendSettings::default(), Some(100.5));
        assert_eq!(a.alert_level, AlertLevel::None);
    }

    #[test]
    fn test_min_points_above_three() {
        let settings = TrendSettings {
            min_points_for_classification: 5,
            ..TrendSettings::default()
        };
        let a = analyze_samples(&daily(&[1.0, 2.0, 3.0, 4.0]), &settings, None);
        assert_eq!(a.status, AnalysisStatus::InsufficientData);
        let a = analyze_samples(&daily(&[1.0, 2.0, 3.0, 4.0, 5.0]), &settings, None);
        assert_eq!(a.status, AnalysisStatus::Complete);
    }

    #[test]
    fn test_exact_fit_uses_widened_floor() {
        // Slope 0.015/day sits between the base floor (0.01) and the
        // widened one (0.02).
        let a = analyze_samples(&daily(&[0.0, 0.015, 0.03]), &TrendSettings::default(), None);
        assert_eq!(a.trend, TrendKind::Stable);
        assert_eq!(a.noise_floor, Some(0.02));

        let a = analyze_samples(&daily(&[0.0, 0.015, 0.03, 0.045]), &TrendSettings::default(), None);
        assert_eq!(a.trend, TrendKind::IncreasingLinear);
    }

    #[test]
    fn test_serialized_field_names() {
        // Slope 1/day from 4 toward 30: ETA 26 days.
        let a = analyze_samples(&daily(&[1.0, 2.0, 3.0, 4.0]), &TrendSettings::default(), Some(30.0));
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["trend"], "increasing_linear");
        assert_eq!(json["alert_level"], "warning");
        assert_eq!(json["time_span_secs"], 3.0 * 86_400.0);
        assert_eq!(json["status"], "complete");
        let back: TrendAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(back.time_span, TimeDelta::days(3));
    }

    #[test]
    fn test_alert_level_ordering() {
        assert!(AlertLevel::None < AlertLevel::Info);
        assert!(AlertLevel::Info < AlertLevel::Warning);
        assert!(AlertLevel::Warning < AlertLevel::Critical);
    }

    #[test]
    fn test_trend_kind_strings_match_serde() {
        for kind in TrendKind::ALL {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
