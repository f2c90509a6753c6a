//! Trend adapters for the node, storage and workstation reports.
//!
//! Reports hand over a [`MetricSeries`] from the history store and get back a
//! compact [`TrendSummary`]. Bad rows never fail a report: samples that
//! violate ordering or are non-finite are skipped and counted.

use nm_common::MetricKind;
use nm_history::MetricSeries;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::logging::event_names;
use crate::trend::{
    AlertLevel, Sample, SampleWindow, TrendAnalysis, TrendError, TrendKind, TrendSettings,
};

/// Condensed trend view for one stream in a diagnostic report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendSummary {
    pub selector: String,
    pub kind: MetricKind,
    pub current: f64,
    pub unit: String,
    pub trend: TrendKind,
    /// Value units per day.
    pub first_derivative: Option<f64>,
    /// Value units per day².
    pub second_derivative: Option<f64>,
    pub days_until_full: Option<f64>,
    pub alert_level: AlertLevel,
    pub n_points: usize,
    /// Series rows the window refused.
    pub skipped_samples: usize,
}

impl TrendSummary {
    pub fn from_analysis(series: &MetricSeries, analysis: &TrendAnalysis, skipped: usize) -> Self {
        TrendSummary {
            selector: series.selector.clone(),
            kind: series.kind,
            current: analysis.current_value,
            unit: series.kind.unit().to_string(),
            trend: analysis.trend,
            first_derivative: analysis.first_derivative,
            second_derivative: analysis.second_derivative,
            days_until_full: analysis.days_until_limit,
            alert_level: analysis.alert_level,
            n_points: analysis.n_points,
            skipped_samples: skipped,
        }
    }

    /// One-line description in display units.
    pub fn describe(&self) -> String {
        let scale = self.kind.display_scale();
        let unit = self.kind.display_unit();
        let mut line = format!(
            "{}: {:.2}{}{} {}",
            self.selector,
            self.current / scale,
            if unit.is_empty() { "" } else { " " },
            unit,
            self.trend.label().to_lowercase(),
        );
        if let Some(rate) = self.first_derivative {
            line.push_str(&format!(" ({:+.2} {}/day)", rate / scale, unit));
        }
        if let Some(days) = self.days_until_full {
            line.push_str(&format!(", full in {:.1} days", days));
        }
        line
    }
}

/// Build a window holding every usable sample of `series`.
///
/// Capacity is the larger of the series length and the configured window
/// size. Returns the window and the number of samples it refused.
pub fn window_from_series(series: &MetricSeries, settings: &TrendSettings) -> (SampleWindow, usize) {
    let mut window = SampleWindow::clamped(TrendSettings {
        window_size: series.len().max(settings.window_size),
        ..*settings
    });

    let mut skipped = 0;
    for point in &series.points {
        match window.append(Sample::new(point.timestamp, point.value)) {
            Ok(()) => {}
            Err(e @ (TrendError::OutOfOrderSample { .. } | TrendError::NonFiniteValue { .. })) => {
                warn!(
                    target: event_names::WINDOW_SAMPLE_REJECTED,
                    stream = %series.selector,
                    error = %e,
                    "skipping sample"
                );
                skipped += 1;
            }
            Err(_) => skipped += 1,
        }
    }
    (window, skipped)
}

/// Analyze a series against an explicit limit, or its implicit one.
pub fn analyze_series(
    series: &MetricSeries,
    settings: &TrendSettings,
    limit: Option<f64>,
) -> (TrendAnalysis, usize) {
    let (window, skipped) = window_from_series(series, settings);
    let limit = limit.or(series.implicit_limit);
    (window.analyze(limit), skipped)
}

/// Summary for a report, falling back to the implicit limit.
pub fn summarize_series(series: &MetricSeries, settings: &TrendSettings, limit: Option<f64>) -> TrendSummary {
    let (analysis, skipped) = analyze_series(series, settings, limit);
    TrendSummary::from_analysis(series, &analysis, skipped)
}
