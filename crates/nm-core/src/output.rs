//! Report payloads and their renderings.
//!
//! Every command builds a serializable payload first; the `--format` flag
//! only decides how it is printed on stdout.

use chrono::{DateTime, Utc};
use nm_common::{MetricKind, OutputFormat, SCHEMA_VERSION};
use nm_config::ConfigSnapshot;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::sweep::SweepReport;
use crate::trend::{TrendAnalysis, TrendKind};

/// Output of `nm-core analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeReport {
    pub schema_version: String,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    /// Metric selector, e.g. `fs:/scratch`.
    pub selector: String,
    pub kind: MetricKind,
    /// Unit of raw values and derivatives.
    pub unit: String,
    pub lookback_hours: u32,
    /// History rows dropped before analysis.
    pub skipped_samples: usize,
    pub analysis: TrendAnalysis,
    pub config: ConfigSnapshot,
}

impl AnalyzeReport {
    pub fn new(
        run_id: impl Into<String>,
        selector: impl Into<String>,
        kind: MetricKind,
        lookback_hours: u32,
        skipped_samples: usize,
        analysis: TrendAnalysis,
        config: ConfigSnapshot,
    ) -> Self {
        AnalyzeReport {
            schema_version: SCHEMA_VERSION.to_string(),
            run_id: run_id.into(),
            generated_at: Utc::now(),
            selector: selector.into(),
            kind,
            unit: kind.unit().to_string(),
            lookback_hours,
            skipped_samples,
            analysis,
            config,
        }
    }
}

/// Render an analysis report; None for `exitcode`.
pub fn render_analyze(report: &AnalyzeReport, format: OutputFormat) -> Option<String> {
    match format {
        OutputFormat::Json => Some(to_json(report)),
        OutputFormat::Md => Some(analyze_markdown(report)),
        OutputFormat::Summary => Some(analyze_summary(report)),
        OutputFormat::Metrics => Some(analyze_metrics(report)),
        OutputFormat::Exitcode => None,
    }
}

/// Render one sweep tick; None for `exitcode`.
pub fn render_sweep(report: &SweepReport, format: OutputFormat) -> Option<String> {
    match format {
        OutputFormat::Json => Some(serde_json::to_string(report).unwrap_or_default()),
        OutputFormat::Md | OutputFormat::Summary => Some(sweep_text(report)),
        OutputFormat::Metrics => Some(sweep_metrics(report)),
        OutputFormat::Exitcode => None,
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        format!(r#"{{"error":"serialization_failed","message":"{}"}}"#, e)
    })
}

fn arrow(value: f64) -> &'static str {
    if value > 0.0 {
        "↑"
    } else if value < 0.0 {
        "↓"
    } else {
        "→"
    }
}

fn analyze_markdown(report: &AnalyzeReport) -> String {
    let a = &report.analysis;
    let kind = report.kind;
    let unit = kind.display_unit();
    let shown = |raw: f64| kind.to_display(raw);
    let mut out = String::new();

    let _ = writeln!(out, "## Analysis: {}\n", report.selector);
    let _ = writeln!(out, "| | |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Records | {} |", a.n_points);
    let _ = writeln!(
        out,
        "| Time span | {:.1} hours |",
        a.time_span.num_seconds() as f64 / 3600.0
    );
    match a.limit {
        Some(limit) if limit > 0.0 => {
            let _ = writeln!(
                out,
                "| Current | {:.2} {unit} / {:.2} {unit} ({:.1}%) |",
                shown(a.current_value),
                shown(limit),
                a.current_value / limit * 100.0,
            );
        }
        _ => {
            let _ = writeln!(out, "| Current | {:.2} {unit} |", shown(a.current_value));
        }
    }
    let _ = writeln!(out, "| Trend | {} |", a.trend.label());
    if let Some(d1) = a.first_derivative {
        let _ = writeln!(out, "| Rate | {} {:.4} {unit}/day |", arrow(d1), shown(d1.abs()));
    }
    if let Some(d2) = a.second_derivative {
        let _ = writeln!(
            out,
            "| Acceleration | {}{} {:.6} {unit}/day² |",
            arrow(d2),
            arrow(d2),
            shown(d2.abs())
        );
    }
    if let Some(p) = a.projected_value_1d {
        let _ = writeln!(out, "| In 1 day | {:.2} {unit} |", shown(p));
    }
    if let Some(p) = a.projected_value_7d {
        let _ = writeln!(out, "| In 7 days | {:.2} {unit} |", shown(p));
    }
    if let Some(days) = a.days_until_limit {
        let _ = writeln!(out, "| Days until full | {:.1} |", days);
    }
    let _ = writeln!(out, "| Alert | **{}** |", a.alert_level.as_str().to_uppercase());

    if a.status.is_degraded() {
        let _ = writeln!(
            out,
            "\n_Not enough usable samples to classify a trend ({:?})._",
            a.status
        );
    }
    if report.skipped_samples > 0 {
        let _ = writeln!(out, "\n_{} history rows skipped._", report.skipped_samples);
    }
    out
}

fn analyze_summary(report: &AnalyzeReport) -> String {
    let a = &report.analysis;
    let kind = report.kind;
    let mut line = format!(
        "[{}] {}: {:.2} {} {}",
        a.alert_level.as_str().to_uppercase(),
        report.selector,
        kind.to_display(a.current_value),
        kind.display_unit(),
        a.trend.as_str(),
    );
    if let Some(days) = a.days_until_limit {
        let _ = write!(line, ", full in {:.1}d", days);
    }
    line
}

fn analyze_metrics(report: &AnalyzeReport) -> String {
    let a = &report.analysis;
    let mut pairs: Vec<(&str, String)> = vec![
        ("selector", report.selector.clone()),
        ("n_points", a.n_points.to_string()),
        ("current_value", a.current_value.to_string()),
        ("trend", a.trend.as_str().to_string()),
        ("trend_code", trend_code(a.trend).to_string()),
        ("alert_level", a.alert_level.as_str().to_string()),
    ];
    let optional = [
        ("first_derivative", a.first_derivative),
        ("second_derivative", a.second_derivative),
        ("projected_value_1d", a.projected_value_1d),
        ("projected_value_7d", a.projected_value_7d),
        ("days_until_limit", a.days_until_limit),
        ("limit", a.limit),
    ];
    for (key, value) in optional {
        if let Some(v) = value {
            pairs.push((key, v.to_string()));
        }
    }
    let mut out = String::new();
    for (key, value) in pairs {
        let _ = writeln!(out, "{}={}", key, value);
    }
    out
}

/// Stable numeric code for dashboards that cannot store strings.
fn trend_code(trend: TrendKind) -> u8 {
    TrendKind::ALL
        .iter()
        .position(|t| *t == trend)
        .map_or(u8::MAX, |i| i as u8)
}

fn sweep_text(report: &SweepReport) -> String {
    let mut out = format!(
        "sweep #{} at {}: {} streams, {} changes\n",
        report.tick,
        report.at.format("%Y-%m-%d %H:%M:%S"),
        report.streams.len(),
        report.changes.len()
    );
    for change in &report.changes {
        let _ = writeln!(
            out,
            "  {}: {} -> {}",
            change.stream,
            change.previous.map_or("-", |p| p.as_str()),
            change.current
        );
    }
    for failure in &report.failures {
        let _ = writeln!(out, "  {}: error: {}", failure.stream, failure.message);
    }
    out
}

fn sweep_metrics(report: &SweepReport) -> String {
    let mut out = String::new();
    for status in &report.streams {
        let _ = writeln!(
            out,
            "stream={} alert_level={} trend={} n_points={}",
            status.stream,
            status.analysis.alert_level,
            status.analysis.trend,
            status.analysis.n_points
        );
    }
    out
}
