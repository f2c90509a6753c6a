//! JSON Schema generation for output types.
//!
//! ```bash
//! nm-core schema --list
//! nm-core schema TrendAnalysis
//! ```

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::diag::TrendSummary;
pub use crate::output::AnalyzeReport;
pub use crate::trend::{AlertLevel, AnalysisStatus, Sample, TrendAnalysis, TrendKind};
pub use nm_common::{MetricKind, StreamId};
pub use nm_config::{AnalyzerConfig, ConfigSnapshot};

/// Schema types with one-line descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        ("AnalyzeReport", "Output of the analyze command"),
        ("TrendAnalysis", "Result of one trend analysis"),
        ("TrendSummary", "Condensed trend view used by diagnostic reports"),
        ("TrendKind", "Trend classification"),
        ("AlertLevel", "Alert severity (none, info, warning, critical)"),
        ("AnalysisStatus", "Whether an analysis completed or degraded"),
        ("Sample", "One timestamped observation"),
        ("MetricKind", "Kind of metric behind a stream"),
        ("StreamId", "Metric stream identifier"),
        ("AnalyzerConfig", "analyzer.json configuration file"),
        ("ConfigSnapshot", "Configuration provenance attached to JSON output"),
    ]
}

/// Schema for a type by name, or None if unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "AnalyzeReport" => schema_for!(AnalyzeReport),
        "TrendAnalysis" => schema_for!(TrendAnalysis),
        "TrendSummary" => schema_for!(TrendSummary),
        "TrendKind" => schema_for!(TrendKind),
        "AlertLevel" => schema_for!(AlertLevel),
        "AnalysisStatus" => schema_for!(AnalysisStatus),
        "Sample" => schema_for!(Sample),
        "MetricKind" => schema_for!(MetricKind),
        "StreamId" => schema_for!(StreamId),
        "AnalyzerConfig" => schema_for!(AnalyzerConfig),
        "ConfigSnapshot" => schema_for!(ConfigSnapshot),
        _ => return None,
    };
    serde_json::to_value(schema).ok()
}

/// All schemas keyed by type name.
pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    available_schemas()
        .into_iter()
        .filter_map(|(name, _)| generate_schema(name).map(|s| (name.to_string(), s)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// Pretty-printed (default)
    Json,
    JsonCompact,
}

pub fn format_schema(schema: &Value, format: SchemaFormat) -> String {
    let rendered = match format {
        SchemaFormat::Json => serde_json::to_string_pretty(schema),
        SchemaFormat::JsonCompact => serde_json::to_string(schema),
    };
    rendered.unwrap_or_default()
}
