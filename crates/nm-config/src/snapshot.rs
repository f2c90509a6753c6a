//! Configuration snapshots for reproducible analysis output.
//!
//! A snapshot records which configuration produced an analysis, so a JSON
//! report can be re-run and compared later.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analyzer::AnalyzerConfig;
use crate::preset::PresetName;
use crate::resolve::ConfigSource;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// How the configuration was resolved.
    pub source: ConfigSource,

    /// Path the configuration was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// SHA-256 of the file content.
    #[serde(default)]
    pub content_hash: Option<String>,

    /// Preset applied, if any.
    #[serde(default)]
    pub preset: Option<String>,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSummary {
    pub window_size: usize,
    pub absolute_noise_floor: f64,
    pub relative_noise_fraction: f64,
    pub min_points_for_classification: usize,
    pub critical_days: f64,
    pub warning_days: f64,
}

impl From<&AnalyzerConfig> for ConfigSummary {
    fn from(config: &AnalyzerConfig) -> Self {
        ConfigSummary {
            window_size: config.window_size,
            absolute_noise_floor: config.absolute_noise_floor,
            relative_noise_fraction: config.relative_noise_fraction,
            min_points_for_classification: config.min_points_for_classification,
            critical_days: config.alerts.critical_days,
            warning_days: config.alerts.warning_days,
        }
    }
}

impl ConfigSnapshot {
    /// Create a new snapshot of the effective configuration.
    pub fn new(
        config: &AnalyzerConfig,
        source: ConfigSource,
        path: Option<&std::path::Path>,
        content_hash: Option<&str>,
        preset: Option<PresetName>,
    ) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            source,
            path: path.map(|p| p.display().to_string()),
            content_hash: content_hash.map(str::to_string),
            preset: preset.map(|p| p.as_str().to_string()),
            summary: ConfigSummary::from(config),
        }
    }

    /// True if no file or preset contributed.
    pub fn is_default(&self) -> bool {
        self.source == ConfigSource::BuiltinDefault
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::get_preset;
    use std::path::Path;

    #[test]
    fn test_snapshot_from_defaults() {
        let config = AnalyzerConfig::default();
        let snapshot = ConfigSnapshot::new(&config, ConfigSource::BuiltinDefault, None, None, None);
        assert!(snapshot.is_default());
        assert_eq!(snapshot.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert_eq!(snapshot.summary.window_size, 100);
        assert!(snapshot.content_hash.is_none());
    }

    #[test]
    fn test_snapshot_records_preset_and_file() {
        let config = get_preset(PresetName::Hourly);
        let snapshot = ConfigSnapshot::new(
            &config,
            ConfigSource::Preset,
            Some(Path::new("/etc/nomad/analyzer.json")),
            Some("abc123"),
            Some(PresetName::Hourly),
        );
        assert!(!snapshot.is_default());
        assert_eq!(snapshot.preset.as_deref(), Some("hourly"));
        assert_eq!(snapshot.summary.window_size, 168);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["source"], "preset");
        assert_eq!(json["content_hash"], "abc123");
    }
}
