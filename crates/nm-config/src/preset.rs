//! Analyzer presets keyed by sampling cadence.
//!
//! Provides pre-built configurations for:
//! - Realtime: 1-minute sampling, five hours of history
//! - Standard: 5-minute sampling, the built-in defaults
//! - Hourly: hourly sampling, one week of history
//! - Conservative: wider noise floors and an earlier alert band

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzer::{AlertThresholds, AnalyzerConfig};
use crate::ConfigError;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// 1-minute sampling cadence
    Realtime,
    /// 5-minute sampling cadence
    Standard,
    /// Hourly sampling cadence
    Hourly,
    /// Fewer, earlier alerts for noisy shared filesystems
    Conservative,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[
        PresetName::Realtime,
        PresetName::Standard,
        PresetName::Hourly,
        PresetName::Conservative,
    ];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Realtime => "realtime",
            PresetName::Standard => "standard",
            PresetName::Hourly => "hourly",
            PresetName::Conservative => "conservative",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "realtime" | "minute" => Some(PresetName::Realtime),
            "standard" | "default" => Some(PresetName::Standard),
            "hourly" | "hour" => Some(PresetName::Hourly),
            "conservative" | "quiet" => Some(PresetName::Conservative),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Realtime => "1-minute sampling; 300-sample window (5 hours)",
            PresetName::Standard => "5-minute sampling; 100-sample window (built-in defaults)",
            PresetName::Hourly => "Hourly sampling; 168-sample window (1 week)",
            PresetName::Conservative => {
                "Wider noise floors; critical within 14 days, warning within 45"
            }
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

/// Get the analyzer config for a preset.
pub fn get_preset(name: PresetName) -> AnalyzerConfig {
    match name {
        PresetName::Realtime => AnalyzerConfig {
            window_size: 300,
            ..AnalyzerConfig::default()
        },
        PresetName::Standard => AnalyzerConfig::default(),
        PresetName::Hourly => AnalyzerConfig {
            window_size: 168,
            ..AnalyzerConfig::default()
        },
        PresetName::Conservative => AnalyzerConfig {
            absolute_noise_floor: 0.05,
            relative_noise_fraction: 0.01,
            small_sample_noise_multiplier: 3.0,
            alerts: AlertThresholds {
                critical_days: 14.0,
                warning_days: 45.0,
            },
            ..AnalyzerConfig::default()
        },
    }
}

/// Preset listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: PresetName,
    pub description: String,
    pub window_size: usize,
}

impl PresetInfo {
    pub fn from_preset(name: PresetName) -> Self {
        PresetInfo {
            name,
            description: name.description().to_string(),
            window_size: get_preset(name).window_size,
        }
    }
}

/// List all presets with descriptions.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo::from_preset(name))
        .collect()
}
