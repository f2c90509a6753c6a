//! Analyzer configuration types.
//!
//! These types describe analyzer.json. Every field has a default, so an empty
//! object `{}` is a valid configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validate::ValidationError;
use crate::CONFIG_SCHEMA_VERSION;

/// Errors that can occur while loading analyzer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("semantic validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

impl From<ConfigError> for nm_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::VersionMismatch { expected, actual } => {
                nm_common::Error::ConfigVersionMismatch {
                    expected,
                    found: actual,
                }
            }
            ConfigError::UnknownPreset(name) => nm_common::Error::UnknownPreset(name),
            ConfigError::Validation(e) => nm_common::Error::InvalidConfig(e.to_string()),
            other => nm_common::Error::Config(other.to_string()),
        }
    }
}

/// Alert thresholds on days-until-limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AlertThresholds {
    /// ETA at or below this many days is critical.
    pub critical_days: f64,
    /// ETA at or below this many days is a warning.
    pub warning_days: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            critical_days: 7.0,
            warning_days: 30.0,
        }
    }
}

/// Projection horizons, in days past the newest sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Horizons {
    pub short_days: f64,
    pub long_days: f64,
}

impl Default for Horizons {
    fn default() -> Self {
        Self {
            short_days: 1.0,
            long_days: 7.0,
        }
    }
}

/// Complete analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub schema_version: String,

    /// Maximum number of samples retained per stream.
    pub window_size: usize,

    /// Minimum derivative magnitude (value units/day) treated as real.
    pub absolute_noise_floor: f64,

    /// Noise floor as a fraction of |current value| per day.
    pub relative_noise_fraction: f64,

    /// Fewer samples than this yield an `unknown` trend.
    pub min_points_for_classification: usize,

    /// Noise-floor widening applied when the fit is exact (three points).
    pub small_sample_noise_multiplier: f64,

    pub alerts: AlertThresholds,

    pub horizons: Horizons,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            window_size: 100,
            absolute_noise_floor: 0.01,
            relative_noise_fraction: 0.005,
            min_points_for_classification: 3,
            small_sample_noise_multiplier: 2.0,
            alerts: AlertThresholds::default(),
            horizons: Horizons::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Parse from a JSON string and check the schema version.
    pub fn from_json_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: AnalyzerConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

        if config.schema_version != CONFIG_SCHEMA_VERSION {
            return Err(ConfigError::VersionMismatch {
                expected: CONFIG_SCHEMA_VERSION.to_string(),
                actual: config.schema_version,
            });
        }
        Ok(config)
    }

    /// Load from a file, returning the config and the SHA-256 of its content.
    pub fn from_file(path: &Path) -> Result<(Self, String), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let hash = hash_content(&content);
        let config = Self::from_json_str(&content, path)?;
        Ok((config, hash))
    }
}

/// SHA-256 of content, hex encoded.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
