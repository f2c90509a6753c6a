//! NOMAD trend analyzer configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for analyzer.json
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation
//! - Cadence presets
//! - Config snapshots for reproducible analysis output

pub mod analyzer;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use analyzer::{AlertThresholds, AnalyzerConfig, ConfigError, Horizons};
pub use preset::{get_preset, list_presets, PresetInfo, PresetName};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_analyzer, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
