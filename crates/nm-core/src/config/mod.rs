//! Configuration loading for nm-core.
//!
//! Resolution order: `--preset` → `--config` → `NM_ANALYZER_CONFIG` →
//! `NM_CONFIG_DIR` → XDG config dir → `/etc/nomad` → built-in defaults.
//! A preset replaces the file configuration entirely.

pub use nm_config::{
    get_preset, list_presets, AnalyzerConfig, ConfigError, ConfigSnapshot, ConfigSource,
    PresetInfo, PresetName, CONFIG_SCHEMA_VERSION,
};

use nm_config::{resolve_config, validate_analyzer};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::logging::event_names;
use crate::trend::TrendSettings;

/// Configuration resolution options from the command line.
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit analyzer.json path.
    pub config_path: Option<PathBuf>,
    /// Preset name as typed by the user.
    pub preset: Option<String>,
}

/// Configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: AnalyzerConfig,
    pub source: ConfigSource,
    /// File the config came from (None for presets and defaults).
    pub path: Option<PathBuf>,
    /// SHA-256 of the file content.
    pub hash: Option<String>,
    pub preset: Option<PresetName>,
}

impl ResolvedConfig {
    /// Built-in defaults.
    pub fn builtin() -> Self {
        ResolvedConfig {
            config: AnalyzerConfig::default(),
            source: ConfigSource::BuiltinDefault,
            path: None,
            hash: None,
            preset: None,
        }
    }

    /// Engine settings derived from the configuration.
    pub fn settings(&self) -> TrendSettings {
        TrendSettings::from(&self.config)
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(
            &self.config,
            self.source,
            self.path.as_deref(),
            self.hash.as_deref(),
            self.preset,
        )
    }
}

/// Load and validate configuration with the standard resolution order.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    if let Some(name) = &options.preset {
        let preset =
            PresetName::parse(name).ok_or_else(|| ConfigError::UnknownPreset(name.clone()))?;
        let config = get_preset(preset);
        validate_analyzer(&config)?;
        info!(target: event_names::CONFIG_LOADED, preset = preset.as_str(), "using preset");
        return Ok(ResolvedConfig {
            config,
            source: ConfigSource::Preset,
            path: None,
            hash: None,
            preset: Some(preset),
        });
    }

    let paths = resolve_config(options.config_path.as_deref());
    let Some(path) = paths.analyzer else {
        debug!(target: event_names::CONFIG_DEFAULT_USED, "no analyzer.json found");
        return Ok(ResolvedConfig::builtin());
    };

    let resolved = load_file(&path, paths.source)?;
    info!(
        target: event_names::CONFIG_LOADED,
        path = %path.display(),
        source = %resolved.source,
        "loaded analyzer config"
    );
    Ok(resolved)
}

/// Load and validate one analyzer.json.
pub fn load_file(path: &Path, source: ConfigSource) -> Result<ResolvedConfig, ConfigError> {
    let (config, hash) = AnalyzerConfig::from_file(path)?;
    validate_analyzer(&config)?;
    Ok(ResolvedConfig {
        config,
        source,
        path: Some(path.to_path_buf()),
        hash: Some(hash),
        preset: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_explicit_file_wins_over_environment() {
        let file = write_config(r#"{"window_size": 40}"#);
        let resolved = load_config(&ConfigOptions {
            config_path: Some(file.path().to_path_buf()),
            preset: None,
        })
        .unwrap();
        assert_eq!(resolved.config.window_size, 40);
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.hash.as_ref().map(String::len), Some(64));
        assert_eq!(resolved.settings().window_size, 40);
    }

    #[test]
    fn test_preset_replaces_file() {
        let file = write_config(r#"{"window_size": 40}"#);
        let resolved = load_config(&ConfigOptions {
            config_path: Some(file.path().to_path_buf()),
            preset: Some("hourly".into()),
        })
        .unwrap();
        assert_eq!(resolved.source, ConfigSource::Preset);
        assert_eq!(resolved.config.window_size, 168);
        assert_eq!(resolved.snapshot().preset.as_deref(), Some("hourly"));
    }

    #[test]
    fn test_unknown_preset() {
        let err = load_config(&ConfigOptions {
            config_path: None,
            preset: Some("weekly".into()),
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset(name) if name == "weekly"));
    }

    #[test]
    fn test_invalid_file_rejected() {
        let file = write_config(r#"{"window_size": 1}"#);
        let err = load_file(file.path(), ConfigSource::CliArgument).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = load_config(&ConfigOptions {
            config_path: Some(PathBuf::from("/nonexistent/analyzer.json")),
            preset: None,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
