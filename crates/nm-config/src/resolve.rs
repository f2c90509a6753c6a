//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG path → system path → defaults.

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use std::path::{Path, PathBuf};

/// Discovered analyzer configuration path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to analyzer.json (or None if not found).
    pub analyzer: Option<PathBuf>,

    /// Where the path came from (for diagnostics).
    pub source: ConfigSource,
}

/// Where a configuration was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/nomad/.
    SystemConfig,

    /// Selected with --preset.
    Preset,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::Preset => write!(f, "preset"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_ANALYZER_PATH: &str = "NM_ANALYZER_CONFIG";
pub const ENV_CONFIG_DIR: &str = "NM_CONFIG_DIR";

/// Standard config file name.
pub const ANALYZER_FILENAME: &str = "analyzer.json";

/// Application name for XDG directories.
const APP_NAME: &str = "nomad";

/// Resolve the analyzer config path using the standard resolution order.
///
/// 1. Explicit CLI path (returned even if missing, so loading reports it)
/// 2. NM_ANALYZER_CONFIG
/// 3. NM_CONFIG_DIR + analyzer.json
/// 4. XDG config directory (~/.config/nomad/)
/// 5. System config (/etc/nomad/)
/// 6. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPaths {
    if let Some(path) = cli_path {
        return ConfigPaths {
            analyzer: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    if let Ok(env_path) = std::env::var(ENV_ANALYZER_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(ANALYZER_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(ANALYZER_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::XdgConfig);
        }
    }

    let system_path = system_config_dir().join(ANALYZER_FILENAME);
    if system_path.exists() {
        return found(system_path, ConfigSource::SystemConfig);
    }

    ConfigPaths::default()
}

fn found(path: PathBuf, source: ConfigSource) -> ConfigPaths {
    ConfigPaths {
        analyzer: Some(path),
        source,
    }
}

/// Get the XDG config directory for nomad.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
