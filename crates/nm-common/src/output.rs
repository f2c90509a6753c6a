//! Output formats.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Supported output formats for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured JSON for machine consumption
    Json,

    /// Human-readable Markdown (default)
    #[default]
    Md,

    /// One-line summary for quick status checks
    Summary,

    /// Key=value pairs for monitoring systems
    Metrics,

    /// No output; the exit code carries the alert level
    Exitcode,
}

impl OutputFormat {
    /// True for formats meant to be parsed by programs.
    pub fn is_machine(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Metrics)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Md => write!(f, "md"),
            OutputFormat::Summary => write!(f, "summary"),
            OutputFormat::Metrics => write!(f, "metrics"),
            OutputFormat::Exitcode => write!(f, "exitcode"),
        }
    }
}
