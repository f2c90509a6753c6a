//! Error types for NOMAD trend analysis.
//!
//! Every error carries:
//! - A stable numeric code for machine parsing
//! - A category for grouping
//! - A recoverability hint and a suggested action for automation
//! - A remediation hint for humans
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 40,
//!   "category": "history",
//!   "message": "history database not found: /var/lib/nomad/nomad.db",
//!   "recoverable": true,
//!   "suggested_action": "run_collector",
//!   "context": { "path": "/var/lib/nomad/nomad.db" }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for NOMAD operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Analyzer configuration errors.
    Config,
    /// Sample ingestion errors (ordering, non-finite values).
    Ingest,
    /// Fit and classification errors.
    Analysis,
    /// History store errors.
    History,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Ingest => write!(f, "ingest"),
            ErrorCategory::Analysis => write!(f, "analysis"),
            ErrorCategory::History => write!(f, "history"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for automation to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation.
    Retry,
    /// Reset configuration to defaults.
    ResetConfig,
    /// Run `config validate`.
    RunCheck,
    /// Run the collectors so history exists.
    RunCollector,
    /// Widen the lookback window or wait for more samples.
    Wait,
    /// Skip this sample or stream and continue.
    Skip,
    /// Fix the calling code.
    FixCaller,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::ResetConfig => write!(f, "reset_config"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::RunCollector => write!(f, "run_collector"),
            SuggestedAction::Wait => write!(f, "wait"),
            SuggestedAction::Skip => write!(f, "skip"),
            SuggestedAction::FixCaller => write!(f, "fix_caller"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for NOMAD trend analysis.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid analyzer configuration: {0}")]
    InvalidConfig(String),

    #[error("config schema version mismatch: expected {expected}, found {found}")]
    ConfigVersionMismatch { expected: String, found: String },

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    // Ingest errors (20-29)
    #[error("out-of-order sample: {attempted} is older than latest {previous}")]
    OutOfOrderSample {
        previous: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    #[error("non-finite sample value: {value}")]
    NonFiniteValue { value: f64 },

    #[error("invalid window size {size}: must be at least 2")]
    InvalidWindowSize { size: usize },

    // Analysis errors (30-39)
    #[error("degenerate window: all retained timestamps are identical")]
    DegenerateWindow,

    #[error("analysis failed: {0}")]
    Analysis(String),

    // History errors (40-49)
    #[error("history database not found: {path}")]
    DatabaseNotFound { path: String },

    #[error("history store error: {0}")]
    History(String),

    #[error("unknown metric selector: {0}")]
    UnknownSelector(String),

    #[error("no samples for {selector} in the requested window")]
    NoData { selector: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Ingest errors
    /// - 30-39: Analysis errors
    /// - 40-49: History errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::ConfigVersionMismatch { .. } => 12,
            Error::UnknownPreset(_) => 13,
            Error::OutOfOrderSample { .. } => 20,
            Error::NonFiniteValue { .. } => 21,
            Error::InvalidWindowSize { .. } => 22,
            Error::DegenerateWindow => 30,
            Error::Analysis(_) => 31,
            Error::DatabaseNotFound { .. } => 40,
            Error::History(_) => 41,
            Error::UnknownSelector(_) => 42,
            Error::NoData { .. } => 43,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_)
            | Error::InvalidConfig(_)
            | Error::ConfigVersionMismatch { .. }
            | Error::UnknownPreset(_) => ErrorCategory::Config,

            Error::OutOfOrderSample { .. }
            | Error::NonFiniteValue { .. }
            | Error::InvalidWindowSize { .. } => ErrorCategory::Ingest,

            Error::DegenerateWindow | Error::Analysis(_) => ErrorCategory::Analysis,

            Error::DatabaseNotFound { .. }
            | Error::History(_)
            | Error::UnknownSelector(_)
            | Error::NoData { .. } => ErrorCategory::History,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidConfig(_) => true,
            Error::ConfigVersionMismatch { .. } => true,
            Error::UnknownPreset(_) => true,

            // Caller bugs: retrying the same input fails the same way
            Error::OutOfOrderSample { .. } => false,
            Error::NonFiniteValue { .. } => false,
            Error::InvalidWindowSize { .. } => false,

            Error::DegenerateWindow => true, // More samples will arrive
            Error::Analysis(_) => false,

            Error::DatabaseNotFound { .. } => true,
            Error::History(_) => true,
            Error::UnknownSelector(_) => false,
            Error::NoData { .. } => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns the suggested action for automation.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidConfig(_) => SuggestedAction::RunCheck,
            Error::ConfigVersionMismatch { .. } => SuggestedAction::ResetConfig,
            Error::UnknownPreset(_) => SuggestedAction::RunCheck,

            Error::OutOfOrderSample { .. } => SuggestedAction::FixCaller,
            Error::NonFiniteValue { .. } => SuggestedAction::Skip,
            Error::InvalidWindowSize { .. } => SuggestedAction::ResetConfig,

            Error::DegenerateWindow => SuggestedAction::Wait,
            Error::Analysis(_) => SuggestedAction::ManualIntervention,

            Error::DatabaseNotFound { .. } => SuggestedAction::RunCollector,
            Error::History(_) => SuggestedAction::Retry,
            Error::UnknownSelector(_) => SuggestedAction::FixCaller,
            Error::NoData { .. } => SuggestedAction::Wait,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => {
                "Run 'nm-core config validate' to check analyzer.json, or remove it to use defaults."
            }
            Error::ConfigVersionMismatch { .. } => {
                "Regenerate analyzer.json with 'nm-core config show --format json'."
            }
            Error::UnknownPreset(_) => "List available presets with 'nm-core config presets'.",

            Error::OutOfOrderSample { .. } => {
                "Replay samples in ascending timestamp order. Out-of-order samples are rejected, never reordered."
            }
            Error::NonFiniteValue { .. } => {
                "The collector produced NaN or infinity. Skip the sample and check the collector output."
            }
            Error::InvalidWindowSize { .. } => "Set window_size to 2 or more in analyzer.json.",

            Error::DegenerateWindow => {
                "All samples share one timestamp. Wait for more collection cycles."
            }
            Error::Analysis(_) => "Internal analysis failure. Report it with the input series.",

            Error::DatabaseNotFound { .. } => {
                "Run the collectors first, or point --db / NM_DB at an existing history database."
            }
            Error::History(_) => {
                "Check that the history database is readable and not locked by a writer. Retry."
            }
            Error::UnknownSelector(_) => {
                "Use fs:<path>, ws:<host>:memory|disk|load, or storage:<host>."
            }
            Error::NoData { .. } => {
                "Increase --hours or wait for the collectors to record more samples."
            }

            Error::Io(_) => "Check disk space and permissions. Retry the operation.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidConfig(_) => "Invalid Analyzer Configuration",
            Error::ConfigVersionMismatch { .. } => "Config Version Mismatch",
            Error::UnknownPreset(_) => "Unknown Preset",

            Error::OutOfOrderSample { .. } => "Out-of-Order Sample",
            Error::NonFiniteValue { .. } => "Non-Finite Sample",
            Error::InvalidWindowSize { .. } => "Invalid Window Size",

            Error::DegenerateWindow => "Degenerate Window",
            Error::Analysis(_) => "Analysis Error",

            Error::DatabaseNotFound { .. } => "History Database Not Found",
            Error::History(_) => "History Store Error",
            Error::UnknownSelector(_) => "Unknown Metric Selector",
            Error::NoData { .. } => "No Data",

            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for automation.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (e.g., selector, path).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::OutOfOrderSample {
                previous,
                attempted,
            } => {
                context.insert("previous".to_string(), serde_json::json!(previous));
                context.insert("attempted".to_string(), serde_json::json!(attempted));
            }
            Error::InvalidWindowSize { size } => {
                context.insert("window_size".to_string(), serde_json::json!(size));
            }
            Error::DatabaseNotFound { path } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::NoData { selector } => {
                context.insert("selector".to_string(), serde_json::json!(selector));
            }
            Error::ConfigVersionMismatch { expected, found } => {
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("found".to_string(), serde_json::json!(found));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
