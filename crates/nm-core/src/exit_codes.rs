//! Exit codes for the nm-core CLI.
//!
//! Scripts and schedulers read the outcome from the exit code alone:
//! - 0-2: the alert level of the analysis
//! - 10-19: user or environment errors
//! - 20-29: internal errors

use crate::trend::AlertLevel;

/// Exit codes for nm-core commands. Stable; scripts depend on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// No alert, or informational only.
    Clean = 0,
    Warning = 1,
    Critical = 2,

    /// Invalid arguments or configuration.
    ArgsError = 10,
    /// The history store has no samples for the selector.
    NoData = 11,
    DatabaseMissing = 12,

    /// Internal error (bug - please report)
    InternalError = 20,
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Exit code carrying an alert level.
    pub fn from_alert_level(level: AlertLevel) -> Self {
        match level {
            AlertLevel::None | AlertLevel::Info => ExitCode::Clean,
            AlertLevel::Warning => ExitCode::Warning,
            AlertLevel::Critical => ExitCode::Critical,
        }
    }

    /// Map a unified error onto its exit code.
    pub fn from_error(error: &nm_common::Error) -> Self {
        use nm_common::{Error, ErrorCategory};
        match error {
            Error::NoData { .. } => ExitCode::NoData,
            Error::DatabaseNotFound { .. } => ExitCode::DatabaseMissing,
            Error::UnknownSelector(_) => ExitCode::ArgsError,
            Error::Io(_) => ExitCode::IoError,
            _ => match error.category() {
                ErrorCategory::Config | ErrorCategory::Ingest => ExitCode::ArgsError,
                ErrorCategory::Io => ExitCode::IoError,
                ErrorCategory::Analysis | ErrorCategory::History => ExitCode::InternalError,
            },
        }
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Name used in JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Warning => "OK_WARNING",
            ExitCode::Critical => "OK_CRITICAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::NoData => "ERR_NO_DATA",
            ExitCode::DatabaseMissing => "ERR_DB_MISSING",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
