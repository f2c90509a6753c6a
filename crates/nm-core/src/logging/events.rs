//! Event names, stages and correlation context for structured logging.
//!
//! Every event carries the run and host identifiers plus the pipeline
//! stage; events about one metric stream also carry its selector.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Pipeline stages of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading samples from the history store.
    Ingest,
    /// Fitting and classification.
    Analyze,
    Alert,
    Report,
    /// Periodic re-evaluation in `watch`.
    Sweep,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Ingest => "ingest",
            Stage::Analyze => "analyze",
            Stage::Alert => "alert",
            Stage::Report => "report",
            Stage::Sweep => "sweep",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event names, used as tracing targets.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const HISTORY_LOADED: &str = "history.loaded";
    pub const WINDOW_SAMPLE_REJECTED: &str = "window.sample_rejected";

    pub const ANALYZE_STARTED: &str = "analyze.started";
    pub const ANALYSIS_DEGRADED: &str = "analysis.degraded";
    pub const ANALYSIS_FINISHED: &str = "analysis.finished";

    pub const ALERT_RAISED: &str = "alert.raised";
    pub const SWEEP_TICK: &str = "sweep.tick";

    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation identifiers shared by every event of a run.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub host_id: String,
    pub stream: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            host_id: host_id.into(),
            stream: None,
        }
    }

    /// Context scoped to one metric stream.
    pub fn for_stream(&self, stream: impl Into<String>) -> Self {
        LogContext {
            stream: Some(stream.into()),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_for_stream() {
        let ctx = LogContext::new("run-abc", "host-xyz");
        let scoped = ctx.for_stream("ws:node7:memory");
        assert_eq!(scoped.run_id, "run-abc");
        assert_eq!(scoped.host_id, "host-xyz");
        assert_eq!(scoped.stream.as_deref(), Some("ws:node7:memory"));
        assert!(ctx.stream.is_none());
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
        assert_eq!(serde_json::to_string(&Level::Debug).unwrap(), "\"debug\"");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Ingest.to_string(), "ingest");
        assert_eq!(serde_json::to_string(&Stage::Sweep).unwrap(), "\"sweep\"");
    }
}
