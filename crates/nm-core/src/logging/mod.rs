//! Structured logging for nm-core.
//!
//! Two output modes share one filter:
//! - human-readable lines for interactive use
//! - JSONL for cron jobs and log shippers
//!
//! stdout is reserved for report payloads; all log output goes to stderr.
//! Events carry a run ID and host ID so lines from concurrent runs on a
//! shared login node can be told apart.

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` directives, when present and valid, replace the level from
/// `config`. Calling this twice is harmless; the second call is ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "nm_core={level},nm_history={level},nm_config={level}",
            level = config.level
        ))
    });

    let result = match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(JsonlLayer::stderr())
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// Unique ID for this invocation, e.g. `run-1b4e28ba2fa1`.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}

/// Stable identifier for this machine.
///
/// Prefers `/etc/machine-id`, then a hash of `HOSTNAME`, then a random ID.
pub fn get_host_id() -> String {
    if let Ok(id) = std::fs::read_to_string("/etc/machine-id") {
        let id = id.trim();
        if id.len() >= 8 && id.is_ascii() {
            return format!("host-{}", &id[..8]);
        }
    }
    if let Ok(hostname) = std::env::var("HOSTNAME") {
        return format!("host-{}", &hash_string(&hostname)[..8]);
    }
    format!("host-{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
}

fn hash_string(s: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Emit a tracing event carrying the correlation fields of a [`LogContext`].
///
/// ```ignore
/// log_event!(ctx, INFO, event_names::ALERT_RAISED, Stage::Alert, "alert raised",
///     level = "warning");
/// ```
#[macro_export]
macro_rules! log_event {
    (@emit $mac:ident, $ctx:expr, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::$mac!(
            target: $event,
            run_id = %$ctx.run_id,
            host_id = %$ctx.host_id,
            stage = %$stage,
            stream = $ctx.stream.as_deref().unwrap_or(""),
            $($key = $val,)*
            "{}", $msg
        )
    };
    ($ctx:expr, INFO, $($rest:tt)*) => { $crate::log_event!(@emit info, $ctx, $($rest)*) };
    ($ctx:expr, DEBUG, $($rest:tt)*) => { $crate::log_event!(@emit debug, $ctx, $($rest)*) };
    ($ctx:expr, WARN, $($rest:tt)*) => { $crate::log_event!(@emit warn, $ctx, $($rest)*) };
    ($ctx:expr, ERROR, $($rest:tt)*) => { $crate::log_event!(@emit error, $ctx, $($rest)*) };
}
