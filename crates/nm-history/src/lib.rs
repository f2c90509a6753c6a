//! NOMAD telemetry history store.
//!
//! This crate provides:
//! - SQLite table definitions for the collector tables the trend engine reads
//! - A transactional writer used by collectors and tests
//! - A read-only store returning ordered metric series for a lookback window
//! - Metric selectors naming one stream inside those tables

pub mod record;
pub mod schema;
pub mod selector;
pub mod store;
pub mod writer;

use std::path::PathBuf;
use thiserror::Error;

pub use record::{FilesystemRecord, StorageRecord, WorkstationRecord};
pub use schema::TableName;
pub use selector::{MetricSelector, WorkstationMetric};
pub use store::{HistoryStore, MetricSeries, SeriesPoint};
pub use writer::HistoryWriter;

/// Default database file name under the data directory.
pub const DEFAULT_DB_NAME: &str = "nomad.db";

/// Errors from the history store.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("history database not found: {}", path.display())]
    DatabaseNotFound { path: PathBuf },

    #[error("unparseable timestamp '{value}'")]
    InvalidTimestamp { value: String },

    #[error("unknown metric selector '{0}'")]
    UnknownSelector(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<HistoryError> for nm_common::Error {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::DatabaseNotFound { path } => nm_common::Error::DatabaseNotFound {
                path: path.display().to_string(),
            },
            HistoryError::UnknownSelector(s) => nm_common::Error::UnknownSelector(s),
            HistoryError::Io(e) => nm_common::Error::Io(e),
            other => nm_common::Error::History(other.to_string()),
        }
    }
}

/// Default history database location: `<data dir>/nomad/nomad.db`.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("nomad").join(DEFAULT_DB_NAME))
}
