//! SQLite table definitions for the collector history tables.
//!
//! Tables defined (the columns the trend engine reads):
//! - `filesystems`: per-mount capacity samples
//! - `workstation_state`: per-host load, memory and disk samples
//! - `storage_state`: per-server capacity samples
//!
//! Timestamps are stored as ISO-8601 text in UTC without an offset, the form
//! the collectors write. Rows from SQLite's `datetime()` use a space instead
//! of `T`, so queries compare through [`TIMESTAMP_KEY`] to order both forms
//! chronologically.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Connection;

use crate::HistoryError;

/// Storage format for timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// SQL expression that orders both stored timestamp forms chronologically.
pub const TIMESTAMP_KEY: &str = "replace(timestamp, ' ', 'T')";

/// Naive formats accepted when reading rows written by other tools.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// History tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableName {
    Filesystems,
    WorkstationState,
    StorageState,
}

impl TableName {
    pub const ALL: &'static [TableName] = &[
        TableName::Filesystems,
        TableName::WorkstationState,
        TableName::StorageState,
    ];

    /// SQL table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Filesystems => "filesystems",
            TableName::WorkstationState => "workstation_state",
            TableName::StorageState => "storage_state",
        }
    }

    /// Column naming the stream within the table.
    pub fn key_column(&self) -> &'static str {
        match self {
            TableName::Filesystems => "path",
            TableName::WorkstationState | TableName::StorageState => "hostname",
        }
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS filesystems (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    path TEXT NOT NULL,
    total_bytes INTEGER,
    used_bytes INTEGER,
    available_bytes INTEGER,
    used_percent REAL
);
CREATE INDEX IF NOT EXISTS idx_fs_path_time ON filesystems(path, timestamp);

CREATE TABLE IF NOT EXISTS workstation_state (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    hostname TEXT NOT NULL,
    load_avg_1m REAL,
    cpu_count INTEGER,
    memory_total_mb INTEGER,
    memory_used_mb INTEGER,
    disk_usage_pct REAL
);
CREATE INDEX IF NOT EXISTS idx_ws_host_time ON workstation_state(hostname, timestamp);

CREATE TABLE IF NOT EXISTS storage_state (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    hostname TEXT NOT NULL,
    total_bytes INTEGER,
    used_bytes INTEGER,
    usage_pct REAL
);
CREATE INDEX IF NOT EXISTS idx_storage_host_time ON storage_state(hostname, timestamp);
"#;

/// Create all history tables and indexes if they do not exist.
pub fn ensure_schema(conn: &Connection) -> Result<(), HistoryError> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Format a timestamp for storage.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Offsets are honored; naive values are UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, HistoryError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| HistoryError::InvalidTimestamp {
            value: value.to_string(),
        })
}
