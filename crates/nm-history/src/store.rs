//! Read side of the history store: ordered metric series over a lookback window.

use chrono::{DateTime, Utc};
use nm_common::MetricKind;
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::record::memory_percent;
use crate::schema::{format_timestamp, parse_timestamp, TIMESTAMP_KEY};
use crate::selector::{MetricSelector, WorkstationMetric};
use crate::HistoryError;

/// Ceiling for percentage metrics.
pub const PERCENT_LIMIT: f64 = 100.0;

/// Load above this many times the CPU count is treated as saturation.
pub const LOAD_LIMIT_PER_CPU: f64 = 2.0;

/// One observation read back from the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Samples for one stream in ascending timestamp order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSeries {
    pub selector: String,
    pub kind: MetricKind,
    pub points: Vec<SeriesPoint>,
    /// Ceiling implied by the data itself (capacity, 100%, CPU-scaled load).
    pub implicit_limit: Option<f64>,
    /// Rows dropped for missing values or unparseable timestamps.
    pub skipped_rows: usize,
}

impl MetricSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }
}

/// Read-only view of a history database.
pub struct HistoryStore {
    conn: Connection,
    path: PathBuf,
}

impl HistoryStore {
    /// Open an existing database. Never creates the file.
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        if !path.is_file() {
            return Err(HistoryError::DatabaseNotFound {
                path: path.to_path_buf(),
            });
        }
        // WAL databases need the -shm file, which a strictly read-only
        // handle cannot always create; fall back to read-only on EACCES.
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .or_else(|_| Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY))?;
        debug!(path = %path.display(), "history database opened");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Samples for `selector` strictly newer than `since` (all history if None).
    pub fn series(
        &self,
        selector: &MetricSelector,
        since: Option<DateTime<Utc>>,
    ) -> Result<MetricSeries, HistoryError> {
        let (value_col, aux_col) = match selector {
            MetricSelector::Filesystem { .. } | MetricSelector::Storage { .. } => {
                ("used_bytes", "total_bytes")
            }
            MetricSelector::Workstation { metric, .. } => match metric {
                WorkstationMetric::Memory => ("memory_used_mb", "memory_total_mb"),
                WorkstationMetric::Disk => ("disk_usage_pct", "NULL"),
                WorkstationMetric::Load => ("load_avg_1m", "cpu_count"),
            },
        };
        let table = selector.table();
        let sql = format!(
            "SELECT timestamp, {value}, {aux} FROM {table} \
             WHERE {key} = ?1 AND {ts} > ?2 \
             ORDER BY {ts} ASC, id ASC",
            ts = TIMESTAMP_KEY,
            value = value_col,
            aux = aux_col,
            table = table.as_str(),
            key = table.key_column(),
        );
        // Empty string sorts before every stored timestamp.
        let since_text = since.map(format_timestamp).unwrap_or_default();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![selector.key(), since_text], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })?;

        let mut points = Vec::new();
        let mut skipped_rows = 0;
        let mut latest_aux: Option<f64> = None;

        for row in rows {
            let (ts_text, value, aux) = row?;
            let timestamp = match parse_timestamp(&ts_text) {
                Ok(ts) => ts,
                Err(e) => {
                    warn!(selector = %selector, error = %e, "skipping history row");
                    skipped_rows += 1;
                    continue;
                }
            };
            if aux.is_some() {
                latest_aux = aux;
            }
            let value = match selector {
                MetricSelector::Workstation {
                    metric: WorkstationMetric::Memory,
                    ..
                } => match (value, aux) {
                    (Some(used), Some(total)) => memory_percent(total as i64, used as i64),
                    _ => None,
                },
                _ => value,
            };
            match value {
                Some(v) if v.is_finite() => points.push(SeriesPoint {
                    timestamp,
                    value: v,
                }),
                _ => skipped_rows += 1,
            }
        }

        let implicit_limit = implicit_limit(selector, latest_aux);
        debug!(
            selector = %selector,
            points = points.len(),
            skipped = skipped_rows,
            "history series loaded"
        );

        Ok(MetricSeries {
            selector: selector.to_string(),
            kind: selector.kind(),
            points,
            implicit_limit,
            skipped_rows,
        })
    }
}

/// Ceiling implied by the stream when the caller gives no explicit limit.
fn implicit_limit(selector: &MetricSelector, latest_aux: Option<f64>) -> Option<f64> {
    match selector {
        MetricSelector::Filesystem { .. } | MetricSelector::Storage { .. } => {
            latest_aux.filter(|total| *total > 0.0)
        }
        MetricSelector::Workstation { metric, .. } => match metric {
            WorkstationMetric::Memory | WorkstationMetric::Disk => Some(PERCENT_LIMIT),
            WorkstationMetric::Load => {
                let cpus = latest_aux.unwrap_or(1.0).max(1.0);
                Some(LOAD_LIMIT_PER_CPU * cpus)
            }
        },
    }
}
