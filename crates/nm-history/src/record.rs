//! Row types for the history tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One `filesystems` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesystemRecord {
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub total_bytes: i64,
    pub used_bytes: i64,
    pub available_bytes: i64,
    pub used_percent: f64,
}

impl FilesystemRecord {
    /// Build a record, deriving available bytes and percent from total/used.
    pub fn new(timestamp: DateTime<Utc>, path: impl Into<String>, total_bytes: i64, used_bytes: i64) -> Self {
        let used_percent = if total_bytes > 0 {
            used_bytes as f64 / total_bytes as f64 * 100.0
        } else {
            0.0
        };
        FilesystemRecord {
            timestamp,
            path: path.into(),
            total_bytes,
            used_bytes,
            available_bytes: (total_bytes - used_bytes).max(0),
            used_percent,
        }
    }
}

/// One `workstation_state` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkstationRecord {
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    pub load_avg_1m: f64,
    pub cpu_count: i64,
    pub memory_total_mb: i64,
    pub memory_used_mb: i64,
    pub disk_usage_pct: f64,
}

impl WorkstationRecord {
    /// Memory in use as a percentage, or None when the total is unknown.
    pub fn memory_percent(&self) -> Option<f64> {
        memory_percent(self.memory_total_mb, self.memory_used_mb)
    }
}

/// Memory percentage from MB totals; None when `total_mb` is not positive.
pub fn memory_percent(total_mb: i64, used_mb: i64) -> Option<f64> {
    if total_mb > 0 {
        Some(used_mb as f64 / total_mb as f64 * 100.0)
    } else {
        None
    }
}

/// One `storage_state` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub timestamp: DateTime<Utc>,
    pub hostname: String,
    pub total_bytes: i64,
    pub used_bytes: i64,
    pub usage_pct: f64,
}

impl StorageRecord {
    pub fn new(timestamp: DateTime<Utc>, hostname: impl Into<String>, total_bytes: i64, used_bytes: i64) -> Self {
        let usage_pct = if total_bytes > 0 {
            used_bytes as f64 / total_bytes as f64 * 100.0
        } else {
            0.0
        };
        StorageRecord {
            timestamp,
            hostname: hostname.into(),
            total_bytes,
            used_bytes,
            usage_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filesystem_derived_fields() {
        let r = FilesystemRecord::new(Utc::now(), "/scratch", 200, 50);
        assert_eq!(r.available_bytes, 150);
        assert_eq!(r.used_percent, 25.0);
    }

    #[test]
    fn test_memory_percent_skips_zero_total() {
        assert_eq!(memory_percent(0, 10), None);
        assert_eq!(memory_percent(-1, 10), None);
        assert_eq!(memory_percent(2048, 512), Some(25.0));
    }
}
