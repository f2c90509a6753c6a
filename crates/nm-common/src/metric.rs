//! Metric kinds tracked by the collectors and their units.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes per gigabyte as used in reports (decimal).
pub const BYTES_PER_GB: f64 = 1e9;

/// Kind of resource metric behind a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Bytes used on a mounted filesystem.
    FilesystemBytes,
    /// Bytes used on a storage server.
    StorageBytes,
    /// Workstation memory in use, percent.
    MemoryPercent,
    /// Workstation root disk in use, percent.
    DiskPercent,
    /// One-minute load average.
    LoadAverage,
    /// Caller-supplied series with no known unit.
    Generic,
}

impl MetricKind {
    /// Unit of raw sample values.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::FilesystemBytes | MetricKind::StorageBytes => "bytes",
            MetricKind::MemoryPercent | MetricKind::DiskPercent => "%",
            MetricKind::LoadAverage => "load",
            MetricKind::Generic => "",
        }
    }

    /// Unit used when displaying values to humans.
    pub fn display_unit(&self) -> &'static str {
        match self {
            MetricKind::FilesystemBytes | MetricKind::StorageBytes => "GB",
            other => other.unit(),
        }
    }

    /// Divisor converting raw values into `display_unit`.
    pub fn display_scale(&self) -> f64 {
        match self {
            MetricKind::FilesystemBytes | MetricKind::StorageBytes => BYTES_PER_GB,
            _ => 1.0,
        }
    }

    /// Convert a raw value for display.
    pub fn to_display(&self, raw: f64) -> f64 {
        raw / self.display_scale()
    }

    /// True for metrics bounded by a fixed 100% ceiling.
    pub fn is_percent(&self) -> bool {
        matches!(self, MetricKind::MemoryPercent | MetricKind::DiskPercent)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetricKind::FilesystemBytes => "filesystem_bytes",
            MetricKind::StorageBytes => "storage_bytes",
            MetricKind::MemoryPercent => "memory_percent",
            MetricKind::DiskPercent => "disk_percent",
            MetricKind::LoadAverage => "load_average",
            MetricKind::Generic => "generic",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_metrics_display_in_gb() {
        assert_eq!(MetricKind::FilesystemBytes.display_unit(), "GB");
        assert_eq!(MetricKind::StorageBytes.to_display(118e9), 118.0);
    }

    #[test]
    fn test_percent_metrics_unscaled() {
        assert!(MetricKind::MemoryPercent.is_percent());
        assert!(!MetricKind::LoadAverage.is_percent());
        assert_eq!(MetricKind::DiskPercent.to_display(42.5), 42.5);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&MetricKind::LoadAverage).unwrap();
        assert_eq!(json, r#""load_average""#);
        assert_eq!(MetricKind::LoadAverage.to_string(), "load_average");
    }
}
