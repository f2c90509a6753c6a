//! Metric selectors: string names for one stream in the history tables.
//!
//! Grammar:
//! - `fs:<path>` filesystem bytes used on a mount
//! - `ws:<host>:memory|disk|load` workstation memory %, disk %, or 1-minute load
//! - `storage:<host>` storage server bytes used
//!
//! A bare absolute path is accepted as `fs:<path>`.

use nm_common::{MetricKind, StreamId};
use std::fmt;
use std::str::FromStr;

use crate::schema::TableName;
use crate::HistoryError;

/// Workstation metric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkstationMetric {
    Memory,
    Disk,
    Load,
}

impl WorkstationMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkstationMetric::Memory => "memory",
            WorkstationMetric::Disk => "disk",
            WorkstationMetric::Load => "load",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "memory" | "mem" => Some(WorkstationMetric::Memory),
            "disk" => Some(WorkstationMetric::Disk),
            "load" => Some(WorkstationMetric::Load),
            _ => None,
        }
    }
}

/// One metric stream in the history store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetricSelector {
    Filesystem { path: String },
    Workstation { host: String, metric: WorkstationMetric },
    Storage { host: String },
}

impl MetricSelector {
    pub fn filesystem(path: impl Into<String>) -> Self {
        MetricSelector::Filesystem { path: path.into() }
    }

    pub fn table(&self) -> TableName {
        match self {
            MetricSelector::Filesystem { .. } => TableName::Filesystems,
            MetricSelector::Workstation { .. } => TableName::WorkstationState,
            MetricSelector::Storage { .. } => TableName::StorageState,
        }
    }

    /// Value of the table's key column for this stream.
    pub fn key(&self) -> &str {
        match self {
            MetricSelector::Filesystem { path } => path,
            MetricSelector::Workstation { host, .. } | MetricSelector::Storage { host } => host,
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricSelector::Filesystem { .. } => MetricKind::FilesystemBytes,
            MetricSelector::Storage { .. } => MetricKind::StorageBytes,
            MetricSelector::Workstation { metric, .. } => match metric {
                WorkstationMetric::Memory => MetricKind::MemoryPercent,
                WorkstationMetric::Disk => MetricKind::DiskPercent,
                WorkstationMetric::Load => MetricKind::LoadAverage,
            },
        }
    }

    pub fn stream_id(&self) -> StreamId {
        StreamId(self.to_string())
    }
}

impl fmt::Display for MetricSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricSelector::Filesystem { path } => write!(f, "fs:{}", path),
            MetricSelector::Workstation { host, metric } => {
                write!(f, "ws:{}:{}", host, metric.as_str())
            }
            MetricSelector::Storage { host } => write!(f, "storage:{}", host),
        }
    }
}

impl FromStr for MetricSelector {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || HistoryError::UnknownSelector(s.to_string());
        let s = s.trim();

        if s.starts_with('/') {
            return Ok(MetricSelector::filesystem(s));
        }

        let (prefix, rest) = s.split_once(':').ok_or_else(unknown)?;
        match prefix {
            "fs" if !rest.is_empty() => Ok(MetricSelector::filesystem(rest)),
            "storage" if !rest.is_empty() && !rest.contains(':') => Ok(MetricSelector::Storage {
                host: rest.to_string(),
            }),
            "ws" => {
                let (host, metric) = rest.rsplit_once(':').ok_or_else(unknown)?;
                let metric = WorkstationMetric::parse(metric).ok_or_else(unknown)?;
                if host.is_empty() {
                    return Err(unknown());
                }
                Ok(MetricSelector::Workstation {
                    host: host.to_string(),
                    metric,
                })
            }
            _ => Err(unknown()),
        }
    }
}
