//! Transactional history writer.
//!
//! Collectors append one batch per collection cycle; each batch is a single
//! transaction, so a reader never sees half a cycle.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::record::{FilesystemRecord, StorageRecord, WorkstationRecord};
use crate::schema::{ensure_schema, format_timestamp, TableName, TIMESTAMP_KEY};
use crate::HistoryError;

/// Writer over a history database; creates the file and schema on open.
pub struct HistoryWriter {
    conn: Connection,
    path: PathBuf,
}

impl HistoryWriter {
    /// Open or create the database at `path`.
    pub fn create(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        ensure_schema(&conn)?;
        debug!(path = %path.display(), "history database opened for writing");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append filesystem samples in one transaction.
    pub fn append_filesystems(&self, records: &[FilesystemRecord]) -> Result<usize, HistoryError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO filesystems (timestamp, path, total_bytes, used_bytes, available_bytes, used_percent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for r in records {
                stmt.execute(params![
                    format_timestamp(r.timestamp),
                    &r.path,
                    r.total_bytes,
                    r.used_bytes,
                    r.available_bytes,
                    r.used_percent
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Append workstation samples in one transaction.
    pub fn append_workstations(&self, records: &[WorkstationRecord]) -> Result<usize, HistoryError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO workstation_state (timestamp, hostname, load_avg_1m, cpu_count, memory_total_mb, memory_used_mb, disk_usage_pct)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for r in records {
                stmt.execute(params![
                    format_timestamp(r.timestamp),
                    &r.hostname,
                    r.load_avg_1m,
                    r.cpu_count,
                    r.memory_total_mb,
                    r.memory_used_mb,
                    r.disk_usage_pct
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Append storage server samples in one transaction.
    pub fn append_storage(&self, records: &[StorageRecord]) -> Result<usize, HistoryError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO storage_state (timestamp, hostname, total_bytes, used_bytes, usage_pct)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for r in records {
                stmt.execute(params![
                    format_timestamp(r.timestamp),
                    &r.hostname,
                    r.total_bytes,
                    r.used_bytes,
                    r.usage_pct
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Delete rows older than `cutoff` from every table. Returns rows removed.
    pub fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, HistoryError> {
        let cutoff_text = format_timestamp(cutoff);
        let tx = self.conn.unchecked_transaction()?;
        let mut removed = 0;
        for table in TableName::ALL {
            let sql = format!("DELETE FROM {} WHERE {} < ?1", table.as_str(), TIMESTAMP_KEY);
            let n = tx.execute(&sql, params![cutoff_text])?;
            if n > 0 {
                debug!(table = %table, rows = n, "pruned history rows");
            }
            removed += n;
        }
        tx.commit()?;
        info!(cutoff = %cutoff_text, rows = removed, "history retention prune complete");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    #[test]
    fn test_create_makes_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("nomad.db");
        let writer = HistoryWriter::create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(writer.path(), path.as_path());
    }

    #[test]
    fn test_prune_before_counts_rows() {
        let temp = TempDir::new().unwrap();
        let writer = HistoryWriter::create(&temp.path().join("h.db")).unwrap();
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let fs: Vec<_> = (0..5)
            .map(|i| FilesystemRecord::new(t0 + Duration::days(i), "/scratch", 1000, 100 + i))
            .collect();
        let st: Vec<_> = (0..3)
            .map(|i| StorageRecord::new(t0 + Duration::days(i), "nas01", 1000, 10))
            .collect();
        writer.append_filesystems(&fs).unwrap();
        writer.append_storage(&st).unwrap();

        let removed = writer.prune_before(t0 + Duration::days(2)).unwrap();
        assert_eq!(removed, 4); // 2 filesystem + 2 storage
        assert_eq!(writer.prune_before(t0 + Duration::days(2)).unwrap(), 0);
    }

    #[test]
    fn test_prune_keeps_space_separated_rows_after_cutoff() {
        let temp = TempDir::new().unwrap();
        let writer = HistoryWriter::create(&temp.path().join("h.db")).unwrap();
        for ts in ["2026-01-02 00:30:00", "2026-01-02 12:00:00", "2026-01-01 23:00:00"] {
            writer
                .conn
                .execute(
                    "INSERT INTO storage_state (timestamp, hostname, total_bytes, used_bytes) VALUES (?1, 'nas01', 10, 1)",
                    params![ts],
                )
                .unwrap();
        }
        let cutoff = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(writer.prune_before(cutoff).unwrap(), 1);
    }
}
