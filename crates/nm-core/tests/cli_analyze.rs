//! End-to-end tests for `nm-core analyze` against real SQLite history.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use chrono::{DateTime, Duration, Utc};
use nm_history::{FilesystemRecord, HistoryWriter, WorkstationRecord};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const GB: i64 = 1_000_000_000;

fn nm_core() -> Command {
    let mut cmd = cargo_bin_cmd!("nm-core");
    cmd.env_remove("NM_DB")
        .env_remove("NM_LOG")
        .env_remove("RUST_LOG")
        .args(["--preset", "standard"]);
    cmd
}

/// Daily samples ending an hour ago, oldest first.
fn daily(n: i64) -> Vec<DateTime<Utc>> {
    let end = Utc::now() - Duration::hours(1);
    (0..n).map(|i| end - Duration::days(n - 1 - i)).collect()
}

/// `/scratch` grows 2 GB/day from 100 GB to 118 GB on a filesystem of `total_gb`.
fn scratch_db(dir: &TempDir, total_gb: i64) -> PathBuf {
    let path = dir.path().join("nomad.db");
    let writer = HistoryWriter::create(&path).unwrap();
    let records: Vec<_> = daily(10)
        .into_iter()
        .enumerate()
        .map(|(i, ts)| {
            FilesystemRecord::new(ts, "/scratch", total_gb * GB, (100 + 2 * i as i64) * GB)
        })
        .collect();
    writer.append_filesystems(&records).unwrap();
    path
}

fn db_arg(path: &Path) -> String {
    path.display().to_string()
}

// ============================================================================
// Alert levels and exit codes
// ============================================================================

mod exit_codes {
    use super::*;

    #[test]
    fn distant_limit_is_clean() {
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 200);
        nm_core()
            .args(["analyze", "--path", "/scratch", "--hours", "720", "--db", &db_arg(&db)])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("## Analysis: fs:/scratch"))
            .stdout(predicate::str::contains("| Trend | Increasing (linear) |"))
            .stdout(predicate::str::contains("| Days until full | 41.0 |"))
            .stdout(predicate::str::contains("**INFO**"));
    }

    #[test]
    fn near_limit_is_critical() {
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 200);
        nm_core()
            .args([
                "analyze", "--path", "/scratch", "--hours", "720", "--limit-gb", "130", "--db",
                &db_arg(&db),
            ])
            .assert()
            .code(2)
            .stdout(predicate::str::contains("**CRITICAL**"));
    }

    #[test]
    fn month_out_limit_is_warning() {
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 150);
        nm_core()
            .args(["analyze", "--metric", "fs:/scratch", "--hours", "720", "--db", &db_arg(&db)])
            .assert()
            .code(1);
    }

    #[test]
    fn exitcode_format_prints_nothing() {
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 200);
        nm_core()
            .args([
                "-f", "exitcode", "analyze", "--path", "/scratch", "--hours", "720", "--limit-gb",
                "130", "--db", &db_arg(&db),
            ])
            .assert()
            .code(2)
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn missing_database_exits_12() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.db");
        nm_core()
            .args(["analyze", "--path", "/scratch", "--db", &db_arg(&missing)])
            .assert()
            .code(12)
            .stderr(predicate::str::contains("absent.db"))
            .stderr(predicate::str::contains("Reason:"))
            .stderr(predicate::str::contains("Fix:"));
        assert!(!missing.exists());
    }

    #[test]
    fn empty_series_exits_11() {
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 200);
        nm_core()
            .args(["analyze", "--path", "/home", "--db", &db_arg(&db)])
            .assert()
            .code(11);
    }

    #[test]
    fn lookback_excludes_old_rows() {
        // Every row is at least an hour old, so a zero-hour lookback sees none.
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 200);
        nm_core()
            .args(["analyze", "--path", "/scratch", "--hours", "0", "--db", &db_arg(&db)])
            .assert()
            .code(11);
    }

    #[test]
    fn bad_selector_exits_10() {
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 200);
        nm_core()
            .args(["analyze", "--metric", "gpu:node1", "--db", &db_arg(&db)])
            .assert()
            .code(10);
    }

    #[test]
    fn unknown_preset_exits_10() {
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 200);
        cargo_bin_cmd!("nm-core")
            .args(["--preset", "turbo", "analyze", "--path", "/scratch", "--db", &db_arg(&db)])
            .assert()
            .code(10);
    }

    #[test]
    fn target_is_required() {
        nm_core().args(["analyze"]).assert().code(2).stderr(predicate::str::contains("required"));
    }

    #[test]
    fn limit_flags_conflict() {
        nm_core()
            .args(["analyze", "--path", "/x", "--limit", "1", "--limit-gb", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot be used with"));
    }
}

// ============================================================================
// Output formats
// ============================================================================

mod formats {
    use super::*;

    #[test]
    fn json_report_carries_analysis_and_config() {
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 200);
        let output = nm_core()
            .args([
                "-f", "json", "analyze", "--path", "/scratch", "--hours", "720", "--db",
                &db_arg(&db),
            ])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(0));

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["selector"], "fs:/scratch");
        assert_eq!(json["kind"], "filesystem_bytes");
        assert_eq!(json["lookback_hours"], 720);
        assert!(json["run_id"].as_str().unwrap().starts_with("run-"));

        let analysis = &json["analysis"];
        assert_eq!(analysis["n_points"], 10);
        assert_eq!(analysis["trend"], "increasing_linear");
        assert_eq!(analysis["alert_level"], "info");
        assert_eq!(analysis["limit"].as_f64().unwrap(), 200e9);
        let rate = analysis["first_derivative"].as_f64().unwrap();
        assert!((rate - 2e9).abs() < 1e3, "rate = {}", rate);
        let eta = analysis["days_until_limit"].as_f64().unwrap();
        assert!((eta - 41.0).abs() < 1e-3, "eta = {}", eta);

        assert_eq!(json["config"]["source"], "preset");
    }

    #[test]
    fn summary_is_one_line() {
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 200);
        nm_core()
            .args([
                "-f", "summary", "analyze", "--path", "/scratch", "--hours", "720", "--db",
                &db_arg(&db),
            ])
            .assert()
            .code(0)
            .stdout(predicate::str::starts_with(
                "[INFO] fs:/scratch: 118.00 GB increasing_linear, full in 41.0d",
            ));
    }

    #[test]
    fn metrics_are_key_value_pairs() {
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 200);
        nm_core()
            .args([
                "-f", "metrics", "analyze", "--path", "/scratch", "--hours", "720", "--db",
                &db_arg(&db),
            ])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("selector=fs:/scratch"))
            .stdout(predicate::str::contains("trend=increasing_linear"))
            .stdout(predicate::str::contains("alert_level=info"));
    }

    #[test]
    fn json_errors_go_to_stdout() {
        let dir = TempDir::new().unwrap();
        let db = scratch_db(&dir, 200);
        let output = nm_core()
            .args(["-f", "json", "analyze", "--path", "/home", "--db", &db_arg(&db)])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(11));
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert!(json["code"].is_number());
        assert_eq!(json["context"]["exit_code"], "ERR_NO_DATA");
    }

    #[test]
    fn short_history_reports_unknown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nomad.db");
        let writer = HistoryWriter::create(&path).unwrap();
        let records: Vec<_> = daily(2)
            .into_iter()
            .map(|ts| FilesystemRecord::new(ts, "/scratch", 200 * GB, 100 * GB))
            .collect();
        writer.append_filesystems(&records).unwrap();

        nm_core()
            .args([
                "-f", "summary", "analyze", "--path", "/scratch", "--hours", "720", "--db",
                &db_arg(&path),
            ])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("[NONE]"))
            .stdout(predicate::str::contains("unknown"));
    }

    #[test]
    fn full_filesystem_with_short_history_is_critical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nomad.db");
        let writer = HistoryWriter::create(&path).unwrap();
        let records: Vec<_> = daily(2)
            .into_iter()
            .map(|ts| FilesystemRecord::new(ts, "/scratch", 200 * GB, 200 * GB))
            .collect();
        writer.append_filesystems(&records).unwrap();

        nm_core()
            .args([
                "-f", "summary", "analyze", "--path", "/scratch", "--hours", "720", "--db",
                &db_arg(&path),
            ])
            .assert()
            .code(2)
            .stdout(predicate::str::starts_with("[CRITICAL]"))
            .stdout(predicate::str::contains("unknown"));
    }
}

// ============================================================================
// Workstation streams
// ============================================================================

mod workstation {
    use super::*;

    #[test]
    fn memory_percent_uses_hundred_as_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nomad.db");
        let writer = HistoryWriter::create(&path).unwrap();
        // 60% → 96% over ten days at 4%/day; crosses 100% a day later.
        let records: Vec<_> = daily(10)
            .into_iter()
            .enumerate()
            .map(|(i, ts)| WorkstationRecord {
                timestamp: ts,
                hostname: "ws01".to_string(),
                load_avg_1m: 1.0,
                cpu_count: 8,
                memory_total_mb: 1000,
                memory_used_mb: 600 + 40 * i as i64,
                disk_usage_pct: 40.0,
            })
            .collect();
        writer.append_workstations(&records).unwrap();

        let output = nm_core()
            .args([
                "-f", "json", "analyze", "--metric", "ws:ws01:memory", "--hours", "720", "--db",
                &db_arg(&path),
            ])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(2));
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["analysis"]["limit"].as_f64().unwrap(), 100.0);
        let eta = json["analysis"]["days_until_limit"].as_f64().unwrap();
        assert!((eta - 1.0).abs() < 1e-3, "eta = {}", eta);
    }
}
