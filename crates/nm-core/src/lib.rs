//! NOMAD trend engine.
//!
//! This library provides:
//! - Windowed derivative estimation and trend classification for
//!   resource telemetry (disk, memory, load)
//! - Time-to-limit forecasting and alert levels
//! - Trend adapters for diagnostic reports
//! - A timer-driven alert sweep over many streams
//! - Configuration loading, logging, exit codes and schema export for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod diag;
pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod schema;
pub mod sweep;
pub mod trend;

pub use trend::{
    AlertLevel, Sample, SampleWindow, SharedWindow, TrendAnalysis, TrendError, TrendKind,
    TrendSettings,
};
