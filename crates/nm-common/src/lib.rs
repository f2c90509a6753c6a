//! NOMAD trend analysis common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the nm-* crates:
//! - Metric stream identity
//! - Metric kinds and their units
//! - Common error types with stable codes
//! - Output formats

pub mod error;
pub mod id;
pub mod metric;
pub mod output;

pub use error::{
    format_error_human, Error, ErrorCategory, Result, StructuredError, SuggestedAction,
};
pub use id::StreamId;
pub use metric::MetricKind;
pub use output::OutputFormat;

/// Version of the JSON output schema.
pub const SCHEMA_VERSION: &str = "1.0.0";
