//! Trend engine.
//!
//! A [`SampleWindow`] holds the recent history of one metric stream. On
//! demand the window is fitted ([`estimator`]), the fit is classified
//! ([`classifier`]) and extrapolated ([`forecaster`]), and the results are
//! folded into an alert level ([`alert`]). [`analysis::analyze_samples`] wires
//! the stages together and returns an immutable [`TrendAnalysis`].
//!
//! Everything here is synchronous, allocation-light computation over an
//! in-memory snapshot; no stage performs I/O.

pub mod alert;
pub mod analysis;
pub mod classifier;
pub mod estimator;
pub mod forecaster;
pub mod window;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use alert::AlertPolicy;
pub use analysis::{
    analyze_samples, AlertLevel, AnalysisStatus, TrendAnalysis, TrendKind, TrendSettings,
};
pub use classifier::TrendClassifier;
pub use estimator::{DerivativeEstimate, DerivativeEstimator};
pub use forecaster::Forecaster;
pub use window::{SampleWindow, SharedWindow};

/// One observation of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Sample { timestamp, value }
    }
}

/// Errors raised by the trend engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrendError {
    #[error("out-of-order sample: {attempted} is older than latest {previous}")]
    OutOfOrderSample {
        previous: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    #[error("non-finite sample value: {value}")]
    NonFiniteValue { value: f64 },

    #[error("degenerate window: retained timestamps do not span a usable interval")]
    DegenerateWindow,

    #[error("invalid window size {size}: must be at least 2")]
    InvalidWindowSize { size: usize },
}

impl From<TrendError> for nm_common::Error {
    fn from(err: TrendError) -> Self {
        match err {
            TrendError::OutOfOrderSample {
                previous,
                attempted,
            } => nm_common::Error::OutOfOrderSample {
                previous,
                attempted,
            },
            TrendError::NonFiniteValue { value } => nm_common::Error::NonFiniteValue { value },
            TrendError::DegenerateWindow => nm_common::Error::DegenerateWindow,
            TrendError::InvalidWindowSize { size } => nm_common::Error::InvalidWindowSize { size },
        }
    }
}
