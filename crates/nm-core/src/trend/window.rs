//! Capacity-bounded sample buffer for one metric stream.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::analysis::{analyze_samples, TrendAnalysis, TrendSettings};
use super::{Sample, TrendError};

/// Smallest capacity that can hold a slope.
pub const MIN_WINDOW_SIZE: usize = 2;

/// Ordered, FIFO-evicting window of samples.
///
/// Timestamps are non-decreasing in insertion order. Equal timestamps are
/// accepted; older ones are rejected.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    settings: TrendSettings,
}

impl SampleWindow {
    /// Create an empty window using `settings.window_size` as capacity.
    pub fn new(settings: TrendSettings) -> Result<Self, TrendError> {
        if settings.window_size < MIN_WINDOW_SIZE {
            return Err(TrendError::InvalidWindowSize {
                size: settings.window_size,
            });
        }
        Ok(Self::clamped(settings))
    }

    /// Create an empty window, raising a too-small capacity to the minimum
    /// instead of rejecting it.
    pub fn clamped(settings: TrendSettings) -> Self {
        let window_size = settings.window_size.max(MIN_WINDOW_SIZE);
        SampleWindow {
            samples: VecDeque::with_capacity(window_size),
            settings: TrendSettings {
                window_size,
                ..settings
            },
        }
    }

    /// Create a window with default analysis settings and the given capacity.
    pub fn with_capacity(window_size: usize) -> Result<Self, TrendError> {
        Self::new(TrendSettings {
            window_size,
            ..TrendSettings::default()
        })
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn append(&mut self, sample: Sample) -> Result<(), TrendError> {
        if !sample.value.is_finite() {
            return Err(TrendError::NonFiniteValue {
                value: sample.value,
            });
        }
        if let Some(last) = self.samples.back() {
            if sample.timestamp < last.timestamp {
                return Err(TrendError::OutOfOrderSample {
                    previous: last.timestamp,
                    attempted: sample.timestamp,
                });
            }
        }
        if self.samples.len() == self.settings.window_size {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        Ok(())
    }

    /// Convenience form of [`append`](Self::append).
    pub fn push(&mut self, timestamp: DateTime<Utc>, value: f64) -> Result<(), TrendError> {
        self.append(Sample::new(timestamp, value))
    }

    /// Copy of the retained samples, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// True once enough samples are held for a classification.
    pub fn is_sufficient(&self) -> bool {
        self.samples.len() >= self.settings.min_points_for_classification
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.settings.window_size
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn settings(&self) -> &TrendSettings {
        &self.settings
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Analyze the current contents against an optional ceiling.
    pub fn analyze(&self, limit: Option<f64>) -> TrendAnalysis {
        let (front, back) = self.samples.as_slices();
        if back.is_empty() {
            analyze_samples(front, &self.settings, limit)
        } else {
            analyze_samples(&self.snapshot(), &self.settings, limit)
        }
    }
}

/// A window shared between a producer and readers.
///
/// One lock guards both `append` and `snapshot`; analysis runs on a copy
/// taken under the lock so readers never block the producer for a fit.
#[derive(Debug, Clone)]
pub struct SharedWindow {
    inner: Arc<Mutex<SampleWindow>>,
}

impl SharedWindow {
    pub fn new(window: SampleWindow) -> Self {
        SharedWindow {
            inner: Arc::new(Mutex::new(window)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SampleWindow> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn append(&self, sample: Sample) -> Result<(), TrendError> {
        self.lock().append(sample)
    }

    pub fn snapshot(&self) -> Vec<Sample> {
        self.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.lock().latest().map(|s| s.timestamp)
    }

    pub fn analyze(&self, limit: Option<f64>) -> TrendAnalysis {
        let (samples, settings) = {
            let guard = self.lock();
            (guard.snapshot(), guard.settings)
        };
        analyze_samples(&samples, &settings, limit)
    }
}
