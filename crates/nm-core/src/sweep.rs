//! Periodic re-analysis of tracked streams.
//!
//! [`WindowRegistry`] owns one [`SharedWindow`] per stream and is passed by
//! reference to whoever feeds or reads it. [`AlertSweep`] drives it from the
//! history store: each tick replays rows newer than the stream's cursor,
//! re-runs the analysis and reports streams whose alert level moved.

use chrono::{DateTime, Utc};
use nm_common::StreamId;
use nm_history::{HistoryStore, MetricSelector};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::trend::{
    AlertLevel, Sample, SampleWindow, SharedWindow, TrendAnalysis, TrendError, TrendSettings,
};

/// Windows keyed by stream.
#[derive(Debug)]
pub struct WindowRegistry {
    settings: TrendSettings,
    windows: BTreeMap<StreamId, SharedWindow>,
}

impl WindowRegistry {
    pub fn new(settings: TrendSettings) -> Result<Self, TrendError> {
        // Validate once; every window shares these settings.
        SampleWindow::new(settings)?;
        Ok(WindowRegistry {
            settings,
            windows: BTreeMap::new(),
        })
    }

    /// Window for `stream`, created empty on first use.
    pub fn get_or_create(&mut self, stream: &StreamId) -> SharedWindow {
        let settings = self.settings;
        self.windows
            .entry(stream.clone())
            .or_insert_with(|| SharedWindow::new(SampleWindow::clamped(settings)))
            .clone()
    }

    pub fn get(&self, stream: &StreamId) -> Option<&SharedWindow> {
        self.windows.get(stream)
    }

    pub fn settings(&self) -> &TrendSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn stream_ids(&self) -> impl Iterator<Item = &StreamId> {
        self.windows.keys()
    }
}

/// Per-stream outcome of one tick.
#[derive(Debug, Clone, Serialize)]
pub struct StreamStatus {
    pub stream: StreamId,
    /// Rows appended this tick.
    pub new_samples: usize,
    /// Rows the window refused this tick.
    pub rejected_samples: usize,
    pub analysis: TrendAnalysis,
}

/// A stream whose alert level differs from the previous tick.
#[derive(Debug, Clone, Serialize)]
pub struct AlertChange {
    pub stream: StreamId,
    /// None on the first tick for the stream.
    pub previous: Option<AlertLevel>,
    pub current: AlertLevel,
    pub days_until_limit: Option<f64>,
}

impl AlertChange {
    pub fn is_escalation(&self) -> bool {
        self.current > self.previous.unwrap_or_default()
    }
}

/// A stream that could not be read this tick.
#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    pub stream: StreamId,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub tick: u64,
    pub at: DateTime<Utc>,
    pub streams: Vec<StreamStatus>,
    pub changes: Vec<AlertChange>,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    /// Highest alert level across all streams.
    pub fn max_level(&self) -> AlertLevel {
        self.streams
            .iter()
            .map(|s| s.analysis.alert_level)
            .max()
            .unwrap_or_default()
    }
}

#[derive(Debug)]
struct TrackedStream {
    selector: MetricSelector,
    id: StreamId,
    cursor: Option<DateTime<Utc>>,
    last_level: Option<AlertLevel>,
    implicit_limit: Option<f64>,
}

/// Timer-driven re-analysis over a fixed set of streams.
#[derive(Debug)]
pub struct AlertSweep {
    registry: WindowRegistry,
    streams: Vec<TrackedStream>,
    limit: Option<f64>,
    ticks: u64,
    log: LogContext,
}

impl AlertSweep {
    /// Track `selectors`; `start` bounds the first replay (all history if None).
    pub fn new(
        registry: WindowRegistry,
        selectors: Vec<MetricSelector>,
        start: Option<DateTime<Utc>>,
        log: LogContext,
    ) -> Self {
        let streams = selectors
            .into_iter()
            .map(|selector| TrackedStream {
                id: selector.stream_id(),
                selector,
                cursor: start,
                last_level: None,
                implicit_limit: None,
            })
            .collect();
        AlertSweep {
            registry,
            streams,
            limit: None,
            ticks: 0,
            log,
        }
    }

    /// Apply one explicit limit to every stream instead of implicit ones.
    pub fn with_limit(mut self, limit: Option<f64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ingest new rows for every stream and re-analyze.
    pub fn tick(&mut self, store: &HistoryStore) -> SweepReport {
        self.ticks += 1;
        let mut report = SweepReport {
            tick: self.ticks,
            at: Utc::now(),
            streams: Vec::with_capacity(self.streams.len()),
            changes: Vec::new(),
            failures: Vec::new(),
        };

        for tracked in &mut self.streams {
            let ctx = self.log.for_stream(tracked.id.as_str());
            let series = match store.series(&tracked.selector, tracked.cursor) {
                Ok(series) => series,
                Err(e) => {
                    let message = e.to_string();
                    log_event!(ctx, WARN, event_names::INTERNAL_ERROR, Stage::Ingest,
                        "history query failed", error = message.as_str());
                    report.failures.push(SweepFailure {
                        stream: tracked.id.clone(),
                        message,
                    });
                    continue;
                }
            };

            let window = self.registry.get_or_create(&tracked.id);
            let (mut appended, mut rejected) = (0, 0);
            for point in &series.points {
                match window.append(Sample::new(point.timestamp, point.value)) {
                    Ok(()) => appended += 1,
                    Err(_) => rejected += 1,
                }
            }
            if let Some(latest) = series.latest() {
                tracked.cursor = Some(latest.timestamp);
            }
            if series.implicit_limit.is_some() {
                tracked.implicit_limit = series.implicit_limit;
            }

            let analysis = window.analyze(self.limit.or(tracked.implicit_limit));
            let current = analysis.alert_level;
            if tracked.last_level.unwrap_or_default() != current {
                let change = AlertChange {
                    stream: tracked.id.clone(),
                    previous: tracked.last_level,
                    current,
                    days_until_limit: analysis.days_until_limit,
                };
                if change.is_escalation() {
                    log_event!(ctx, WARN, event_names::ALERT_RAISED, Stage::Alert,
                        "alert level raised", level = current.as_str(), trend = analysis.trend.as_str());
                } else {
                    log_event!(ctx, INFO, event_names::ALERT_RAISED, Stage::Alert,
                        "alert level lowered", level = current.as_str(), trend = analysis.trend.as_str());
                }
                report.changes.push(change);
            }
            tracked.last_level = Some(current);

            report.streams.push(StreamStatus {
                stream: tracked.id.clone(),
                new_samples: appended,
                rejected_samples: rejected,
                analysis,
            });
        }

        log_event!(self.log, DEBUG, event_names::SWEEP_TICK, Stage::Sweep, "sweep finished",
            tick = self.ticks, streams = report.streams.len(), changes = report.changes.len());
        report
    }
}
