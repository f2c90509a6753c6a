//! Fuzz target for window ingestion and trend analysis.
//!
//! Arbitrary sample streams (including out-of-order timestamps and
//! non-finite values) must never panic, and every analysis must uphold the
//! degraded-window and breach rules.

#![no_main]

use arbitrary::Arbitrary;
use chrono::{DateTime, Duration, Utc};
use libfuzzer_sys::fuzz_target;
use nm_core::{AlertLevel, SampleWindow, TrendKind, TrendSettings};

#[derive(Debug, Arbitrary)]
struct Input {
    window_size: u8,
    limit: Option<f64>,
    samples: Vec<(i32, f64)>,
}

fuzz_target!(|input: Input| {
    let settings = TrendSettings {
        window_size: usize::from(input.window_size),
        ..TrendSettings::default()
    };
    let mut window = match SampleWindow::new(settings) {
        Ok(w) => w,
        Err(_) => return,
    };

    let origin = DateTime::<Utc>::UNIX_EPOCH;
    for (seconds, value) in input.samples {
        let _ = window.push(origin + Duration::seconds(i64::from(seconds)), value);
    }
    assert!(window.len() <= window.capacity());

    let analysis = window.analyze(input.limit);
    if analysis.n_points < 3 {
        assert_eq!(analysis.trend, TrendKind::Unknown);
    }
    if analysis.is_breached() {
        assert_eq!(analysis.alert_level, AlertLevel::Critical);
    }
    if let Some(days) = analysis.days_until_limit {
        assert!(days > 0.0 && days.is_finite());
    }
});
