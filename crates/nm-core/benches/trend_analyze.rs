//! Criterion benchmarks for the trend pipeline in `nm-core`.
//!
//! Covers `SampleWindow::append` under eviction and `analyze()` at the
//! window sizes the presets use.

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nm_core::trend::analyze_samples;
use nm_core::{Sample, SampleWindow, TrendSettings};

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

/// Hourly disk usage with slow growth and a little jitter.
fn samples(n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let t = i as f64 / 24.0;
            let jitter = ((i * 7919) % 13) as f64 - 6.0;
            Sample::new(
                origin() + Duration::hours(i as i64),
                100e9 + 2e9 * t + 0.05e9 * t * t + jitter * 1e6,
            )
        })
        .collect()
}

fn settings(window_size: usize) -> TrendSettings {
    TrendSettings {
        window_size,
        ..TrendSettings::default()
    }
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("trend/analyze");

    for n in [3usize, 30, 100, 168, 300] {
        let data = samples(n);
        let cfg = settings(n.max(2));
        group.bench_with_input(BenchmarkId::new("points", n), &data, |b, data| {
            b.iter(|| {
                let analysis = analyze_samples(black_box(data), black_box(&cfg), Some(500e9));
                black_box(analysis.alert_level);
            })
        });
    }

    group.finish();
}

fn bench_window_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("trend/append");
    let data = samples(1000);

    for window_size in [100usize, 300] {
        group.bench_with_input(
            BenchmarkId::new("evicting", window_size),
            &data,
            |b, data| {
                b.iter(|| {
                    let mut window = SampleWindow::new(settings(window_size)).unwrap();
                    for s in data {
                        window.append(*s).unwrap();
                    }
                    black_box(window.len());
                })
            },
        );
    }

    group.finish();
}

fn bench_window_analyze(c: &mut Criterion) {
    let mut window = SampleWindow::new(settings(300)).unwrap();
    // Wrap the ring so analysis has to copy a rotated deque.
    for s in samples(450) {
        window.append(s).unwrap();
    }

    c.bench_function("trend/window_analyze_rotated_300", |b| {
        b.iter(|| black_box(window.analyze(black_box(Some(500e9)))))
    });
}

criterion_group!(benches, bench_analyze, bench_window_append, bench_window_analyze);
criterion_main!(benches);
