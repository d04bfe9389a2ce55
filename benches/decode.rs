//! Decode and Drop Detection Benchmarks
//!
//! Run with: `cargo bench --bench decode`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cycle_sync::analysis::{flag_drops, DropThresholds, SynchronyTable};
use cycle_sync::timestamp::{CameraSeries, MalformedPolicy, RawCycleTimestamp};

const OFFSETS_PER_SECOND: u64 = 8000 * 3072;

/// Readings of a 30 fps camera starting `lag` offsets late.
fn readings(frames: usize, lag: u64) -> Vec<RawCycleTimestamp> {
    (0..frames as u64)
        .map(|i| {
            let ticks = lag + i * OFFSETS_PER_SECOND / 30;
            RawCycleTimestamp::new(
                ((ticks / OFFSETS_PER_SECOND) % 128) as i64,
                ((ticks / 3072) % 8000) as i64,
                (ticks % 3072) as i64,
            )
        })
        .collect()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_series");

    for frames in [1_000, 10_000, 100_000] {
        let input = readings(frames, 0);
        group.bench_with_input(BenchmarkId::from_parameter(frames), &input, |bench, input| {
            bench.iter(|| {
                let series =
                    CameraSeries::decode("cam0", input.iter().copied(), MalformedPolicy::Skip);
                black_box(series)
            });
        });
    }

    group.finish();
}

fn bench_drop_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("flag_drops");

    let intervals: Vec<f64> = (0..10_000)
        .map(|i| if i % 500 == 499 { 0.066 } else { 0.033 })
        .collect();

    for (name, window) in [("all", None), ("window_30", Some(30)), ("window_300", Some(300))] {
        let thresholds = DropThresholds {
            window,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &thresholds, |bench, t| {
            bench.iter(|| black_box(flag_drops(black_box(&intervals), t)));
        });
    }

    group.finish();
}

fn bench_synchrony(c: &mut Criterion) {
    let series: Vec<CameraSeries> = (0..8u64)
        .map(|cam| {
            CameraSeries::decode(
                format!("cam{cam}"),
                readings(10_000, cam * 100),
                MalformedPolicy::Skip,
            )
            .expect("synthetic readings are well formed")
        })
        .collect();

    c.bench_function("synchrony_8x10000", |bench| {
        bench.iter(|| black_box(SynchronyTable::compute(black_box(&series))));
    });
}

criterion_group!(benches, bench_decode, bench_drop_detection, bench_synchrony);
criterion_main!(benches);
