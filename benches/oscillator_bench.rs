//! Benchmarks for frame synthesis and ring publishing
//!
//! Run with: cargo bench --bench oscillator_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sinescope::oscillator::{SignalSource, SineOscillator};
use sinescope::ring::{RingLayout, RingReader};

fn bench_generate_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_frame");

    for count in [256usize, 1000, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut osc = SineOscillator::new(440.0, 0.8);
            osc.start();
            b.iter(|| black_box(osc.generate_frame(black_box(count))));
        });
    }

    group.finish();
}

fn bench_publish_and_drain(c: &mut Criterion) {
    let ring = RingLayout::new_boxed();
    let mut osc = SineOscillator::new(440.0, 0.8);
    osc.start();
    let frame = osc.generate_frame(1000);

    c.bench_function("publish_frame_1000", |b| {
        b.iter(|| black_box(ring.publish_frame(black_box(&frame))));
    });

    c.bench_function("publish_then_drain_1000", |b| {
        let mut reader = RingReader::new();
        let mut out = Vec::with_capacity(1000);
        b.iter(|| {
            ring.publish_frame(&frame);
            out.clear();
            black_box(reader.poll(&ring, &mut out))
        });
    });
}

criterion_group!(benches, bench_generate_frame, bench_publish_and_drain);
criterion_main!(benches);
