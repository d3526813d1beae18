//! Criterion benchmarks for the filter toolkit
//!
//! Run with: cargo bench -p ondas-filters
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ondas_core::Buffer;
use ondas_filters::{
    Biquad, EqMode, Filter, FirLowPass, IirMode, IirStage, ParametricEqualizer, Vocoder,
};

const SAMPLE_RATE: f64 = 48000.0;

fn generate_test_signal(size: usize) -> Buffer {
    (0..size)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            (2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_fir(c: &mut Criterion) {
    let mut group = c.benchmark_group("FirLowPass");
    let signal = generate_test_signal(48000);

    for kernel_size in [33usize, 129, 513] {
        let mut lp = FirLowPass::new(SAMPLE_RATE, 2000.0, kernel_size);
        group.bench_with_input(
            BenchmarkId::from_parameter(kernel_size),
            &kernel_size,
            |b, _| {
                b.iter(|| black_box(lp.filter_buffer(&signal)));
            },
        );
    }

    group.finish();
}

fn bench_iir(c: &mut Criterion) {
    let mut group = c.benchmark_group("IirStage");
    let signal = generate_test_signal(48000);

    let mut stage = IirStage::new(SAMPLE_RATE, IirMode::LowPass, 6, 2000.0, 0.0);
    group.bench_function("low_pass_6_pole_1s", |b| {
        b.iter(|| black_box(stage.filter_buffer(&signal)));
    });

    // Dynamic track hits the kernel cache on every repeat sweep.
    let sweep: Buffer = (0..signal.len())
        .map(|i| 500.0 + (i % 4000) as f64)
        .collect();
    group.bench_function("low_pass_6_pole_swept_1s", |b| {
        b.iter(|| black_box(stage.filter_buffer_dynamic(&signal, &sweep)));
    });

    group.finish();
}

fn bench_eq(c: &mut Criterion) {
    let mut group = c.benchmark_group("ParametricEqualizer");
    let signal = generate_test_signal(48000);

    let mut eq = ParametricEqualizer::new(SAMPLE_RATE, EqMode::Peaking, 1000.0, 2.0, 6.0);
    group.bench_function("peaking_1s", |b| {
        b.iter(|| black_box(eq.filter_buffer(&signal)));
    });

    group.finish();
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("Biquad");
    let signal = generate_test_signal(48000);

    let mut bq = Biquad::new(SAMPLE_RATE, 1000.0, 500.0, 6.0, 3.0, 0.0, 4).unwrap();
    group.bench_function("order_4_1s", |b| {
        b.iter(|| black_box(bq.filter_buffer(&signal)));
    });

    group.bench_function("design_order_4", |b| {
        b.iter(|| {
            black_box(
                Biquad::new(SAMPLE_RATE, 1000.0, 500.0, 6.0, 3.0, 0.0, 4).unwrap(),
            )
        });
    });

    group.finish();
}

fn bench_vocoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("Vocoder");
    group.sample_size(20);

    let voice = generate_test_signal(48000);
    let carrier: Buffer = (0..48000)
        .map(|i| if (i / 109) % 2 == 0 { 0.5 } else { -0.5 })
        .collect();

    let mut voc = Vocoder::new(SAMPLE_RATE, 0.02, 16, 8000.0);
    group.bench_function("16_bands_1s", |b| {
        b.iter(|| black_box(voc.filter_buffer(&voice, &carrier)));
    });

    group.finish();
}

criterion_group!(benches, bench_fir, bench_iir, bench_eq, bench_biquad, bench_vocoder);
criterion_main!(benches);
