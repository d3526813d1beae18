//! Criterion benchmarks for the transform engine
//!
//! Run with: cargo bench -p ondas-analysis
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ondas_analysis::{FftTransform, Spectrogram, fft_in_place};
use ondas_core::{Buffer, Window};

const SAMPLE_RATE: f64 = 48000.0;

fn generate_test_signal(size: usize) -> Buffer {
    (0..size)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            (2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_fft_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft_in_place");

    for log_n in [8u32, 10, 12, 14] {
        let n = 1usize << log_n;
        let signal = generate_test_signal(n);

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut real = signal.clone().into_vec();
                let mut imag = vec![0.0; n];
                fft_in_place(&mut real, &mut imag);
                black_box((real, imag))
            });
        });
    }

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("FftTransform");

    let signal = generate_test_signal(48000);
    let mut engine = FftTransform::new(SAMPLE_RATE);
    engine.set_window(Window::Hann);

    group.bench_function("fft_frames_1s", |b| {
        b.iter(|| black_box(engine.fft_frames(&signal, 2048, 512).unwrap()));
    });

    let chunk = engine.fft(&generate_test_signal(4096));
    group.bench_function("ifft_4096", |b| {
        b.iter(|| black_box(engine.ifft(&chunk)));
    });

    group.finish();
}

fn bench_spectrogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("Spectrogram");
    group.sample_size(20);

    let signal = generate_test_signal(48000);
    group.bench_function("1s_20ms_windows", |b| {
        b.iter(|| {
            black_box(Spectrogram::new(
                &signal,
                SAMPLE_RATE,
                0.020,
                0.010,
                Window::Hann,
            ))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_fft_kernel, bench_engine, bench_spectrogram);
criterion_main!(benches);
