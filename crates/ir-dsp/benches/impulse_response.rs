//! Direct convolution benchmarks
//!
//! Cost per block grows with kernel length; these cover typical cabinet
//! IR lengths at common host block sizes.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ir_dsp::resample::resample;
use ir_dsp::{ImpulseResponse, ImpulseResponseConfig, RawAudio};

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];
const KERNEL_LENGTHS: &[usize] = &[256, 2048, 8192];

fn generate_test_audio(samples: usize) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            (2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn generate_ir(samples: usize) -> RawAudio {
    let ir = (0..samples)
        .map(|i| ((i as f32 * 0.37).sin() * (-(i as f32) / 500.0).exp()))
        .collect();
    RawAudio::new(ir, SAMPLE_RATE)
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("Direct Convolution");

    for &taps in KERNEL_LENGTHS {
        for &block_size in BLOCK_SIZES {
            group.bench_with_input(
                BenchmarkId::new(format!("{}-taps", taps), block_size),
                &block_size,
                |b, &size| {
                    let input = generate_test_audio(size);
                    let mut ir =
                        ImpulseResponse::from_data(generate_ir(taps), SAMPLE_RATE, ImpulseResponseConfig::default());

                    b.iter(|| {
                        let block = ir.process(&[black_box(input.as_slice())], size).unwrap();
                        black_box(block.channel(0)[size - 1])
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let ir = generate_ir(8192);
    c.bench_function("Resample 44.1k -> 48k (8192)", |b| {
        b.iter(|| black_box(resample(black_box(&ir.samples), 44100.0, 48000.0, 8192)))
    });
}

criterion_group!(benches, bench_process, bench_resample);
criterion_main!(benches);
