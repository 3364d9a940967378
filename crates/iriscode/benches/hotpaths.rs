use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use iriscode::pupil::detect_pupil_gray;
use iriscode::spectral::{compute_spectrum, RadialWaveform};
use iriscode::{IrisEncoder, PipelineConfig, PupilConfig, RasterImage};

/// Dark pupil, striated iris annulus and bright sclera with mild noise.
fn make_eye_fixture(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let pupil_r = width.min(height) as f32 * 0.12;
    let iris_r = pupil_r * 2.6;

    GrayImage::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let d = (dx * dx + dy * dy).sqrt();
        let noise = rng.gen_range(-4.0f32..4.0f32);
        let v = if d <= pupil_r {
            14.0
        } else if d <= iris_r {
            let theta = dy.atan2(dx);
            160.0 + 25.0 * (theta * 36.0).sin() + 15.0 * (d * 0.4).sin()
        } else {
            210.0
        };
        Luma([(v + noise).clamp(0.0, 255.0) as u8])
    })
}

fn bench_spectrum(c: &mut Criterion) {
    let pow2 = make_eye_fixture(256, 256, 1);
    let odd = make_eye_fixture(300, 300, 2);

    c.bench_function("spectrum_256x256", |b| {
        b.iter(|| black_box(compute_spectrum(black_box(&pow2))))
    });

    c.bench_function("spectrum_300x300_bluestein", |b| {
        b.iter(|| black_box(compute_spectrum(black_box(&odd))))
    });

    let spec = compute_spectrum(&pow2);
    c.bench_function("radial_waveform_256_to_64", |b| {
        b.iter(|| black_box(RadialWaveform::from_spectrum(black_box(&spec), 64)))
    });
}

fn bench_pupil(c: &mut Criterion) {
    let img = make_eye_fixture(640, 480, 3);
    let cfg = PupilConfig::default();

    c.bench_function("detect_pupil_640x480", |b| {
        b.iter(|| black_box(detect_pupil_gray(black_box(&img), &cfg)))
    });
}

fn bench_encode(c: &mut Criterion) {
    let img = RasterImage::Gray(make_eye_fixture(640, 480, 4));
    let encoder = IrisEncoder::with_config(PipelineConfig::with_crop_size(256))
        .expect("valid config");

    c.bench_function("encode_640x480_crop256", |b| {
        b.iter(|| black_box(encoder.encode(black_box(&img))))
    });
}

criterion_group!(hotpaths, bench_spectrum, bench_pupil, bench_encode);
criterion_main!(hotpaths);
