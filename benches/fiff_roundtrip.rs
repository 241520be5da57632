use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use meeg_study::fiff::{ChannelInfo, ChannelType, MeasInfo};
use meeg_study::filter::design_bandpass;
use meeg_study::raw::Raw;
use ndarray::Array2;

/// 60 EEG channels + 1 stim, 60 s at 600 Hz.
fn recording() -> Raw {
    let mut chs: Vec<ChannelInfo> = (0..60)
        .map(|i| ChannelInfo::new(format!("EEG {:03}", i + 1), ChannelType::Eeg, i + 1))
        .collect();
    chs.push(ChannelInfo::new("STI 014", ChannelType::Stim, 61));
    let data = Array2::from_shape_fn((61, 36_000), |(c, t)| ((c * 31 + t * 7) % 97) as f64 * 1e-7);
    Raw::new(MeasInfo::new(600.0, chs), data, 0).unwrap()
}

fn bench_write_read(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench_raw.fif");
    let raw = recording();
    c.bench_function("save [61×36000]", |b| {
        b.iter(|| raw.save(black_box(&path), true).unwrap())
    });
    c.bench_function("read [61×36000]", |b| {
        b.iter(|| {
            let r = Raw::read(black_box(&path)).unwrap();
            black_box(r.n_times())
        })
    });
}

fn bench_bandpass(c: &mut Criterion) {
    let raw = recording();
    c.bench_function("design_bandpass 13–30 Hz @ 600 Hz", |b| {
        b.iter(|| design_bandpass(black_box(13.0), black_box(30.0), black_box(600.0)))
    });
    c.bench_function("Raw::filter 13–30 Hz [61×36000]", |b| {
        b.iter(|| {
            let out = raw.filter(Some(13.0), Some(30.0)).unwrap();
            black_box(out.info.highpass)
        })
    });
}

criterion_group!(benches, bench_write_read, bench_bandpass);
criterion_main!(benches);
