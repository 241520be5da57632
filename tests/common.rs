/// Shared helpers: synthetic recordings with MEG, EEG, EOG and stim channels.
use meeg_study::fiff::{ChannelInfo, ChannelType, MeasInfo};
use meeg_study::raw::Raw;
use ndarray::Array2;
use std::f64::consts::PI;

/// Stim channels in [`sample_raw`]; index 6 is the one the scripts plot.
pub const N_STIM: usize = 8;

/// Channel layout: 2 grad, 1 mag, 1 EEG, 1 EOG, then `N_STIM` stim channels.
pub fn sample_channels() -> Vec<ChannelInfo> {
    let mut chs = vec![
        ChannelInfo::new("MEG 0113", ChannelType::Grad, 1),
        ChannelInfo::new("MEG 0112", ChannelType::Grad, 2),
        ChannelInfo::new("MEG 0111", ChannelType::Mag, 3),
        ChannelInfo::new("EEG 001", ChannelType::Eeg, 4),
        ChannelInfo::new("EOG 061", ChannelType::Eog, 5),
    ];
    for k in 0..N_STIM {
        let n = chs.len() as i32 + 1;
        chs.push(ChannelInfo::new(format!("STI 00{}", k + 1), ChannelType::Stim, n));
    }
    chs
}

/// `sfreq` × `seconds` recording.  Data channels carry a 3 Hz and a 20 Hz
/// sine of equal amplitude (scaled to the sensor's unit); stim channel `k`
/// steps to `k + 1` for 50 ms every second.
pub fn sample_raw(sfreq: f64, seconds: f64) -> Raw {
    let chs = sample_channels();
    let types: Vec<ChannelType> = chs.iter().map(|c| c.channel_type()).collect();
    let n_t = (sfreq * seconds) as usize;
    let data = Array2::from_shape_fn((chs.len(), n_t), |(c, t)| {
        let time = t as f64 / sfreq;
        let scale = match types[c] {
            ChannelType::Grad => 1e-11,
            ChannelType::Mag => 1e-12,
            ChannelType::Eeg | ChannelType::Eog => 1e-5,
            _ => 0.0,
        };
        if types[c] == ChannelType::Stim {
            let k = c - 5;
            let in_pulse = (time.fract() * 1000.0) < 50.0;
            if in_pulse { (k + 1) as f64 } else { 0.0 }
        } else {
            scale * ((2.0 * PI * 3.0 * time).sin() + (2.0 * PI * 20.0 * time).sin())
        }
    });
    let mut info = MeasInfo::new(sfreq, chs);
    info.line_freq = Some(50.0);
    Raw::new(info, data, 0).unwrap()
}

/// Amplitude of the `freq` Hz component of `x` (single-bin DFT).
#[allow(unused)]
pub fn tone_amplitude(x: &[f64], freq: f64, sfreq: f64) -> f64 {
    let w = 2.0 * PI * freq / sfreq;
    let (re, im) = x.iter().enumerate().fold((0.0, 0.0), |(re, im), (k, &v)| {
        (re + v * (w * k as f64).cos(), im - v * (w * k as f64).sin())
    });
    2.0 * (re * re + im * im).sqrt() / x.len() as f64
}
