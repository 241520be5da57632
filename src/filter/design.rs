//! FIR filter design matching MNE's `create_filter(..., filter_length='auto',
//! fir_window='hamming', fir_design='firwin', phase='zero')`.
//!
//! * highpass transition: `min(max(0.25 · l_freq, 2), l_freq)`
//! * lowpass transition:  `min(max(0.25 · h_freq, 2), nyquist − h_freq)`
//! * length: `ceil(3.3 / narrowest_transition · sfreq)`, rounded to odd
//! * each band edge is a Hamming-windowed sinc with its cut-off in the
//!   middle of the transition band; edges are summed into one kernel
use std::f64::consts::PI;
use anyhow::{bail, Result};
use tracing::debug;

/// Hamming window main-lobe factor used for the length rule.
const HAMMING_LENGTH_FACTOR: f32 = 3.3;

pub fn auto_trans_bandwidth(l_freq: f32) -> f32 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

pub fn auto_lowpass_trans_bandwidth(h_freq: f32, sfreq: f32) -> f32 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Odd number of taps for a transition band of `trans_bw` Hz.
pub fn auto_filter_length(trans_bw: f32, sfreq: f32) -> usize {
    let n = (HAMMING_LENGTH_FACTOR / trans_bw * sfreq).ceil() as usize;
    n | 1
}

/// Zero-phase highpass at `l_freq`.
pub fn design_highpass(l_freq: f32, sfreq: f32) -> Vec<f32> {
    let trans_bw = auto_trans_bandwidth(l_freq);
    let n = auto_filter_length(trans_bw, sfreq);
    let h = firwin(n, l_freq - trans_bw / 2.0, sfreq, false);
    h.iter().map(|&v| v as f32).collect()
}

/// Zero-phase lowpass at `h_freq`.
pub fn design_lowpass(h_freq: f32, sfreq: f32) -> Vec<f32> {
    let trans_bw = auto_lowpass_trans_bandwidth(h_freq, sfreq);
    let n = auto_filter_length(trans_bw, sfreq);
    let h = firwin(n, h_freq + trans_bw / 2.0, sfreq, true);
    h.iter().map(|&v| v as f32).collect()
}

/// Zero-phase band-pass keeping `[l_freq, h_freq]`.
///
/// The kernel length follows the narrower transition band; each edge is a
/// lowpass of the length its own transition needs, centred in the kernel,
/// and the lower edge is subtracted from the upper one.
pub fn design_bandpass(l_freq: f32, h_freq: f32, sfreq: f32) -> Vec<f32> {
    let l_trans = auto_trans_bandwidth(l_freq);
    let h_trans = auto_lowpass_trans_bandwidth(h_freq, sfreq);
    let n = auto_filter_length(l_trans.min(h_trans), sfreq);

    let upper = firwin(auto_filter_length(h_trans, sfreq).min(n), h_freq + h_trans / 2.0, sfreq, true);
    let lower = firwin(auto_filter_length(l_trans, sfreq).min(n), l_freq - l_trans / 2.0, sfreq, true);

    let mut h = vec![0.0_f64; n];
    for (edge, sign) in [(&upper, 1.0), (&lower, -1.0)] {
        let offset = (n - edge.len()) / 2;
        for (k, &v) in edge.iter().enumerate() {
            h[offset + k] += sign * v;
        }
    }
    debug!(l_freq, h_freq, l_trans, h_trans, n_taps = n, "designed band-pass FIR");
    h.iter().map(|&v| v as f32).collect()
}

/// Kernel for a band given by optional corners, like `mne.filter.create_filter`:
/// both corners → band-pass, `l_freq` only → highpass, `h_freq` only → lowpass.
pub fn create_filter(l_freq: Option<f32>, h_freq: Option<f32>, sfreq: f32) -> Result<Vec<f32>> {
    let nyq = sfreq / 2.0;
    if !(sfreq.is_finite() && sfreq > 0.0) {
        bail!("sampling frequency must be positive, got {sfreq}");
    }
    if let Some(l) = l_freq {
        if !(l > 0.0 && l < nyq) {
            bail!("l_freq ({l} Hz) must lie in (0, {nyq}) Hz");
        }
    }
    if let Some(h) = h_freq {
        if !(h > 0.0 && h < nyq) {
            bail!("h_freq ({h} Hz) must lie in (0, {nyq}) Hz");
        }
    }
    match (l_freq, h_freq) {
        (Some(l), Some(h)) if l >= h => {
            bail!("l_freq ({l} Hz) must be below h_freq ({h} Hz); band-stop is not supported")
        }
        (Some(l), Some(h)) => Ok(design_bandpass(l, h, sfreq)),
        (Some(l), None)    => Ok(design_highpass(l, sfreq)),
        (None, Some(h))    => Ok(design_lowpass(h, sfreq)),
        (None, None)       => bail!("at least one of l_freq and h_freq is required"),
    }
}

/// Windowed-sinc FIR of odd length `n` with its −6 dB point at `cutoff_hz`.
/// `pass_zero = false` spectrally inverts it into a highpass.
pub fn firwin(n: usize, cutoff_hz: f32, sfreq: f32, pass_zero: bool) -> Vec<f64> {
    assert!(n % 2 == 1, "firwin requires odd N for linear-phase filter");
    let alpha = (n - 1) as f64 / 2.0;
    let fc = cutoff_hz as f64 / (sfreq as f64 / 2.0);
    let win = hamming(n);

    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * win[i]
        })
        .collect();

    // Unit DC gain.
    let s: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= s);

    if !pass_zero {
        h.iter_mut().for_each(|v| *v = -*v);
        h[n / 2] += 1.0;
    }
    h
}

pub fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}
