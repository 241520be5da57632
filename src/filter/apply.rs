//! Overlap-add zero-phase FIR convolution, after MNE's `_overlap_add_filter`.
//!
//! The kernel is odd-length and symmetric, so zero phase is a shift of the
//! output by `(N-1)/2` samples.  Edges are padded with `N-1` samples of odd
//! reflection to keep the onset transient out of the signal.
use anyhow::{bail, Result};
use ndarray::{Array2, ArrayView1};
use rustfft::{num_complex::Complex, FftPlanner};
use tracing::warn;

/// Filter the rows listed in `picks` of `data` (`[C, T]`) in place.
pub fn apply_fir_zero_phase(data: &mut Array2<f64>, h: &[f32], picks: &[usize]) -> Result<()> {
    let (n_ch, n_t) = data.dim();
    if let Some(&bad) = picks.iter().find(|&&p| p >= n_ch) {
        bail!("pick {bad} out of range for {n_ch} channels");
    }
    if h.len() > n_t {
        warn!(n_taps = h.len(), n_times = n_t, "filter is longer than the signal");
    }
    for &ch in picks {
        let row: Vec<f64> = data.row(ch).to_vec();
        let filtered = filter_1d(&row, h)?;
        data.row_mut(ch).assign(&ArrayView1::from(&filtered));
    }
    Ok(())
}

/// Filter one signal; the output has the length of `x`.
pub fn filter_1d(x: &[f64], h: &[f32]) -> Result<Vec<f64>> {
    let n_x = x.len();
    let n_h = h.len();
    if n_h % 2 == 0 {
        bail!("zero-phase filtering needs an odd number of taps, got {n_h}");
    }
    if n_x == 0 {
        return Ok(vec![]);
    }

    let shift = (n_h - 1) / 2;
    let n_edge = n_h - 1;
    let x_ext = reflect_limited_pad(x, n_edge);
    let n_ext = x_ext.len();

    let n_fft = choose_fft_len(n_h, n_ext);
    let n_seg = n_fft - n_h + 1;

    let mut planner: FftPlanner<f64> = FftPlanner::new();
    let fft_fwd = planner.plan_fft_forward(n_fft);
    let fft_inv = planner.plan_fft_inverse(n_fft);

    let mut h_fft = zero_padded(h.iter().map(|&v| v as f64), n_fft);
    fft_fwd.process(&mut h_fft);

    let inv_scale = 1.0 / n_fft as f64;
    let mut y = vec![0.0_f64; n_ext];

    for start in (0..n_ext).step_by(n_seg) {
        let stop = (start + n_seg).min(n_ext);
        let mut buf = zero_padded(x_ext[start..stop].iter().copied(), n_fft);
        fft_fwd.process(&mut buf);
        for (b, &hf) in buf.iter_mut().zip(h_fft.iter()) {
            *b *= hf;
        }
        fft_inv.process(&mut buf);

        // Output sample `o` takes product sample `o + shift - start`.
        let out_start = start.saturating_sub(shift);
        let prod_start = shift.saturating_sub(start);
        for (o, p) in (out_start..n_ext).zip(prod_start..n_fft) {
            y[o] += buf[p].re * inv_scale;
        }
    }

    Ok(y[n_edge..n_edge + n_x].to_vec())
}

fn zero_padded<I: Iterator<Item = f64>>(values: I, n: usize) -> Vec<Complex<f64>> {
    values
        .map(|re| Complex { re, im: 0.0 })
        .chain(std::iter::repeat(Complex::default()))
        .take(n)
        .collect()
}

/// Odd reflection about each end (MNE's `reflect_limited`), zero-filled
/// where the signal is shorter than the padding.
fn reflect_limited_pad(x: &[f64], n_pad: usize) -> Vec<f64> {
    let n = x.len();
    let avail = n_pad.min(n - 1);
    let (first, last) = (x[0], x[n - 1]);

    let mut out = Vec::with_capacity(n + 2 * n_pad);
    out.extend(std::iter::repeat(0.0).take(n_pad - avail));
    out.extend((1..=avail).rev().map(|i| 2.0 * first - x[i]));
    out.extend_from_slice(x);
    out.extend((1..=avail).map(|i| 2.0 * last - x[n - 1 - i]));
    out.extend(std::iter::repeat(0.0).take(n_pad - avail));
    out
}

/// Power-of-two FFT length minimising MNE's cost estimate
/// `ceil(n_x / (N - n_h + 1)) · N · (log2 N + 1) + 4e-5 · N · n_x`.
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_pow = ((2 * n_h - 1) as f64).log2().ceil() as u32;
    let max_pow = ((n_x as f64).log2().ceil() as u32 + 1).max(min_pow);

    (min_pow..=max_pow)
        .map(|pow| {
            let n = 1_usize << pow;
            let n_seg = (n - n_h + 1) as f64;
            let cost = (n_x as f64 / n_seg).ceil() * n as f64 * (pow as f64 + 1.0)
                + 4e-5 * n as f64 * n_x as f64;
            (n, cost)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _)| n)
        .unwrap_or(1 << max_pow)
}
