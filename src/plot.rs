//! Extract the first seconds of one channel and draw it as a line plot.
//!
//! The output format follows the file extension: `.svg` is written by the
//! SVG backend, anything else (`.png`, `.bmp`, ...) by the bitmap backend.
//! The crate builds plotters without a font backend, so plots carry no
//! text; `with_axes` draws the frame and grid only.
use std::path::Path;
use anyhow::{anyhow, bail, Result};
use ndarray::Array1;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{debug, info};

use crate::pick::{pick_types, PickTypes};
use crate::raw::Raw;

/// Number of samples in the first `seconds` of a recording sampled at
/// `sfreq`, truncated like `int(sfreq * seconds)`.
pub fn window_samples(sfreq: f64, seconds: f64) -> usize {
    (sfreq * seconds).floor().max(0.0) as usize
}

/// Samples and times of channel `pick` over the first `seconds`, clipped to
/// the recording.
pub fn first_seconds(raw: &Raw, pick: usize, seconds: f64) -> Result<(Array1<f64>, Array1<f64>)> {
    if !(seconds.is_finite() && seconds > 0.0) {
        bail!("window length must be positive, got {seconds} s");
    }
    raw.get(pick, 0..window_samples(raw.sfreq(), seconds))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotStyle {
    pub width:     u32,
    pub height:    u32,
    pub with_axes: bool,
    pub color:     (u8, u8, u8),
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self { width: 1024, height: 384, with_axes: true, color: (31, 119, 180) }
    }
}

/// Draw `samples` against `times` into `path`.
pub fn plot_time_series<P: AsRef<Path>>(path: P, times: &[f64], samples: &[f64], style: &PlotStyle) -> Result<()> {
    let path = path.as_ref();
    if times.len() != samples.len() {
        bail!("{} times for {} samples", times.len(), samples.len());
    }
    if samples.is_empty() {
        bail!("nothing to plot");
    }
    if style.width == 0 || style.height == 0 {
        bail!("plot size must be non-zero, got {}x{}", style.width, style.height);
    }
    let size = (style.width, style.height);
    let is_svg = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        draw(SVGBackend::new(path, size).into_drawing_area(), times, samples, style)?;
    } else {
        draw(BitMapBackend::new(path, size).into_drawing_area(), times, samples, style)?;
    }
    debug!(path = %path.display(), n = samples.len(), "wrote plot");
    Ok(())
}

fn plot_err(e: impl std::fmt::Display) -> anyhow::Error {
    anyhow!("plotting failed: {e}")
}

/// `[lo, hi]` of finite values, widened when empty or flat.
fn span(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo > hi {
        (-1.0, 1.0)
    } else if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    times: &[f64],
    samples: &[f64],
    style: &PlotStyle,
) -> Result<()> {
    root.fill(&WHITE).map_err(plot_err)?;

    let (t0, t1) = span(times);
    let (y0, y1) = span(samples);
    let pad = 0.05 * (y1 - y0);

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(t0..t1, (y0 - pad)..(y1 + pad))
        .map_err(plot_err)?;

    if style.with_axes {
        chart
            .configure_mesh()
            .x_labels(0)
            .y_labels(0)
            .draw()
            .map_err(plot_err)?;
    }

    let (r, g, b) = style.color;
    chart
        .draw_series(LineSeries::new(
            times.iter().zip(samples).map(|(&t, &v)| (t, v)),
            &RGBColor(r, g, b),
        ))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// What [`pick_and_plot`] drew.
#[derive(Debug, Clone, PartialEq)]
pub struct PickPlot {
    pub channel:   String,
    pub pick:      usize,
    pub n_samples: usize,
}

/// Select channels with `picks`, take the `nth` of them and plot its first
/// `seconds`.
pub fn pick_and_plot<P: AsRef<Path>>(
    raw: &Raw,
    picks: &PickTypes,
    nth: usize,
    seconds: f64,
    path: P,
    style: &PlotStyle,
) -> Result<PickPlot> {
    let selected = pick_types(&raw.info, picks);
    let Some(&pick) = selected.get(nth) else {
        bail!("selection has {} channels, cannot take channel #{nth}", selected.len());
    };
    let (samples, times) = first_seconds(raw, pick, seconds)?;
    let samples = samples.to_vec();
    let times = times.to_vec();
    plot_time_series(path.as_ref(), &times, &samples, style)?;

    let channel = raw.info.chs[pick].name.clone();
    info!(channel = %channel, n_samples = samples.len(), path = %path.as_ref().display(), "plotted channel");
    Ok(PickPlot { channel, pick, n_samples: samples.len() })
}
