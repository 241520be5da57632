mod common;
use common::{sample_raw, N_STIM};
use meeg_study::fiff::ChannelType;
use meeg_study::pick::{pick_types, MegPick, PickTypes};
use meeg_study::plot::{first_seconds, pick_and_plot, window_samples, PlotStyle};
use meeg_study::raw::Raw;

fn stim() -> PickTypes {
    PickTypes { meg: MegPick::None, stim: true, ..PickTypes::default() }
}

fn svg_style() -> PlotStyle {
    PlotStyle { width: 400, height: 200, with_axes: false, ..PlotStyle::default() }
}

#[test]
fn stim_picks_are_the_trigger_channels() {
    let raw = sample_raw(100.0, 12.0);
    let picks = pick_types(&raw.info, &stim());
    assert_eq!(picks.len(), N_STIM);
    assert!(picks.iter().all(|&p| raw.info.chs[p].channel_type() == ChannelType::Stim));
    assert!(picks.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn ten_seconds_at_100_hz_is_1000_samples() {
    let raw = sample_raw(100.0, 12.0);
    assert_eq!(window_samples(raw.sfreq(), 10.0), 1000);
    let pick = pick_types(&raw.info, &stim())[6];
    let (samples, times) = first_seconds(&raw, pick, 10.0).unwrap();
    assert_eq!(samples.len(), 1000);
    approx::assert_abs_diff_eq!(times[0], 0.0);
    approx::assert_abs_diff_eq!(times[999], 9.99, epsilon = 1e-12);
    // Channel #6 of the stim set pulses to 7.
    assert_eq!(samples[0], 7.0);
    assert_eq!(samples[10], 0.0);
}

#[test]
fn short_recording_is_clipped() {
    let raw = sample_raw(100.0, 4.0);
    let (samples, _) = first_seconds(&raw, 0, 10.0).unwrap();
    assert_eq!(samples.len(), 400);
}

#[test]
fn plot_seventh_stim_channel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stim.svg");
    let raw = sample_raw(100.0, 12.0);
    let drawn = pick_and_plot(&raw, &stim(), 6, 10.0, &path, &svg_style()).unwrap();
    assert_eq!(drawn.channel, "STI 007");
    assert_eq!(drawn.n_samples, 1000);
    let svg = std::fs::read_to_string(&path).unwrap();
    assert!(svg.starts_with("<svg") || svg.contains("<svg"));
}

#[test]
fn absent_type_gives_empty_selection_and_no_plot() {
    let dir = tempfile::tempdir().unwrap();
    let raw = sample_raw(100.0, 2.0);
    let ecg = PickTypes::only(ChannelType::Ecg);
    assert!(pick_types(&raw.info, &ecg).is_empty());
    let path = dir.path().join("ecg.svg");
    assert!(pick_and_plot(&raw, &ecg, 0, 10.0, &path, &svg_style()).is_err());
    assert!(!path.exists());
}

#[test]
fn index_past_selection_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let raw = sample_raw(100.0, 2.0);
    let e = pick_and_plot(&raw, &stim(), N_STIM, 1.0, dir.path().join("x.svg"), &svg_style()).unwrap_err();
    assert!(e.to_string().contains("cannot take channel"), "{e}");
}

#[test]
fn plot_from_reloaded_file() {
    let dir = tempfile::tempdir().unwrap();
    let fif = dir.path().join("sample_raw.fif");
    sample_raw(100.0, 12.0).save(&fif, false).unwrap();
    let raw = Raw::read(&fif).unwrap();
    let drawn = pick_and_plot(&raw, &stim(), 6, 10.0, dir.path().join("stim.svg"), &svg_style()).unwrap();
    assert_eq!(drawn.n_samples, 1000);
}

#[test]
fn bads_are_left_out() {
    let mut raw = sample_raw(100.0, 1.0);
    raw.info.bad_ch_names = vec!["STI 001".into()];
    let picks = pick_types(&raw.info, &stim());
    assert_eq!(picks.len(), N_STIM - 1);
    assert_eq!(raw.info.chs[picks[0]].name, "STI 002");
}
