mod common;
use common::{sample_raw, tone_amplitude, N_STIM};
use meeg_study::bids::BidsPath;
use meeg_study::export::{filter_and_export, FilterExport};
use meeg_study::fiff::ChannelType;
use meeg_study::raw::Raw;

const SFREQ: f64 = 250.0;

fn source(root: &std::path::Path) -> BidsPath {
    BidsPath::new(root, "01").with_task("audiovisual").with_run("01")
}

#[test]
fn beta_export_writes_both_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("ds000248");
    let native = dir.path().join("sample_audvis_beta_raw.fif");
    let raw = sample_raw(SFREQ, 20.0);

    let out = filter_and_export(&raw, &source(&root), &FilterExport::beta(&native)).unwrap();

    // Native copy carries the new band.
    let reloaded = Raw::read(&native).unwrap();
    assert_eq!(reloaded.info.highpass, Some(13.0));
    assert_eq!(reloaded.info.lowpass, Some(30.0));
    assert_eq!(reloaded.n_times(), raw.n_times());
    assert_eq!(reloaded.info.ch_names(), raw.info.ch_names());

    // BIDS derivative under <root>/derivatives with proc-filter.
    let fpath = out.bids_path.fpath();
    assert!(fpath.starts_with(root.join("derivatives")), "{}", fpath.display());
    assert_eq!(
        fpath.file_name().unwrap().to_str().unwrap(),
        "sub-01_task-audiovisual_run-01_proc-filter_meg.fif"
    );
    assert!(fpath.exists());
    let deriv = Raw::read(&fpath).unwrap();
    assert_eq!(deriv.info.highpass, Some(13.0));
    assert_eq!(deriv.info.lowpass, Some(30.0));

    let meg_dir = root.join("derivatives").join("sub-01").join("meg");
    assert!(meg_dir.join("sub-01_task-audiovisual_run-01_proc-filter_meg.json").exists());
    assert!(meg_dir.join("sub-01_task-audiovisual_run-01_proc-filter_channels.tsv").exists());
    let scans = std::fs::read_to_string(root.join("derivatives/sub-01/sub-01_scans.tsv")).unwrap();
    assert_eq!(scans.lines().count(), 2);

    let desc: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(root.join("derivatives/dataset_description.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(desc["DatasetType"], "derivative");

    // The source recording is left as it was.
    assert_eq!(raw.info.highpass, None);
}

#[test]
fn bids_sidecars_describe_the_filtered_recording() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("ds000248");
    let mut raw = sample_raw(SFREQ, 20.0);
    raw.info.bad_ch_names = vec!["EEG 001".into()];
    let out = filter_and_export(&raw, &source(&root), &FilterExport::beta(dir.path().join("beta_raw.fif"))).unwrap();

    let sidecar_path = out.bids_path.with_extension(".json").fpath();
    let sidecar: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&sidecar_path).unwrap()).unwrap();
    assert_eq!(sidecar["TaskName"], "audiovisual");
    assert_eq!(sidecar["SamplingFrequency"], SFREQ);
    assert_eq!(sidecar["PowerLineFrequency"], 50.0);
    assert_eq!(sidecar["SoftwareFilters"]["FIR"]["HighpassCutoff"], 13.0);
    assert_eq!(sidecar["SoftwareFilters"]["FIR"]["LowpassCutoff"], 30.0);
    assert_eq!(sidecar["MEGChannelCount"], 3);
    assert_eq!(sidecar["EEGChannelCount"], 1);
    assert_eq!(sidecar["EOGChannelCount"], 1);
    assert_eq!(sidecar["TriggerChannelCount"], N_STIM);
    approx::assert_abs_diff_eq!(sidecar["RecordingDuration"].as_f64().unwrap(), 20.0, epsilon = 1e-9);

    let channels_path = out.bids_path.with_suffix("channels").with_extension(".tsv").fpath();
    let tsv = std::fs::read_to_string(&channels_path).unwrap();
    let mut lines = tsv.lines();
    let header: Vec<&str> = lines.next().unwrap().split('\t').collect();
    assert_eq!(
        header,
        ["name", "type", "units", "low_cutoff", "high_cutoff", "description", "sampling_frequency", "status"]
    );
    let rows: Vec<Vec<&str>> = lines.map(|l| l.split('\t').collect()).collect();
    assert_eq!(rows.len(), raw.info.n_chan);
    for row in &rows {
        assert_eq!(row.len(), header.len(), "{row:?}");
        assert_eq!((row[3], row[4], row[6]), ("13", "30", "250"), "{row:?}");
        let expected_status = if row[0] == "EEG 001" { "bad" } else { "good" };
        assert_eq!(row[7], expected_status, "{row:?}");
    }
    let stim: Vec<&Vec<&str>> = rows.iter().filter(|r| r[0].starts_with("STI")).collect();
    assert_eq!(stim.len(), N_STIM);
    assert!(stim.iter().all(|r| r[1] == "TRIG" && r[2] == "n/a"));
    let mag = rows.iter().find(|r| r[0] == "MEG 0111").unwrap();
    assert_eq!((mag[1], mag[2]), ("MEGMAG", "T"));
}

#[test]
fn filtered_data_keeps_beta_and_drops_slow_activity() {
    let dir = tempfile::tempdir().unwrap();
    let raw = sample_raw(SFREQ, 20.0);
    let native = dir.path().join("beta_raw.fif");
    filter_and_export(&raw, &source(&dir.path().join("bids")), &FilterExport::beta(&native)).unwrap();
    let beta = Raw::read(&native).unwrap();

    // Middle 10 s, away from the edges.
    let mid = 1250..3750;
    for (c, ch) in beta.info.chs.iter().enumerate() {
        let x: Vec<f64> = beta.data.row(c).iter().skip(mid.start).take(mid.len()).copied().collect();
        let before: Vec<f64> = raw.data.row(c).iter().skip(mid.start).take(mid.len()).copied().collect();
        match ch.channel_type() {
            ChannelType::Grad | ChannelType::Mag | ChannelType::Eeg => {
                let a20 = tone_amplitude(&before, 20.0, SFREQ);
                assert!((tone_amplitude(&x, 20.0, SFREQ) / a20 - 1.0).abs() < 0.02, "{}", ch.name);
                assert!(tone_amplitude(&x, 3.0, SFREQ) / a20 < 0.01, "{}", ch.name);
            }
            // EOG and stim are not data channels.
            _ => {
                for (a, b) in x.iter().zip(&before) {
                    approx::assert_relative_eq!(*a, *b, max_relative = 1e-6, epsilon = 1e-12);
                }
            }
        }
    }
}

#[test]
fn rerun_with_overwrite_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let raw = sample_raw(SFREQ, 10.0);
    let src = source(&dir.path().join("bids"));
    let params = FilterExport::beta(dir.path().join("beta_raw.fif"));
    let first = filter_and_export(&raw, &src, &params).unwrap();
    let second = filter_and_export(&raw, &src, &params).unwrap();
    assert_eq!(first.bids_path, second.bids_path);

    let scans = std::fs::read_to_string(dir.path().join("bids/derivatives/sub-01/sub-01_scans.tsv")).unwrap();
    assert_eq!(scans.lines().count(), 2, "scans.tsv gained a duplicate row:\n{scans}");
}

#[test]
fn existing_output_without_overwrite_fails() {
    let dir = tempfile::tempdir().unwrap();
    let raw = sample_raw(SFREQ, 10.0);
    let src = source(&dir.path().join("bids"));
    let params = FilterExport::beta(dir.path().join("beta_raw.fif"));
    filter_and_export(&raw, &src, &params).unwrap();

    let no_overwrite = FilterExport { overwrite: false, ..params };
    assert!(filter_and_export(&raw, &src, &no_overwrite).is_err());
}

#[test]
fn band_above_nyquist_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let raw = sample_raw(50.0, 10.0);
    let native = dir.path().join("beta_raw.fif");
    assert!(filter_and_export(&raw, &source(&dir.path().join("bids")), &FilterExport::beta(&native)).is_err());
    assert!(!native.exists());
}
