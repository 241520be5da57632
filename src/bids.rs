//! BIDS paths and raw-data export.
//!
//! [`BidsPath`] names one recording in a BIDS tree by its entities; it is
//! an immutable value, every `with_*` call returns an updated copy (the
//! equivalent of `bp.copy().update(...)` in mne-bids).
//!
//! ```
//! use meeg_study::bids::BidsPath;
//!
//! let bp = BidsPath::new("ds000248", "01").with_task("audiovisual").with_run("01");
//! let out = bp.with_root("ds000248/derivatives").with_processing("filter");
//! assert_eq!(
//!     out.with_suffix("meg").with_extension(".fif").basename(),
//!     "sub-01_task-audiovisual_run-01_proc-filter_meg.fif",
//! );
//! ```
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::{debug, info};

use crate::fiff::{check_writable, ChannelType};
use crate::raw::Raw;

pub const BIDS_VERSION: &str = "1.9.0";

/// Modality folder of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datatype {
    Meg,
    Eeg,
}

impl Datatype {
    pub fn as_str(self) -> &'static str {
        match self {
            Datatype::Meg => "meg",
            Datatype::Eeg => "eeg",
        }
    }

    /// `meg` when the recording has any MEG sensor, `eeg` otherwise.
    pub fn infer(raw: &Raw) -> Self {
        if raw.info.chs.iter().any(|c| c.channel_type().is_meg()) {
            Datatype::Meg
        } else {
            Datatype::Eeg
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidsPath {
    pub root:        PathBuf,
    pub subject:     String,
    pub session:     Option<String>,
    pub task:        Option<String>,
    pub acquisition: Option<String>,
    pub run:         Option<String>,
    pub processing:  Option<String>,
    pub recording:   Option<String>,
    pub split:       Option<String>,
    pub datatype:    Option<Datatype>,
    pub suffix:      Option<String>,
    /// Including the leading dot, e.g. `.fif`.
    pub extension:   Option<String>,
}

impl BidsPath {
    pub fn new(root: impl Into<PathBuf>, subject: impl Into<String>) -> Self {
        BidsPath {
            root: root.into(),
            subject: subject.into(),
            session: None,
            task: None,
            acquisition: None,
            run: None,
            processing: None,
            recording: None,
            split: None,
            datatype: None,
            suffix: None,
            extension: None,
        }
    }

    pub fn with_root(&self, root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ..self.clone() }
    }

    pub fn with_session(&self, label: impl Into<String>) -> Self {
        Self { session: Some(label.into()), ..self.clone() }
    }

    pub fn with_task(&self, label: impl Into<String>) -> Self {
        Self { task: Some(label.into()), ..self.clone() }
    }

    pub fn with_acquisition(&self, label: impl Into<String>) -> Self {
        Self { acquisition: Some(label.into()), ..self.clone() }
    }

    pub fn with_run(&self, label: impl Into<String>) -> Self {
        Self { run: Some(label.into()), ..self.clone() }
    }

    pub fn with_processing(&self, label: impl Into<String>) -> Self {
        Self { processing: Some(label.into()), ..self.clone() }
    }

    pub fn with_recording(&self, label: impl Into<String>) -> Self {
        Self { recording: Some(label.into()), ..self.clone() }
    }

    pub fn with_split(&self, label: impl Into<String>) -> Self {
        Self { split: Some(label.into()), ..self.clone() }
    }

    pub fn with_datatype(&self, datatype: Datatype) -> Self {
        Self { datatype: Some(datatype), ..self.clone() }
    }

    pub fn with_suffix(&self, suffix: impl Into<String>) -> Self {
        Self { suffix: Some(suffix.into()), ..self.clone() }
    }

    pub fn with_extension(&self, extension: impl Into<String>) -> Self {
        Self { extension: Some(extension.into()), ..self.clone() }
    }

    /// `(key, label)` pairs in BIDS entity order.
    pub fn entities(&self) -> Vec<(&'static str, &str)> {
        let optional = [
            ("ses", &self.session),
            ("task", &self.task),
            ("acq", &self.acquisition),
            ("run", &self.run),
            ("proc", &self.processing),
            ("rec", &self.recording),
            ("split", &self.split),
        ];
        std::iter::once(("sub", self.subject.as_str()))
            .chain(optional.into_iter().filter_map(|(k, v)| v.as_deref().map(|v| (k, v))))
            .collect()
    }

    /// Every label must be a non-empty run of ASCII letters and digits.
    pub fn validate(&self) -> Result<()> {
        for (key, label) in self.entities() {
            if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphanumeric()) {
                bail!("invalid BIDS {key} label {label:?}: use letters and digits only");
            }
        }
        if let Some(ext) = &self.extension {
            if !ext.starts_with('.') {
                bail!("BIDS extension {ext:?} must start with '.'");
            }
        }
        Ok(())
    }

    /// Entities joined by `_`, then `_suffix` and the extension if set.
    pub fn basename(&self) -> String {
        let mut name = self
            .entities()
            .iter()
            .map(|(k, v)| format!("{k}-{v}"))
            .collect::<Vec<_>>()
            .join("_");
        if let Some(suffix) = &self.suffix {
            name.push('_');
            name.push_str(suffix);
        }
        if let Some(ext) = &self.extension {
            name.push_str(ext);
        }
        name
    }

    /// `root/sub-X[/ses-Y]`.
    pub fn session_dir(&self) -> PathBuf {
        let mut dir = self.root.join(format!("sub-{}", self.subject));
        if let Some(ses) = &self.session {
            dir.push(format!("ses-{ses}"));
        }
        dir
    }

    /// `root/sub-X[/ses-Y][/datatype]`.
    pub fn directory(&self) -> PathBuf {
        let dir = self.session_dir();
        match self.datatype {
            Some(dt) => dir.join(dt.as_str()),
            None     => dir,
        }
    }

    pub fn fpath(&self) -> PathBuf {
        self.directory().join(self.basename())
    }
}

impl fmt::Display for BidsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fpath().display())
    }
}

/// Options of [`write_raw_bids`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Replace an existing data file and dataset description.
    pub overwrite: bool,
    /// Accept data that lives in memory rather than in an unmodified file
    /// on disk.  Always the case for [`Raw`], so this must be set.
    pub allow_preload: bool,
}

/// Write `raw` into the BIDS tree described by `bids_path`.
///
/// Creates, next to the FIFF data file, the datatype sidecar JSON, the
/// `channels.tsv`, a row in the session's `scans.tsv` and, if missing, the
/// root `dataset_description.json`.  Unset datatype, suffix and extension
/// default to the inferred datatype and `.fif`.  Returns the completed
/// path.
pub fn write_raw_bids(raw: &Raw, bids_path: &BidsPath, opts: &WriteOptions) -> Result<BidsPath> {
    if !opts.allow_preload {
        bail!("the recording is held in memory; set allow_preload to write it");
    }
    let datatype = bids_path.datatype.unwrap_or_else(|| Datatype::infer(raw));
    let target = BidsPath {
        datatype: Some(datatype),
        suffix: Some(bids_path.suffix.clone().unwrap_or_else(|| datatype.as_str().to_string())),
        extension: Some(bids_path.extension.clone().unwrap_or_else(|| ".fif".to_string())),
        ..bids_path.clone()
    };
    target.validate()?;
    if target.extension.as_deref() != Some(".fif") {
        bail!("only FIF output is supported, got {:?}", target.extension);
    }

    let fpath = target.fpath();
    if fpath.exists() && !opts.overwrite {
        bail!("{} already exists; set overwrite to replace it", fpath.display());
    }
    check_writable(&raw.info, &raw.data, raw.first_samp)?;
    let dir = target.directory();
    fs::create_dir_all(&dir)
        .with_context(|| format!("create {}", dir.display()))?;

    write_dataset_description(&target, opts.overwrite)?;
    raw.save(&fpath, opts.overwrite)?;

    let sidecar = target.with_extension(".json");
    write_text(&sidecar.fpath(), &serde_json::to_string_pretty(&sidecar_json(raw, &target))?)?;

    let channels = target.with_suffix("channels").with_extension(".tsv");
    write_text(&channels.fpath(), &channels_tsv(raw))?;

    update_scans(&target)?;
    info!(path = %fpath.display(), datatype = %datatype, "wrote BIDS raw");
    Ok(target)
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), "wrote BIDS sidecar");
    Ok(())
}

fn write_dataset_description(bids_path: &BidsPath, overwrite: bool) -> Result<()> {
    let path = bids_path.root.join("dataset_description.json");
    if path.exists() && !overwrite {
        return Ok(());
    }
    let derivative = bids_path.processing.is_some();
    let dataset_type = if derivative { "derivative" } else { "raw" };
    let mut desc = json!({
        "Name": " ",
        "BIDSVersion": BIDS_VERSION,
        "DatasetType": dataset_type,
    });
    if derivative {
        desc["GeneratedBy"] = json!([{
            "Name": env!("CARGO_PKG_NAME"),
            "Version": env!("CARGO_PKG_VERSION"),
        }]);
    }
    write_text(&path, &serde_json::to_string_pretty(&desc)?)
}

fn sidecar_json(raw: &Raw, bids_path: &BidsPath) -> serde_json::Value {
    let info = &raw.info;
    let count = |types: &[ChannelType]| {
        info.chs.iter().filter(|c| types.contains(&c.channel_type())).count()
    };
    let or_na = |v: Option<f64>| v.map_or(json!("n/a"), |f| json!(f));
    let filters = if info.highpass.is_some() || info.lowpass.is_some() {
        json!({ "FIR": { "HighpassCutoff": or_na(info.highpass), "LowpassCutoff": or_na(info.lowpass) } })
    } else {
        json!("n/a")
    };

    let mut sidecar = json!({
        "TaskName": bids_path.task.as_deref().unwrap_or("n/a"),
        "SamplingFrequency": info.sfreq,
        "PowerLineFrequency": or_na(info.line_freq),
        "SoftwareFilters": filters,
        "RecordingDuration": raw.duration_secs(),
        "RecordingType": "continuous",
        "EEGChannelCount": count(&[ChannelType::Eeg]),
        "EOGChannelCount": count(&[ChannelType::Eog]),
        "ECGChannelCount": count(&[ChannelType::Ecg]),
        "EMGChannelCount": count(&[ChannelType::Emg]),
        "MiscChannelCount": count(&[ChannelType::Misc]),
        "TriggerChannelCount": count(&[ChannelType::Stim]),
    });
    if bids_path.datatype == Some(Datatype::Meg) {
        sidecar["MEGChannelCount"] = json!(count(&[ChannelType::Mag, ChannelType::Grad]));
        sidecar["DewarPosition"] = json!("n/a");
    } else {
        sidecar["EEGReference"] = json!("n/a");
    }
    sidecar
}

fn channel_description(ch_type: ChannelType) -> &'static str {
    match ch_type {
        ChannelType::Mag  => "Magnetometer",
        ChannelType::Grad => "Planar Gradiometer",
        ChannelType::Eeg  => "ElectroEncephaloGram",
        ChannelType::Stim => "Trigger",
        ChannelType::Eog  => "ElectroOculoGram",
        ChannelType::Ecg  => "ElectroCardioGram",
        ChannelType::Emg  => "ElectroMyoGram",
        ChannelType::Seeg => "StereoEEG",
        ChannelType::Ecog => "Electrocorticography",
        ChannelType::Misc => "Miscellaneous",
    }
}

fn channels_tsv(raw: &Raw) -> String {
    let info = &raw.info;
    let fmt_hz = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |f| f.to_string());
    let mut out = String::from(
        "name\ttype\tunits\tlow_cutoff\thigh_cutoff\tdescription\tsampling_frequency\tstatus\n",
    );
    for (i, ch) in info.chs.iter().enumerate() {
        let ch_type = ch.channel_type();
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            ch.name,
            ch_type.bids_type(),
            ch_type.bids_units(),
            fmt_hz(info.highpass),
            fmt_hz(info.lowpass),
            channel_description(ch_type),
            info.sfreq,
            if info.is_bad(i) { "bad" } else { "good" },
        ));
    }
    out
}

/// Add (or keep) the data file's row in `sub-X[_ses-Y]_scans.tsv`.
fn update_scans(bids_path: &BidsPath) -> Result<()> {
    let mut name = format!("sub-{}", bids_path.subject);
    if let Some(ses) = &bids_path.session {
        name.push_str(&format!("_ses-{ses}"));
    }
    let path = bids_path.session_dir().join(format!("{name}_scans.tsv"));
    let datatype = bids_path.datatype.map_or("", |d| d.as_str());
    let filename = format!("{datatype}/{}", bids_path.basename());

    let mut text = match fs::read_to_string(&path) {
        Ok(existing) => existing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => "filename\tacq_time\n".to_string(),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    if text.lines().skip(1).any(|l| l.split('\t').next() == Some(filename.as_str())) {
        return Ok(());
    }
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&format!("{filename}\tn/a\n"));
    write_text(&path, &text)
}
