//! Study configuration: loading, placeholder expansion and validation.
//!
//! ```
//! use meeg_study::config::StudyConfig;
//!
//! let cfg = StudyConfig::from_yaml_str(r#"
//! study_name: demo
//! bids_root: /data/demo
//! deriv_root: "{bids_root}/derivatives/pipeline"
//! subjects_dir: /data/freesurfer
//! subjects: ["01", "02"]
//! exclude_subjects: ["02"]
//! ch_types: [eeg]
//! "#).unwrap();
//! assert_eq!(cfg.deriv_root.to_str(), Some("/data/demo/derivatives/pipeline"));
//! assert_eq!(cfg.subjects_to_process(), vec!["01"]);
//! ```
pub mod presets;
pub mod schema;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

pub use schema::{
    BemMriImages, Contrast, NoiseCov, NoiseCovSource, OnError, ProjCounts, Reject, RejectPolicy,
    SensorType, SpatialFilter, StudyConfig,
};

use crate::fiff::ChannelType;

/// Placeholder replaced by `bids_root` in the derived paths.
pub const BIDS_ROOT_PLACEHOLDER: &str = "{bids_root}";

/// Outcome of [`StudyConfig::check`].  Errors make a configuration
/// unusable; warnings flag settings the pipeline will ignore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub errors:   Vec<String>,
    pub warnings: Vec<String>,
}

impl Report {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl StudyConfig {
    /// Parse, expand `{bids_root}` and validate.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let mut cfg: StudyConfig = serde_yaml::from_str(text).context("parsing study configuration")?;
        cfg.expand_placeholders()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let cfg = Self::from_yaml_str(&text).with_context(|| format!("loading {}", path.display()))?;
        debug!(path = %path.display(), study = %cfg.study_name, "loaded study configuration");
        Ok(cfg)
    }

    /// Serialize to YAML.  Placeholders are already expanded at this point.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Substitute `bids_root` into `deriv_root` and `subjects_dir`.
    /// Paths are not normalised, so `{bids_root}/..` stays as written.
    pub fn expand_placeholders(&mut self) -> Result<()> {
        let root = self.bids_root.to_string_lossy().into_owned();
        if root.contains(BIDS_ROOT_PLACEHOLDER) {
            bail!("bids_root cannot refer to itself: {root}");
        }
        for path in [&mut self.deriv_root, &mut self.subjects_dir] {
            let text = path.to_string_lossy();
            if text.contains(BIDS_ROOT_PLACEHOLDER) {
                *path = PathBuf::from(text.replace(BIDS_ROOT_PLACEHOLDER, &root));
            }
        }
        Ok(())
    }

    /// Log warnings and fail with every error found.
    pub fn validate(&self) -> Result<()> {
        let report = self.check();
        for w in &report.warnings {
            warn!(study = %self.study_name, "{w}");
        }
        if !report.is_ok() {
            bail!(
                "invalid configuration for study {:?}:\n  - {}",
                self.study_name,
                report.errors.join("\n  - ")
            );
        }
        Ok(())
    }

    pub fn check(&self) -> Report {
        let mut r = Report::default();
        let mut err = |m: String| r.errors.push(m);

        if self.study_name.trim().is_empty() {
            err("study_name is empty".into());
        }
        for (key, path) in [
            ("bids_root", &self.bids_root),
            ("deriv_root", &self.deriv_root),
            ("subjects_dir", &self.subjects_dir),
        ] {
            if path.as_os_str().is_empty() {
                err(format!("{key} is empty"));
            }
        }

        // Subjects.
        if self.subjects.is_empty() {
            err("subjects must list at least one subject".into());
        }
        if let Some(dup) = first_duplicate(&self.subjects) {
            err(format!("subject {dup:?} is listed twice"));
        }
        for s in self.subjects.iter().chain(&self.exclude_subjects) {
            if !is_bids_label(s) {
                err(format!("subject label {s:?} must be non-empty and alphanumeric"));
            }
        }
        if !self.subjects.is_empty() && self.subjects_to_process().is_empty() {
            err("every subject is excluded".into());
        }
        for label in self.runs.iter().flatten().chain(self.sessions.iter().flatten()).chain(&self.task) {
            if !is_bids_label(label) {
                err(format!("BIDS label {label:?} must be non-empty and alphanumeric"));
            }
        }

        // Conditions and contrasts.
        if let Some(dup) = first_duplicate(&self.conditions) {
            err(format!("condition {dup:?} is listed twice"));
        }
        if self.conditions.iter().any(|c| c.split('/').any(str::is_empty)) {
            err("condition labels need non-empty parts between '/'".into());
        }
        for c in &self.contrasts {
            for side in [&c.0, &c.1] {
                if !self.conditions.contains(side) {
                    err(format!("contrast {} refers to unknown condition {side:?}", c.name()));
                }
            }
            if c.0 == c.1 {
                err(format!("contrast {} compares a condition with itself", c.name()));
            }
        }
        for c in self.time_frequency_conditions.iter().flatten() {
            if !self.conditions.contains(c) {
                err(format!("time_frequency_conditions refers to unknown condition {c:?}"));
            }
        }
        for (from, to) in &self.rename_events {
            if from.is_empty() || to.is_empty() {
                err("rename_events cannot map from or to an empty name".into());
            }
        }

        // Sensors.
        if self.ch_types.is_empty() {
            err("ch_types must list at least one sensor type".into());
        }
        if let Some(dup) = first_duplicate(&self.ch_types) {
            err(format!("sensor type {dup} is listed twice"));
        }

        // Frequencies and windows.
        for (key, f) in [("l_freq", self.l_freq), ("h_freq", self.h_freq)] {
            if let Some(f) = f {
                if !(f.is_finite() && f > 0.0) {
                    err(format!("{key} must be positive, got {f}"));
                }
            }
        }
        if let (Some(l), Some(h)) = (self.l_freq, self.h_freq) {
            if l >= h {
                err(format!("l_freq ({l}) must be below h_freq ({h})"));
            }
        }
        if let (Some(t0), Some(t1)) = (self.epochs_tmin, self.epochs_tmax) {
            if t0 >= t1 {
                err(format!("epochs_tmin ({t0}) must be below epochs_tmax ({t1})"));
            }
        }
        if let Some((Some(b0), Some(b1))) = self.baseline {
            if b0 > b1 {
                err(format!("baseline start ({b0}) is after its end ({b1})"));
            }
        }
        if let Some(NoiseCov::Window(Some(t0), Some(t1))) = self.noise_cov {
            if t0 >= t1 {
                err(format!("noise_cov window start ({t0}) must be below its end ({t1})"));
            }
        }

        if let Some(Reject::Thresholds(t)) = &self.reject {
            for (ch_type, v) in t {
                if !(v.is_finite() && *v > 0.0) {
                    err(format!("reject threshold for {ch_type} must be positive, got {v}"));
                }
            }
        }

        if self.noise_cov == Some(NoiseCov::Source(NoiseCovSource::Emptyroom)) && self.process_er != Some(true) {
            err("noise_cov: emptyroom requires process_er: true".into());
        }

        let maxwell = self.use_maxwell_filter == Some(true);
        if maxwell && !self.ch_types.iter().any(|t| t.is_meg()) {
            err("use_maxwell_filter needs MEG in ch_types".into());
        }

        let warn_list = &mut r.warnings;
        let mut warn = |m: String| warn_list.push(m);

        if !maxwell {
            let set = [
                ("mf_reference_run", self.mf_reference_run.is_some()),
                ("find_flat_channels_meg", self.find_flat_channels_meg == Some(true)),
                ("find_noisy_channels_meg", self.find_noisy_channels_meg == Some(true)),
            ];
            for (key, on) in set {
                if on {
                    warn(format!("{key} has no effect without use_maxwell_filter"));
                }
            }
        }
        if let (Some(run), Some(runs)) = (&self.mf_reference_run, &self.runs) {
            if !runs.contains(run) {
                warn(format!("mf_reference_run {run:?} is not in runs"));
            }
        }
        for s in &self.exclude_subjects {
            if !self.subjects.contains(s) {
                warn(format!("excluded subject {s:?} is not in subjects"));
            }
        }
        if let Some(Reject::Thresholds(t)) = &self.reject {
            for ch_type in t.keys() {
                let artifact = matches!(ch_type, ChannelType::Eog | ChannelType::Ecg);
                if !artifact && !self.ch_types.iter().any(|s| s.covers(*ch_type)) {
                    warn(format!("reject threshold for {ch_type} is unused with ch_types {:?}", self.ch_types));
                }
            }
        }
        let has_eeg = self.ch_types.contains(&SensorType::Eeg);
        for (key, counts) in [("n_proj_eog", self.n_proj_eog), ("n_proj_ecg", self.n_proj_ecg)] {
            if counts.is_some_and(|c| c.n_eeg > 0) && !has_eeg {
                warn(format!("{key}.n_eeg is ignored without eeg in ch_types"));
            }
        }
        let has_projectors = self.n_proj_eog.is_some() || self.n_proj_ecg.is_some();
        if has_projectors && self.spatial_filter != Some(SpatialFilter::Ssp) {
            warn("projector counts are ignored without spatial_filter: ssp".into());
        }
        if self.decode == Some(true) && self.contrasts.is_empty() {
            warn("decode is on but there are no contrasts to decode".into());
        }
        r
    }

    /// `subjects` minus `exclude_subjects`, in order.
    pub fn subjects_to_process(&self) -> Vec<&str> {
        self.subjects
            .iter()
            .filter(|s| !self.exclude_subjects.contains(s))
            .map(String::as_str)
            .collect()
    }

    /// Derivative directory of one subject.
    pub fn subject_deriv_dir(&self, subject: &str) -> PathBuf {
        self.deriv_root.join(format!("sub-{subject}"))
    }

    /// Event name after `rename_events`.
    pub fn canonical_event<'a>(&'a self, event: &'a str) -> &'a str {
        self.rename_events.get(event).map_or(event, String::as_str)
    }

    /// Hierarchical match: every `/`-separated tag of `condition` is a tag
    /// of the (renamed) `event`, so `Auditory` selects `Auditory/Left`.
    pub fn condition_matches(&self, condition: &str, event: &str) -> bool {
        let event = self.canonical_event(event);
        let tags: BTreeSet<&str> = event.split('/').collect();
        condition.split('/').all(|t| tags.contains(t))
    }

    /// Configured conditions that select `event`.
    pub fn conditions_for_event(&self, event: &str) -> Vec<&str> {
        self.conditions
            .iter()
            .filter(|c| self.condition_matches(c, event))
            .map(String::as_str)
            .collect()
    }
}

fn is_bids_label(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn first_duplicate<T: Ord>(items: &[T]) -> Option<&T> {
    let mut seen = BTreeSet::new();
    items.iter().find(|x| !seen.insert(*x))
}
