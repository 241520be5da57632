//! Study configuration record.
//!
//! [`StudyConfig`] mirrors the keys an MNE-BIDS-Pipeline config file sets.
//! It is deserialized from YAML with unknown keys rejected.  Every optional
//! key that is absent means "use the pipeline default" and is skipped again
//! on serialization, so a load/save cycle keeps the file's key set.
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::fiff::ChannelType;

/// Sensor families the pipeline can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    /// Magnetometers and gradiometers together.
    Meg,
    Mag,
    Grad,
    Eeg,
}

impl SensorType {
    pub fn as_str(self) -> &'static str {
        match self {
            SensorType::Meg  => "meg",
            SensorType::Mag  => "mag",
            SensorType::Grad => "grad",
            SensorType::Eeg  => "eeg",
        }
    }

    pub fn is_meg(self) -> bool {
        !matches!(self, SensorType::Eeg)
    }

    /// Whether channels of `ch_type` belong to this family.
    pub fn covers(self, ch_type: ChannelType) -> bool {
        match self {
            SensorType::Meg  => ch_type.is_meg(),
            SensorType::Mag  => ch_type == ChannelType::Mag,
            SensorType::Grad => ch_type == ChannelType::Grad,
            SensorType::Eeg  => ch_type == ChannelType::Eeg,
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered pair of conditions; the effect is `first − second`.
///
/// Written in YAML as a two-element list: `[Visual, Auditory]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contrast(pub String, pub String);

impl Contrast {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self(a.into(), b.into())
    }

    /// Name the pipeline gives the contrast, `"<a>+<b>"`.
    pub fn name(&self) -> String {
        format!("{}+{}", self.0, self.1)
    }
}

/// Automatic rejection strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectPolicy {
    AutorejectGlobal,
    AutorejectLocal,
}

/// Epoch rejection: either peak-to-peak thresholds per channel type (in the
/// channel's SI unit) or an automatic policy.  The two are exclusive by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reject {
    Policy(RejectPolicy),
    Thresholds(BTreeMap<ChannelType, f64>),
}

impl Reject {
    pub fn threshold(&self, ch_type: ChannelType) -> Option<f64> {
        match self {
            Reject::Thresholds(t) => t.get(&ch_type).copied(),
            Reject::Policy(_) => None,
        }
    }
}

/// Where the noise covariance comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoiseCovSource {
    /// The empty-room recording.
    Emptyroom,
    /// The resting-state recording.
    Rest,
    /// Diagonal covariance from nominal sensor noise.
    AdHoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoiseCov {
    Source(NoiseCovSource),
    /// Pre-stimulus window `[tmin, tmax]` of the epochs; `None` is the edge.
    Window(Option<f64>, Option<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialFilter {
    /// Signal-space projection.
    Ssp,
    Ica,
}

/// Number of projection vectors per sensor type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjCounts {
    #[serde(default)]
    pub n_mag:  u32,
    #[serde(default)]
    pub n_grad: u32,
    #[serde(default)]
    pub n_eeg:  u32,
}

impl ProjCounts {
    pub fn total(&self) -> u32 {
        self.n_mag + self.n_grad + self.n_eeg
    }
}

/// MRI sequence used to build the BEM surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BemMriImages {
    #[serde(rename = "FLASH")]
    Flash,
    #[serde(rename = "T1")]
    T1,
    /// FLASH when available, T1 otherwise.
    #[serde(rename = "auto")]
    Auto,
}

/// What the pipeline does when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    Abort,
    Continue,
    /// Stop and drop into a debugger.
    Debug,
}

/// Declarative parameters of one MEG/EEG study.
///
/// `deriv_root` and `subjects_dir` may contain the placeholder
/// `{bids_root}`, which [`StudyConfig::from_yaml_str`] expands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    pub study_name:   String,
    pub bids_root:    PathBuf,
    pub deriv_root:   PathBuf,
    /// FreeSurfer subjects directory.
    pub subjects_dir: PathBuf,

    /// BIDS subject labels, without the `sub-` prefix.
    pub subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<Vec<String>>,

    /// Event renames applied before conditions are matched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rename_events: BTreeMap<String, String>,
    /// Hierarchical event labels; `/` separates levels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contrasts: Vec<Contrast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_frequency_conditions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode: Option<bool>,

    pub ch_types: Vec<SensorType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l_freq: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_freq: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epochs_tmin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epochs_tmax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<(Option<f64>, Option<f64>)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject: Option<Reject>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_maxwell_filter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mf_reference_run: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find_flat_channels_meg: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find_noisy_channels_meg: Option<bool>,

    /// Process the empty-room recording alongside the experimental runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_er: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_cov: Option<NoiseCov>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_filter: Option<SpatialFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_proj_eog: Option<ProjCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_proj_ecg: Option<ProjCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecg_proj_from_average: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eog_proj_from_average: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bem_mri_images: Option<BemMriImages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recreate_bem: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recreate_scalp_surface: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<OnError>,
}
