//! Built-in study configurations, embedded from `configs/*.yaml`.
use anyhow::{bail, Result};

use super::StudyConfig;

/// `(name, yaml)` for every bundled preset.
pub const PRESETS: &[(&str, &str)] = &[
    ("ds000248", include_str!("../../configs/ds000248.yaml")),
    ("ds000248_maxwell", include_str!("../../configs/ds000248_maxwell.yaml")),
];

/// MNE sample data with SSP, derivatives next to the dataset.
pub fn ds000248() -> Result<StudyConfig> {
    load("ds000248")
}

/// MNE sample data with Maxwell filtering and time-frequency conditions,
/// derivatives inside the dataset.
pub fn ds000248_maxwell() -> Result<StudyConfig> {
    load("ds000248_maxwell")
}

pub fn names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}

pub fn load(name: &str) -> Result<StudyConfig> {
    match PRESETS.iter().find(|(n, _)| *n == name) {
        Some((_, yaml)) => StudyConfig::from_yaml_str(yaml),
        None => bail!("unknown preset {name:?}; available: {}", names().collect::<Vec<_>>().join(", ")),
    }
}

pub fn all() -> Result<Vec<(&'static str, StudyConfig)>> {
    PRESETS.iter().map(|(name, _)| Ok((*name, load(name)?))).collect()
}
