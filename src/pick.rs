//! Channel selection by type, after `mne.pick_types`.
use crate::fiff::{ChannelType, MeasInfo};

/// Which MEG sensors to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MegPick {
    #[default]
    None,
    All,
    Mag,
    Grad,
}

/// Channel-type selection.  `Default` selects nothing and excludes bads.
///
/// ```
/// use meeg_study::pick::PickTypes;
/// let stim_only = PickTypes { stim: true, ..PickTypes::default() };
/// assert!(stim_only.exclude_bads);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickTypes {
    pub meg:  MegPick,
    pub eeg:  bool,
    pub stim: bool,
    pub eog:  bool,
    pub ecg:  bool,
    pub emg:  bool,
    pub misc: bool,
    /// Leave out channels listed in `info.bad_ch_names`.
    pub exclude_bads: bool,
}

impl Default for PickTypes {
    fn default() -> Self {
        Self {
            meg: MegPick::None,
            eeg: false,
            stim: false,
            eog: false,
            ecg: false,
            emg: false,
            misc: false,
            exclude_bads: true,
        }
    }
}

impl PickTypes {
    /// Select exactly one channel type.
    pub fn only(ch_type: ChannelType) -> Self {
        let mut p = Self::default();
        match ch_type {
            ChannelType::Mag  => p.meg = MegPick::Mag,
            ChannelType::Grad => p.meg = MegPick::Grad,
            ChannelType::Eeg  => p.eeg = true,
            ChannelType::Stim => p.stim = true,
            ChannelType::Eog  => p.eog = true,
            ChannelType::Ecg  => p.ecg = true,
            ChannelType::Emg  => p.emg = true,
            // sEEG and ECoG have no flag of their own and ride with misc.
            ChannelType::Misc | ChannelType::Seeg | ChannelType::Ecog => p.misc = true,
        }
        p
    }

    pub fn accepts(&self, ch_type: ChannelType) -> bool {
        match ch_type {
            ChannelType::Mag  => matches!(self.meg, MegPick::All | MegPick::Mag),
            ChannelType::Grad => matches!(self.meg, MegPick::All | MegPick::Grad),
            ChannelType::Eeg  => self.eeg,
            ChannelType::Stim => self.stim,
            ChannelType::Eog  => self.eog,
            ChannelType::Ecg  => self.ecg,
            ChannelType::Emg  => self.emg,
            ChannelType::Misc | ChannelType::Seeg | ChannelType::Ecog => self.misc,
        }
    }
}

/// Ascending indices of the channels selected by `spec`.  A type missing
/// from the recording simply contributes nothing.
pub fn pick_types(info: &MeasInfo, spec: &PickTypes) -> Vec<usize> {
    info.chs
        .iter()
        .enumerate()
        .filter(|(i, ch)| spec.accepts(ch.channel_type()) && !(spec.exclude_bads && info.is_bad(*i)))
        .map(|(i, _)| i)
        .collect()
}
