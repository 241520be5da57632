//! Measurement info: the subset of MNE's `Info` needed to filter, save and
//! plot a raw recording.
use std::fmt;
use std::io::{Read, Seek};
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use super::constants::*;
use super::tag::*;
use super::tree::Node;

/// Size of a `FIFFT_CH_INFO_STRUCT` payload.
pub const CH_INFO_BYTES: usize = 96;
/// Longest channel name that fits the 16-byte NUL-terminated field.
pub const CH_NAME_MAX: usize = 15;

// ── Channel type ─────────────────────────────────────────────────────────

/// Physiological category of a channel.
///
/// MEG channels are split by unit: magnetometers measure T, gradiometers
/// T/m.  The lowercase names are the ones used as keys in study
/// configuration files (`reject: {grad: 4.0e-10, mag: 4.0e-12}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Mag,
    Grad,
    Eeg,
    Stim,
    Eog,
    Ecg,
    Emg,
    Misc,
    Seeg,
    Ecog,
}

impl ChannelType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelType::Mag  => "mag",
            ChannelType::Grad => "grad",
            ChannelType::Eeg  => "eeg",
            ChannelType::Stim => "stim",
            ChannelType::Eog  => "eog",
            ChannelType::Ecg  => "ecg",
            ChannelType::Emg  => "emg",
            ChannelType::Misc => "misc",
            ChannelType::Seeg => "seeg",
            ChannelType::Ecog => "ecog",
        }
    }

    /// Channels that `Raw::filter` touches by default (MNE's `picks='data'`).
    pub fn is_data(self) -> bool {
        matches!(
            self,
            ChannelType::Mag | ChannelType::Grad | ChannelType::Eeg | ChannelType::Seeg | ChannelType::Ecog
        )
    }

    pub fn is_meg(self) -> bool {
        matches!(self, ChannelType::Mag | ChannelType::Grad)
    }

    /// FIFF channel kind and unit written for this type.
    pub fn fiff_kind_unit(self) -> (i32, i32) {
        match self {
            ChannelType::Mag  => (FIFFV_MEG_CH, FIFF_UNIT_T),
            ChannelType::Grad => (FIFFV_MEG_CH, FIFF_UNIT_T_M),
            ChannelType::Eeg  => (FIFFV_EEG_CH, FIFF_UNIT_V),
            ChannelType::Stim => (FIFFV_STIM_CH, FIFF_UNIT_NONE),
            ChannelType::Eog  => (FIFFV_EOG_CH, FIFF_UNIT_V),
            ChannelType::Ecg  => (FIFFV_ECG_CH, FIFF_UNIT_V),
            ChannelType::Emg  => (FIFFV_EMG_CH, FIFF_UNIT_V),
            ChannelType::Misc => (FIFFV_MISC_CH, FIFF_UNIT_V),
            ChannelType::Seeg => (FIFFV_SEEG_CH, FIFF_UNIT_V),
            ChannelType::Ecog => (FIFFV_ECOG_CH, FIFF_UNIT_V),
        }
    }

    /// Channel type column of a BIDS `channels.tsv`.
    pub fn bids_type(self) -> &'static str {
        match self {
            ChannelType::Mag  => "MEGMAG",
            ChannelType::Grad => "MEGGRADPLANAR",
            ChannelType::Eeg  => "EEG",
            ChannelType::Stim => "TRIG",
            ChannelType::Eog  => "EOG",
            ChannelType::Ecg  => "ECG",
            ChannelType::Emg  => "EMG",
            ChannelType::Misc => "MISC",
            ChannelType::Seeg => "SEEG",
            ChannelType::Ecog => "ECOG",
        }
    }

    /// Units column of a BIDS `channels.tsv`.
    pub fn bids_units(self) -> &'static str {
        match self {
            ChannelType::Mag  => "T",
            ChannelType::Grad => "T/m",
            ChannelType::Stim => "n/a",
            _                 => "V",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Channel info ─────────────────────────────────────────────────────────

/// One `FIFFT_CH_INFO_STRUCT`.
///
/// ```text
///  0  scanno     i32      24  loc        12 × f32
///  4  logno      i32      72  unit       i32
///  8  kind       i32      76  unit_mul   i32
/// 12  range      f32      80  ch_name    16 × u8, NUL-padded Latin-1
/// 16  cal        f32
/// 20  coil_type  i32
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub scan_no:   i32,
    pub log_no:    i32,
    pub kind:      i32,
    pub range:     f32,
    pub cal:       f32,
    pub coil_type: i32,
    pub loc:       [f32; 12],
    pub unit:      i32,
    pub unit_mul:  i32,
    pub name:      String,
}

impl ChannelInfo {
    /// A channel of type `ch_type` at 1-based position `number`, with unit
    /// calibration.
    pub fn new(name: impl Into<String>, ch_type: ChannelType, number: i32) -> Self {
        let (kind, unit) = ch_type.fiff_kind_unit();
        ChannelInfo {
            scan_no: number,
            log_no: number,
            kind,
            range: 1.0,
            cal: 1.0,
            coil_type: 0,
            loc: [0.0; 12],
            unit,
            unit_mul: 0,
            name: name.into(),
        }
    }

    /// `cal × range`, the factor from stored to physical values.
    #[inline]
    pub fn calibration(&self) -> f64 {
        (self.cal as f64) * (self.range as f64)
    }

    pub fn channel_type(&self) -> ChannelType {
        match self.kind {
            FIFFV_MEG_CH if self.unit == FIFF_UNIT_T_M => ChannelType::Grad,
            FIFFV_MEG_CH  => ChannelType::Mag,
            FIFFV_EEG_CH  => ChannelType::Eeg,
            FIFFV_STIM_CH => ChannelType::Stim,
            FIFFV_EOG_CH  => ChannelType::Eog,
            FIFFV_ECG_CH  => ChannelType::Ecg,
            FIFFV_EMG_CH  => ChannelType::Emg,
            FIFFV_SEEG_CH => ChannelType::Seeg,
            FIFFV_ECOG_CH => ChannelType::Ecog,
            _             => ChannelType::Misc,
        }
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < CH_INFO_BYTES {
            bail!("ch_info payload too short: {} bytes (need {CH_INFO_BYTES})", raw.len());
        }
        let i = |o: usize| i32::from_be_bytes([raw[o], raw[o + 1], raw[o + 2], raw[o + 3]]);
        let f = |o: usize| f32::from_be_bytes([raw[o], raw[o + 1], raw[o + 2], raw[o + 3]]);
        let mut loc = [0f32; 12];
        for (k, v) in loc.iter_mut().enumerate() {
            *v = f(24 + 4 * k);
        }
        let name_bytes = &raw[80..96];
        let end = name_bytes.iter().position(|&b| b == 0).unwrap_or(16);
        Ok(ChannelInfo {
            scan_no:   i(0),
            log_no:    i(4),
            kind:      i(8),
            range:     f(12),
            cal:       f(16),
            coil_type: i(20),
            loc,
            unit:      i(72),
            unit_mul:  i(76),
            name:      name_bytes[..end].iter().map(|&b| b as char).collect(),
        })
    }

    /// Encode as a `FIFFT_CH_INFO_STRUCT` payload.
    ///
    /// Fails for names longer than [`CH_NAME_MAX`] or outside Latin-1.
    pub fn to_bytes(&self) -> Result<[u8; CH_INFO_BYTES]> {
        let name = latin1(&self.name)?;
        if name.len() > CH_NAME_MAX {
            bail!("channel name {:?} exceeds {CH_NAME_MAX} characters", self.name);
        }
        let mut out = [0u8; CH_INFO_BYTES];
        out[0..4].copy_from_slice(&self.scan_no.to_be_bytes());
        out[4..8].copy_from_slice(&self.log_no.to_be_bytes());
        out[8..12].copy_from_slice(&self.kind.to_be_bytes());
        out[12..16].copy_from_slice(&self.range.to_be_bytes());
        out[16..20].copy_from_slice(&self.cal.to_be_bytes());
        out[20..24].copy_from_slice(&self.coil_type.to_be_bytes());
        for (k, v) in self.loc.iter().enumerate() {
            out[24 + 4 * k..28 + 4 * k].copy_from_slice(&v.to_be_bytes());
        }
        out[72..76].copy_from_slice(&self.unit.to_be_bytes());
        out[76..80].copy_from_slice(&self.unit_mul.to_be_bytes());
        out[80..80 + name.len()].copy_from_slice(&name);
        Ok(out)
    }
}

/// Encode `s` as Latin-1.
pub(crate) fn latin1(s: &str) -> Result<Vec<u8>> {
    s.chars()
        .map(|c| u8::try_from(u32::from(c)).map_err(|_| anyhow!("{c:?} is not Latin-1 in {s:?}")))
        .collect()
}

// ── Measurement info ─────────────────────────────────────────────────────

/// Contents of `FIFFB_MEAS_INFO`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasInfo {
    pub n_chan:       usize,
    pub sfreq:        f64,
    /// Lowpass corner of the data in Hz; `None` when never set.
    pub lowpass:      Option<f64>,
    /// Highpass corner of the data in Hz; `None` when never set.
    pub highpass:     Option<f64>,
    pub line_freq:    Option<f64>,
    pub chs:          Vec<ChannelInfo>,
    pub bad_ch_names: Vec<String>,
    pub experimenter: Option<String>,
    pub description:  Option<String>,
}

impl MeasInfo {
    /// Info for a fresh acquisition: no filter band yet, no bads.
    pub fn new(sfreq: f64, chs: Vec<ChannelInfo>) -> Self {
        MeasInfo {
            n_chan: chs.len(),
            sfreq,
            lowpass: None,
            highpass: None,
            line_freq: None,
            chs,
            bad_ch_names: Vec::new(),
            experimenter: None,
            description: None,
        }
    }

    pub fn cals(&self) -> Vec<f64> {
        self.chs.iter().map(|c| c.calibration()).collect()
    }

    pub fn ch_names(&self) -> Vec<&str> {
        self.chs.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_bad(&self, idx: usize) -> bool {
        self.chs
            .get(idx)
            .is_some_and(|c| self.bad_ch_names.iter().any(|b| *b == c.name))
    }

    /// Number of channels of each type, in [`ChannelType`] order.
    pub fn type_counts(&self) -> Vec<(ChannelType, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for ch in &self.chs {
            *counts.entry(ch.channel_type()).or_insert(0) += 1;
        }
        counts.into_iter().collect()
    }

    pub fn nyquist(&self) -> f64 {
        self.sfreq / 2.0
    }
}

/// Read `MeasInfo` from the `FIFFB_MEAS_INFO` block of `tree`.
pub fn read_meas_info<R: Read + Seek>(reader: &mut R, tree: &Node) -> Result<MeasInfo> {
    let info_node = tree
        .find_block(FIFFB_MEAS)
        .ok_or_else(|| anyhow!("FIFFB_MEAS block not found"))?
        .find_block(FIFFB_MEAS_INFO)
        .ok_or_else(|| anyhow!("FIFFB_MEAS_INFO block not found"))?;

    let mut n_chan = None::<usize>;
    let mut sfreq  = None::<f64>;
    let mut info   = MeasInfo::new(0.0, Vec::new());

    // NaN marks an unset corner frequency.
    let finite = |v: f32| v.is_finite().then_some(v as f64);

    for ent in &info_node.entries {
        match ent.kind {
            FIFF_NCHAN        => n_chan = Some(read_i32(reader, ent)?.max(0) as usize),
            FIFF_SFREQ        => sfreq = Some(read_f32(reader, ent)? as f64),
            FIFF_LOWPASS      => info.lowpass = finite(read_f32(reader, ent)?),
            FIFF_HIGHPASS     => info.highpass = finite(read_f32(reader, ent)?),
            FIFF_LINE_FREQ    => info.line_freq = finite(read_f32(reader, ent)?),
            FIFF_CH_INFO      => info.chs.push(ChannelInfo::from_bytes(&read_raw_bytes(reader, ent)?)?),
            FIFF_BAD_CHS => {
                info.bad_ch_names = read_string(reader, ent)?
                    .split(':')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            FIFF_EXPERIMENTER => info.experimenter = Some(read_string(reader, ent)?),
            FIFF_DESCRIPTION  => info.description = Some(read_string(reader, ent)?),
            _ => {}
        }
    }

    info.n_chan = n_chan.ok_or_else(|| anyhow!("FIFF_NCHAN not found"))?;
    info.sfreq  = sfreq.ok_or_else(|| anyhow!("FIFF_SFREQ not found"))?;
    if info.chs.len() != info.n_chan {
        bail!("expected {} ch_info structs, got {}", info.n_chan, info.chs.len());
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ch_info_bytes_round_trip() {
        let mut ch = ChannelInfo::new("MEG 0113", ChannelType::Grad, 3);
        ch.cal = 3.1e-4;
        ch.loc[0] = -0.1066;
        let bytes = ch.to_bytes().unwrap();
        let back = ChannelInfo::from_bytes(&bytes).unwrap();
        assert_eq!(back, ch);
        assert_eq!(back.channel_type(), ChannelType::Grad);
    }

    #[test]
    fn meg_unit_distinguishes_mag_and_grad() {
        assert_eq!(ChannelInfo::new("MEG 0111", ChannelType::Mag, 1).channel_type(), ChannelType::Mag);
        assert_eq!(ChannelInfo::new("MEG 0112", ChannelType::Grad, 2).channel_type(), ChannelType::Grad);
        assert_eq!(ChannelInfo::new("STI 014", ChannelType::Stim, 3).channel_type(), ChannelType::Stim);
    }

    #[test]
    fn long_or_non_latin1_names_rejected() {
        assert!(ChannelInfo::new("A-very-long-channel", ChannelType::Eeg, 1).to_bytes().is_err());
        assert!(ChannelInfo::new("EEG\u{3b1}", ChannelType::Eeg, 1).to_bytes().is_err());
        assert!(ChannelInfo::from_bytes(&[0u8; 95]).is_err());
    }

    #[test]
    fn type_counts_and_bads() {
        let mut info = MeasInfo::new(600.0, vec![
            ChannelInfo::new("MEG 0111", ChannelType::Mag, 1),
            ChannelInfo::new("MEG 0112", ChannelType::Grad, 2),
            ChannelInfo::new("MEG 0113", ChannelType::Grad, 3),
            ChannelInfo::new("STI 001", ChannelType::Stim, 4),
        ]);
        info.bad_ch_names.push("MEG 0113".into());
        assert_eq!(
            info.type_counts(),
            vec![(ChannelType::Mag, 1), (ChannelType::Grad, 2), (ChannelType::Stim, 1)]
        );
        assert!(info.is_bad(2));
        assert!(!info.is_bad(1));
        assert!(!info.is_bad(99));
        approx::assert_abs_diff_eq!(info.nyquist(), 300.0);
    }
}
