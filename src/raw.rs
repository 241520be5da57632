//! In-memory continuous recording.
//!
//! [`Raw`] owns calibrated samples `[n_chan, n_times]` together with their
//! [`MeasInfo`].  It is the object the export and plotting steps operate
//! on, the equivalent of a preloaded `mne.io.Raw`.
use std::ops::Range;
use std::path::Path;
use anyhow::{bail, Result};
use ndarray::{s, Array1, Array2};
use tracing::info;

use crate::fiff::{open_raw, write_raw, MeasInfo, RawFif};
use crate::filter::{apply_fir_zero_phase, create_filter};

#[derive(Debug, Clone)]
pub struct Raw {
    pub info:       MeasInfo,
    /// Calibrated samples, `[n_chan, n_times]`.
    pub data:       Array2<f64>,
    /// Index of the first sample in acquisition time.
    pub first_samp: u64,
}

impl Raw {
    pub fn new(info: MeasInfo, data: Array2<f64>, first_samp: u64) -> Result<Self> {
        if data.nrows() != info.n_chan || info.chs.len() != info.n_chan {
            bail!(
                "data has {} rows but info describes {} channels ({} ch_info)",
                data.nrows(),
                info.n_chan,
                info.chs.len()
            );
        }
        Ok(Self { info, data, first_samp })
    }

    /// Load every sample of an opened FIF file.
    pub fn from_fif(fif: &RawFif) -> Result<Self> {
        let data = fif.read_all_data()?;
        Self::new(fif.info.clone(), data, fif.first_samp)
    }

    /// Open and load `path`.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_fif(&open_raw(path)?)
    }

    #[inline]
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    pub fn sfreq(&self) -> f64 {
        self.info.sfreq
    }

    pub fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.info.sfreq
    }

    /// Indices of the channels a default `filter` call touches.
    pub fn data_picks(&self) -> Vec<usize> {
        self.info
            .chs
            .iter()
            .enumerate()
            .filter(|(_, ch)| ch.channel_type().is_data())
            .map(|(i, _)| i)
            .collect()
    }

    /// Return a zero-phase FIR filtered copy; `self` is left untouched.
    ///
    /// Only data channels (MEG, EEG, sEEG, ECoG) are filtered.  The copy's
    /// `highpass` is raised to `l_freq` and its `lowpass` lowered to
    /// `h_freq`, never the other way round.
    pub fn filter(&self, l_freq: Option<f64>, h_freq: Option<f64>) -> Result<Raw> {
        let sfreq = self.info.sfreq;
        let h = create_filter(l_freq.map(|f| f as f32), h_freq.map(|f| f as f32), sfreq as f32)?;
        let picks = self.data_picks();

        let mut out = self.clone();
        apply_fir_zero_phase(&mut out.data, &h, &picks)?;

        if let Some(l) = l_freq {
            if out.info.highpass.map_or(true, |hp| l > hp) {
                out.info.highpass = Some(l);
            }
        }
        if let Some(hf) = h_freq {
            if out.info.lowpass.map_or(true, |lp| hf < lp) {
                out.info.lowpass = Some(hf);
            }
        }
        info!(
            l_freq = ?l_freq,
            h_freq = ?h_freq,
            n_taps = h.len(),
            n_picks = picks.len(),
            "filtered raw data"
        );
        Ok(out)
    }

    /// Samples of channel `pick` over `range`, with their times in seconds
    /// from the start of the recording.  The range is clipped to the data.
    pub fn get(&self, pick: usize, range: Range<usize>) -> Result<(Array1<f64>, Array1<f64>)> {
        if pick >= self.info.n_chan {
            bail!("channel index {pick} out of range for {} channels", self.info.n_chan);
        }
        let end = range.end.min(self.n_times());
        let start = range.start.min(end);
        let samples = self.data.slice(s![pick, start..end]).to_owned();
        let times = Array1::from_iter((start..end).map(|t| t as f64 / self.info.sfreq));
        Ok((samples, times))
    }

    /// Write to `path` in FIFF.
    pub fn save<P: AsRef<Path>>(&self, path: P, overwrite: bool) -> Result<()> {
        write_raw(path, &self.info, &self.data, self.first_samp, overwrite)
    }
}
