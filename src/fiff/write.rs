//! FIFF writer for continuous raw recordings, the counterpart of
//! [`super::raw::open_raw`].
//!
//! Layout of a written file:
//!
//! ```text
//! FILE_ID  DIR_POINTER(-1)  FREE_LIST(-1)
//! BLOCK_START MEAS
//!   BLOCK_START MEAS_INFO
//!     NCHAN SFREQ [LOWPASS] [HIGHPASS] [LINE_FREQ] [BAD_CHS] … CH_INFO × n
//!   BLOCK_END MEAS_INFO
//!   BLOCK_START RAW_DATA
//!     FIRST_SAMPLE  DATA_BUFFER × ⌈n_times / sfreq⌉
//!   BLOCK_END RAW_DATA
//! BLOCK_END MEAS
//! NOP (next = -1)
//! ```
//!
//! Every tag is written with `next = 0` except the closing NOP, so the
//! reader walks the file through its sequential scan.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use anyhow::{bail, Context, Result};
use ndarray::Array2;
use tracing::{debug, info};

use super::constants::*;
use super::info::{latin1, ChannelInfo, MeasInfo};

/// Sequential tag writer.
pub struct TagWriter<W: Write> {
    out: W,
    pos: u64,
}

impl<W: Write> TagWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, pos: 0 }
    }

    /// Bytes written so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn write_tag(&mut self, kind: i32, ftype: u32, payload: &[u8], next: i32) -> Result<()> {
        let size = i32::try_from(payload.len())
            .with_context(|| format!("tag {kind} payload of {} bytes is too large", payload.len()))?;
        self.out.write_all(&kind.to_be_bytes())?;
        self.out.write_all(&ftype.to_be_bytes())?;
        self.out.write_all(&size.to_be_bytes())?;
        self.out.write_all(&next.to_be_bytes())?;
        self.out.write_all(payload)?;
        self.pos += 16 + payload.len() as u64;
        Ok(())
    }

    pub fn write_i32(&mut self, kind: i32, value: i32) -> Result<()> {
        self.write_tag(kind, FIFFT_INT, &value.to_be_bytes(), FIFFV_NEXT_SEQ)
    }

    pub fn write_f32(&mut self, kind: i32, value: f32) -> Result<()> {
        self.write_tag(kind, FIFFT_FLOAT, &value.to_be_bytes(), FIFFV_NEXT_SEQ)
    }

    pub fn write_string(&mut self, kind: i32, value: &str) -> Result<()> {
        let bytes = latin1(value)?;
        self.write_tag(kind, FIFFT_STRING, &bytes, FIFFV_NEXT_SEQ)
    }

    pub fn write_ch_info(&mut self, ch: &ChannelInfo) -> Result<()> {
        let bytes = ch.to_bytes()?;
        self.write_tag(FIFF_CH_INFO, FIFFT_CH_INFO_STRUCT, &bytes, FIFFV_NEXT_SEQ)
    }

    pub fn start_block(&mut self, block: i32) -> Result<()> {
        self.write_i32(FIFF_BLOCK_START, block)
    }

    pub fn end_block(&mut self, block: i32) -> Result<()> {
        self.write_i32(FIFF_BLOCK_END, block)
    }

    /// File id, directory pointer and free list.  The directory pointer is
    /// -1: readers fall back to scanning the tag chain.
    pub fn start_file(&mut self) -> Result<()> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        let mut id = Vec::with_capacity(20);
        id.extend_from_slice(&FIFFC_VERSION.to_be_bytes());
        id.extend_from_slice(&0_i32.to_be_bytes());
        id.extend_from_slice(&0_i32.to_be_bytes());
        id.extend_from_slice(&(now.as_secs() as i32).to_be_bytes());
        id.extend_from_slice(&(now.subsec_micros() as i32).to_be_bytes());
        self.write_tag(FIFF_FILE_ID, FIFFT_ID_STRUCT, &id, FIFFV_NEXT_SEQ)?;
        self.write_i32(FIFF_DIR_POINTER, -1)?;
        self.write_i32(FIFF_FREE_LIST, -1)
    }

    /// Terminate the tag chain and flush.
    pub fn end_file(mut self) -> Result<W> {
        self.write_tag(FIFF_NOP, FIFFT_VOID, &[], FIFFV_NEXT_NONE)?;
        self.out.flush()?;
        Ok(self.out)
    }

    /// Write `FIFFB_MEAS_INFO`.  Unset corner frequencies are omitted, which
    /// the reader maps back to `None`.
    pub fn write_meas_info(&mut self, info: &MeasInfo) -> Result<()> {
        self.start_block(FIFFB_MEAS_INFO)?;
        self.write_i32(FIFF_NCHAN, info.n_chan as i32)?;
        self.write_f32(FIFF_SFREQ, info.sfreq as f32)?;
        if let Some(lp) = info.lowpass {
            self.write_f32(FIFF_LOWPASS, lp as f32)?;
        }
        if let Some(hp) = info.highpass {
            self.write_f32(FIFF_HIGHPASS, hp as f32)?;
        }
        if let Some(line) = info.line_freq {
            self.write_f32(FIFF_LINE_FREQ, line as f32)?;
        }
        if !info.bad_ch_names.is_empty() {
            self.write_string(FIFF_BAD_CHS, &info.bad_ch_names.join(":"))?;
        }
        if let Some(who) = &info.experimenter {
            self.write_string(FIFF_EXPERIMENTER, who)?;
        }
        if let Some(text) = &info.description {
            self.write_string(FIFF_DESCRIPTION, text)?;
        }
        for ch in &info.chs {
            self.write_ch_info(ch)?;
        }
        self.end_block(FIFFB_MEAS_INFO)
    }

    /// One `FIFFT_FLOAT` buffer of `data[.., start..end]`, interleaved by
    /// sample and divided by the channel calibration.
    pub fn write_float_buffer(
        &mut self,
        data: &Array2<f64>,
        cals: &[f64],
        start: usize,
        end: usize,
    ) -> Result<()> {
        let n_ch = data.nrows();
        let mut payload = Vec::with_capacity((end - start) * n_ch * 4);
        for t in start..end {
            for c in 0..n_ch {
                let stored = (data[[c, t]] / cals[c]) as f32;
                payload.extend_from_slice(&stored.to_be_bytes());
            }
        }
        self.write_tag(FIFF_DATA_BUFFER, FIFFT_FLOAT, &payload, FIFFV_NEXT_SEQ)
    }
}

/// Fail if `info` and `data` cannot be encoded as a raw FIFF file.
///
/// Touches nothing on disk, so callers that write several files can check
/// first and leave no partial output behind.
pub fn check_writable(info: &MeasInfo, data: &Array2<f64>, first_samp: u64) -> Result<()> {
    let (n_ch, n_t) = data.dim();
    if n_ch != info.n_chan || info.chs.len() != info.n_chan {
        bail!(
            "data has {n_ch} channels but info describes {} ({} ch_info)",
            info.n_chan,
            info.chs.len()
        );
    }
    if n_t == 0 {
        bail!("cannot write a recording without samples");
    }
    if !(info.sfreq.is_finite() && info.sfreq > 0.0) {
        bail!("invalid sampling frequency {}", info.sfreq);
    }
    for ch in &info.chs {
        let cal = ch.calibration();
        if cal == 0.0 || !cal.is_finite() {
            bail!("channel {} has calibration {cal}", ch.name);
        }
        ch.to_bytes()?;
    }
    for text in info.bad_ch_names.iter().chain(&info.experimenter).chain(&info.description) {
        latin1(text)?;
    }
    i32::try_from(first_samp)
        .with_context(|| format!("first sample {first_samp} does not fit FIFF_FIRST_SAMPLE"))?;
    Ok(())
}

/// Save a raw recording to `path` in FIFF, like MNE's `raw.save`.
///
/// `data` is `[n_chan, n_times]` in physical units.  Samples are split into
/// one-second buffers.  An existing file is an error unless `overwrite`.
pub fn write_raw<P: AsRef<Path>>(
    path: P,
    info: &MeasInfo,
    data: &Array2<f64>,
    first_samp: u64,
    overwrite: bool,
) -> Result<()> {
    let path = path.as_ref();
    check_writable(info, data, first_samp)?;
    let (n_ch, n_t) = data.dim();
    let cals = info.cals();
    if path.exists() && !overwrite {
        bail!("{} already exists; pass overwrite to replace it", path.display());
    }
    let first = i32::try_from(first_samp)?;

    let file = File::create(path)
        .with_context(|| format!("create {}", path.display()))?;
    let mut w = TagWriter::new(BufWriter::new(file));

    w.start_file()?;
    w.start_block(FIFFB_MEAS)?;
    w.write_meas_info(info)?;

    w.start_block(FIFFB_RAW_DATA)?;
    w.write_i32(FIFF_FIRST_SAMPLE, first)?;
    let buf_len = (info.sfreq.round() as usize).max(1);
    let mut n_buffers = 0;
    for start in (0..n_t).step_by(buf_len) {
        w.write_float_buffer(data, &cals, start, (start + buf_len).min(n_t))?;
        n_buffers += 1;
    }
    w.end_block(FIFFB_RAW_DATA)?;
    w.end_block(FIFFB_MEAS)?;

    let bytes = w.position();
    w.end_file()
        .with_context(|| format!("flush {}", path.display()))?;
    debug!(n_buffers, buf_len, "wrote raw data buffers");
    info!(path = %path.display(), n_ch, n_t, bytes, "saved raw FIF");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiff::tag::read_tag_header;
    use crate::fiff::tree::{read_tree, scan_directory};
    use std::io::Cursor;

    #[test]
    fn check_writable_rejects_unencodable_info() {
        use crate::fiff::info::ChannelType;
        let ok = MeasInfo::new(100.0, vec![ChannelInfo::new("EEG 001", ChannelType::Eeg, 1)]);
        let data = Array2::<f64>::zeros((1, 10));
        assert!(check_writable(&ok, &data, 0).is_ok());

        let mut long = ok.clone();
        long.chs[0].name = "EEG-CHANNEL-NUMBER-1".into();
        assert!(check_writable(&long, &data, 0).is_err());

        let mut zero_cal = ok.clone();
        zero_cal.chs[0].cal = 0.0;
        assert!(check_writable(&zero_cal, &data, 0).is_err());

        let mut who = ok.clone();
        who.experimenter = Some("\u{4e2d}".into());
        assert!(check_writable(&who, &data, 0).is_err());

        assert!(check_writable(&ok, &Array2::zeros((1, 0)), 0).is_err());
        assert!(check_writable(&ok, &data, u64::MAX).is_err());
    }
    #[test]
    fn chain_ends_with_nop() {
        let mut w = TagWriter::new(Vec::new());
        w.start_file().unwrap();
        w.start_block(FIFFB_MEAS).unwrap();
        w.write_f32(FIFF_SFREQ, 100.0).unwrap();
        w.end_block(FIFFB_MEAS).unwrap();
        let bytes = w.end_file().unwrap();

        let mut cursor = Cursor::new(bytes);
        let dir = scan_directory(&mut cursor).unwrap();
        let kinds: Vec<i32> = dir.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![FIFF_FILE_ID, FIFF_DIR_POINTER, FIFF_FREE_LIST, FIFF_BLOCK_START,
                 FIFF_SFREQ, FIFF_BLOCK_END, FIFF_NOP]
        );
        let tree = read_tree(&mut cursor, &dir).unwrap();
        assert!(tree.find_block(FIFFB_MEAS).unwrap().find_tag(FIFF_SFREQ).is_some());
    }

    #[test]
    fn float_buffer_is_interleaved_and_calibrated() {
        let data = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 10.0, 20.0]).unwrap();
        let mut w = TagWriter::new(Vec::new());
        w.write_float_buffer(&data, &[1.0, 10.0], 0, 2).unwrap();
        let bytes = w.end_file().unwrap();

        let tag = read_tag_header(&mut Cursor::new(&bytes), 0).unwrap();
        assert_eq!(tag.size, 16);
        let vals: Vec<f32> = bytes[16..32]
            .chunks_exact(4)
            .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        // [t0c0, t0c1, t1c0, t1c1] with channel 1 divided by its cal of 10.
        assert_eq!(vals, vec![1.0, 1.0, 2.0, 2.0]);
    }
}
