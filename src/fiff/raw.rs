//! Raw FIF file reader, the counterpart of `mne.io.read_raw_fif`.
//!
//! 1. Load the tag directory (embedded directory, else a sequential scan).
//! 2. Fold it into the block tree and read `MeasInfo`.
//! 3. Index the `FIFF_DATA_BUFFER` tags of the raw-data block.
//! 4. [`RawFif::read_all_data`] decodes and calibrates every buffer:
//!
//! ```text
//! data[ch, t] = stored[t, ch] × chs[ch].cal × chs[ch].range
//! ```
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, bail, Context, Result};
use ndarray::{s, Array2};
use tracing::debug;

use super::constants::*;
use super::info::{read_meas_info, MeasInfo};
use super::tag::{read_i32, TagHeader};
use super::tree::{read_tree, scan_directory, try_load_directory};

/// One data buffer, or a skipped span when `tag` is `None`.
#[derive(Debug, Clone)]
pub struct BufferRecord {
    pub tag:        Option<TagHeader>,
    pub first_samp: u64,
    pub n_samp:     usize,
}

/// A FIF recording opened without loading its samples.
#[derive(Debug, Clone)]
pub struct RawFif {
    pub info:       MeasInfo,
    pub first_samp: u64,
    /// Inclusive.
    pub last_samp:  u64,
    pub path:       PathBuf,
    pub buffers:    Vec<BufferRecord>,
}

impl RawFif {
    #[inline]
    pub fn n_times(&self) -> usize {
        (self.last_samp - self.first_samp + 1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.info.sfreq
    }

    /// Every sample, calibrated, as `[n_chan, n_times]`.  Skipped spans
    /// read as zeros.
    pub fn read_all_data(&self) -> Result<Array2<f64>> {
        let n_ch = self.info.n_chan;
        let n_t  = self.n_times();
        let cals = self.info.cals();
        let mut out = Array2::<f64>::zeros((n_ch, n_t));

        let file = File::open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let mut reader = BufReader::new(file);

        let mut offset = 0;
        for buf in &self.buffers {
            let end = offset + buf.n_samp;
            if end > n_t {
                bail!("buffers hold more than the {n_t} samples announced");
            }
            if let Some(tag) = &buf.tag {
                let data = read_buffer(&mut reader, tag, buf.n_samp, &cals)?;
                out.slice_mut(s![.., offset..end]).assign(&data);
            }
            offset = end;
        }
        Ok(out)
    }
}

/// Open `path` and index its raw-data buffers.
pub fn open_raw<P: AsRef<Path>>(path: P) -> Result<RawFif> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let directory = match try_load_directory(&mut reader)? {
        Some(d) => d,
        None    => scan_directory(&mut reader)?,
    };
    let tree = read_tree(&mut reader, &directory)?;
    let info = read_meas_info(&mut reader, &tree)?;

    let meas = tree
        .find_block(FIFFB_MEAS)
        .ok_or_else(|| anyhow!("FIFFB_MEAS not found"))?;
    let raw_node = meas
        .find_block(FIFFB_RAW_DATA)
        .or_else(|| meas.find_block(FIFFB_CONTINUOUS_DATA))
        .ok_or_else(|| anyhow!("no raw-data block in {}", path.display()))?;

    let mut next_samp = match raw_node.find_tag(FIFF_FIRST_SAMPLE) {
        Some(tag) => read_i32(&mut reader, tag)?.max(0) as u64,
        None      => 0,
    };
    let mut pending_skip = 0usize;
    let mut buffers: Vec<BufferRecord> = Vec::new();

    for ent in &raw_node.entries {
        match ent.kind {
            FIFF_DATA_SKIP => pending_skip += read_i32(&mut reader, ent)?.max(0) as usize,
            FIFF_DATA_BUFFER => {
                let bps = bytes_per_sample(ent.ftype)
                    .ok_or_else(|| anyhow!("unknown buffer type {}", ent.ftype))?;
                let n_samp = ent.size.max(0) as usize / (bps * info.n_chan.max(1));
                if pending_skip > 0 {
                    // A skip before the first buffer moves the start of the
                    // recording; later skips are gaps read as zeros.
                    let gap = (n_samp * pending_skip) as u64;
                    if !buffers.is_empty() {
                        buffers.push(BufferRecord { tag: None, first_samp: next_samp, n_samp: gap as usize });
                    }
                    next_samp += gap;
                    pending_skip = 0;
                }
                buffers.push(BufferRecord { tag: Some(*ent), first_samp: next_samp, n_samp });
                next_samp += n_samp as u64;
            }
            _ => {}
        }
    }

    let Some(first) = buffers.first() else {
        bail!("no FIFF_DATA_BUFFER tags in {}", path.display());
    };
    let first_samp = first.first_samp;
    debug!(path = %path.display(), n_buffers = buffers.len(), first_samp, "opened raw FIF");

    Ok(RawFif {
        info,
        first_samp,
        last_samp: next_samp - 1,
        path: path.to_path_buf(),
        buffers,
    })
}

/// Decode one buffer into calibrated `[n_chan, n_samp]`.  On disk the
/// samples are interleaved `[n_samp, n_chan]`.
fn read_buffer<R: Read + Seek>(
    reader: &mut R,
    tag:    &TagHeader,
    n_samp: usize,
    cals:   &[f64],
) -> Result<Array2<f64>> {
    let n_ch = cals.len();
    reader
        .seek(SeekFrom::Start(tag.data_pos()))
        .with_context(|| format!("seek to buffer data @ {:#x}", tag.data_pos()))?;

    let width = bytes_per_sample(tag.ftype)
        .filter(|_| !matches!(tag.ftype, FIFFT_COMPLEX_FLOAT | FIFFT_COMPLEX_DOUBLE))
        .ok_or_else(|| anyhow!("unsupported buffer type {}", tag.ftype))?;
    let mut raw = vec![0u8; n_samp * n_ch * width];
    reader.read_exact(&mut raw)
        .with_context(|| format!("read data buffer @ {:#x}", tag.data_pos()))?;

    let decode = |b: &[u8]| -> f64 {
        match tag.ftype {
            FIFFT_FLOAT  => f32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
            FIFFT_INT    => i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
            FIFFT_DOUBLE => f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
            _            => i16::from_be_bytes([b[0], b[1]]) as f64,
        }
    };

    let mut out = Array2::<f64>::zeros((n_ch, n_samp));
    for (i, sample) in raw.chunks_exact(width).enumerate() {
        let (t, c) = (i / n_ch, i % n_ch);
        out[[c, t]] = decode(sample) * cals[c];
    }
    Ok(out)
}
