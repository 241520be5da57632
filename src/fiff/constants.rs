//! FIFF constants used by the reader and the writer.
//!
//! Values follow `mne/_fiff/constants.py`.  Only the tags, blocks and type
//! codes needed to round-trip a continuous raw recording are listed here.
//!
//! A FIF file is a chain of **tags**: a 16-byte big-endian header
//! (`kind`, `type`, `size`, `next`) followed by `size` payload bytes.
//! `FIFF_BLOCK_START` / `FIFF_BLOCK_END` tags nest the chain into a tree.

// ── Block kinds ───────────────────────────────────────────────────────────

/// Measurement block, top-level container for one recording.
pub const FIFFB_MEAS:            i32 = 100;
/// Measurement info: channels, sampling rate, filter band, bads.
pub const FIFFB_MEAS_INFO:       i32 = 101;
/// Raw (continuous) data block.
pub const FIFFB_RAW_DATA:        i32 = 102;
/// Continuous data block (alias written by some acquisition systems).
pub const FIFFB_CONTINUOUS_DATA: i32 = 112;

// ── Tag kinds: file structure ─────────────────────────────────────────────

/// File identifier, always the first tag.
pub const FIFF_FILE_ID:         i32 = 100;
/// Byte offset of the embedded tag directory, or -1 when there is none.
pub const FIFF_DIR_POINTER:     i32 = 101;
/// Opens a block; payload is the block kind.
pub const FIFF_BLOCK_START:     i32 = 104;
/// Closes the innermost open block.
pub const FIFF_BLOCK_END:       i32 = 105;
/// Free-list pointer, written as -1.
pub const FIFF_FREE_LIST:       i32 = 106;
/// Empty tag; closes the chain of a written file.
pub const FIFF_NOP:             i32 = 108;

// ── Tag kinds: measurement info ───────────────────────────────────────────

pub const FIFF_NCHAN:           i32 = 200;
pub const FIFF_SFREQ:           i32 = 201;
/// One 96-byte channel description per channel.
pub const FIFF_CH_INFO:         i32 = 203;
/// Free-text description.
pub const FIFF_DESCRIPTION:     i32 = 206;
pub const FIFF_FIRST_SAMPLE:    i32 = 208;
pub const FIFF_EXPERIMENTER:    i32 = 212;
/// Lowpass corner of the data in Hz (f32, NaN when unset).
pub const FIFF_LOWPASS:         i32 = 219;
/// Colon-separated bad channel names.
pub const FIFF_BAD_CHS:         i32 = 220;
/// Highpass corner of the data in Hz (f32, NaN when unset).
pub const FIFF_HIGHPASS:        i32 = 223;
pub const FIFF_LINE_FREQ:       i32 = 235;

// ── Tag kinds: data ───────────────────────────────────────────────────────

/// Interleaved `[n_samp, n_chan]` samples.
pub const FIFF_DATA_BUFFER:     i32 = 300;
/// Skip `n` whole buffers.
pub const FIFF_DATA_SKIP:       i32 = 301;

// ── Tag payload types ─────────────────────────────────────────────────────

pub const FIFFT_VOID:              u32 = 0;
pub const FIFFT_SHORT:             u32 = 2;
pub const FIFFT_INT:               u32 = 3;
pub const FIFFT_FLOAT:             u32 = 4;
pub const FIFFT_DOUBLE:            u32 = 5;
/// Latin-1 string, not NUL-terminated.
pub const FIFFT_STRING:            u32 = 10;
pub const FIFFT_DAU_PACK16:        u32 = 16;
pub const FIFFT_COMPLEX_FLOAT:     u32 = 20;
pub const FIFFT_COMPLEX_DOUBLE:    u32 = 21;
pub const FIFFT_CH_INFO_STRUCT:    u32 = 30;
/// 20-byte file id: version, two machine ids, seconds, microseconds.
pub const FIFFT_ID_STRUCT:         u32 = 31;
pub const FIFFT_DIR_ENTRY_STRUCT:  u32 = 32;

// ── `next` sentinels ──────────────────────────────────────────────────────

/// Next tag follows immediately.
pub const FIFFV_NEXT_SEQ:  i32 = 0;
/// End of the tag chain.
pub const FIFFV_NEXT_NONE: i32 = -1;

/// File format version stored in the file id (1.3).
pub const FIFFC_VERSION:   i32 = (1 << 16) | 3;

// ── Channel kinds ─────────────────────────────────────────────────────────

pub const FIFFV_MEG_CH:     i32 = 1;
pub const FIFFV_EEG_CH:     i32 = 2;
/// Stimulus / trigger channel.
pub const FIFFV_STIM_CH:    i32 = 3;
pub const FIFFV_EOG_CH:     i32 = 202;
pub const FIFFV_EMG_CH:     i32 = 302;
pub const FIFFV_ECG_CH:     i32 = 402;
pub const FIFFV_MISC_CH:    i32 = 502;
pub const FIFFV_SEEG_CH:    i32 = 802;
pub const FIFFV_ECOG_CH:    i32 = 902;

// ── Units (`ChannelInfo::unit`) ───────────────────────────────────────────

pub const FIFF_UNIT_NONE: i32 = -1;
pub const FIFF_UNIT_V:    i32 = 107;
/// Tesla: magnetometers.
pub const FIFF_UNIT_T:    i32 = 112;
/// Tesla per metre: gradiometers.
pub const FIFF_UNIT_T_M:  i32 = 201;

/// Bytes per scalar sample for a data-buffer tag type, `None` for non-sample
/// types.
///
/// ```
/// use meeg_study::fiff::constants::{bytes_per_sample, FIFFT_FLOAT, FIFFT_SHORT};
/// assert_eq!(bytes_per_sample(FIFFT_FLOAT), Some(4));
/// assert_eq!(bytes_per_sample(FIFFT_SHORT), Some(2));
/// assert_eq!(bytes_per_sample(99), None);
/// ```
pub fn bytes_per_sample(tag_type: u32) -> Option<usize> {
    match tag_type {
        FIFFT_DAU_PACK16 | FIFFT_SHORT => Some(2),
        FIFFT_FLOAT | FIFFT_INT        => Some(4),
        FIFFT_DOUBLE                   => Some(8),
        FIFFT_COMPLEX_FLOAT            => Some(8),
        FIFFT_COMPLEX_DOUBLE           => Some(16),
        _                              => None,
    }
}
