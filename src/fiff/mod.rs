//! FIFF reading and writing for continuous recordings.
//!
//! ```no_run
//! use meeg_study::fiff::{open_raw, write_raw};
//!
//! let raw = open_raw("sample_audvis_raw.fif").unwrap();
//! println!("{} channels @ {} Hz", raw.info.n_chan, raw.info.sfreq);
//! let data = raw.read_all_data().unwrap();
//! write_raw("copy_raw.fif", &raw.info, &data, raw.first_samp, true).unwrap();
//! ```
pub mod constants;
pub mod info;
pub mod raw;
pub mod tag;
pub mod tree;
pub mod write;

pub use info::{ChannelInfo, ChannelType, MeasInfo, read_meas_info};
pub use raw::{open_raw, RawFif, BufferRecord};
pub use tag::{TagHeader, read_tag_header};
pub use tree::{Node, read_tree, scan_directory, try_load_directory};
pub use write::{check_writable, write_raw, TagWriter};
