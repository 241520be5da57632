//! # meeg-study — MEG/EEG study configuration and raw-data scripts
//!
//! Pure-Rust building blocks for an MNE-style M/EEG workflow:
//!
//! * [`config`]: declarative study records (the MNE-BIDS-Pipeline keys),
//!   loaded from YAML, validated, with the bundled `ds000248` presets.
//! * [`fiff`]: native FIFF reader and writer for continuous recordings.
//! * [`filter`]: zero-phase FIR design and overlap-add filtering that match
//!   `mne.filter.create_filter` with `fir_design='firwin'`.
//! * [`bids`]: BIDS paths and `write_raw_bids` with sidecars.
//! * [`export`]: band-pass a recording, save it as FIFF and as a BIDS
//!   derivative (`proc-filter`).
//! * [`plot`]: pick channels by type and plot the first seconds of one.
//!
//! ```text
//! sub-01_task-audiovisual_run-01_meg.fif
//!   │
//!   ├─ raw::Raw::read()           FIFF → calibrated [C, T] f64
//!   ├─ Raw::filter(13, 30)        firwin band-pass, data channels only
//!   ├─ Raw::save()                sample_audvis_beta_raw.fif
//!   └─ bids::write_raw_bids()     <root>/derivatives/sub-01/meg/..._proc-filter_meg.fif
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use meeg_study::{pick_and_plot, PickTypes, PlotStyle, Raw};
//!
//! let raw = Raw::read("sample_audvis_raw.fif").unwrap();
//! let stim = PickTypes { stim: true, ..PickTypes::default() };
//! let drawn = pick_and_plot(&raw, &stim, 6, 10.0, "stim.svg", &PlotStyle::default()).unwrap();
//! println!("{} samples of {}", drawn.n_samples, drawn.channel);
//! ```

pub mod bids;
pub mod config;
pub mod export;
pub mod fiff;
pub mod filter;
pub mod logging;
pub mod pick;
pub mod plot;
pub mod raw;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::{presets, Report, StudyConfig};

// fiff
pub use fiff::{open_raw, write_raw, ChannelInfo, ChannelType, MeasInfo, RawFif};

// filter
pub use filter::{apply_fir_zero_phase, create_filter, design_bandpass, filter_1d};

// raw data and scripts
pub use bids::{write_raw_bids, BidsPath, Datatype, WriteOptions};
pub use export::{filter_and_export, FilterExport, FilterExportOutput};
pub use pick::{pick_types, MegPick, PickTypes};
pub use plot::{first_seconds, pick_and_plot, plot_time_series, window_samples, PickPlot, PlotStyle};
pub use raw::Raw;
