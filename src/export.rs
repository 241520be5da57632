//! Band-pass a recording and export it both as plain FIFF and into the
//! BIDS derivatives tree.
//!
//! ```no_run
//! use meeg_study::bids::BidsPath;
//! use meeg_study::export::{filter_and_export, FilterExport};
//! use meeg_study::raw::Raw;
//!
//! let raw = Raw::read("sub-01_task-audiovisual_run-01_meg.fif").unwrap();
//! let source = BidsPath::new("ds000248", "01").with_task("audiovisual").with_run("01");
//! let out = filter_and_export(&raw, &source, &FilterExport::beta("sample_audvis_beta_raw.fif")).unwrap();
//! println!("{}", out.bids_path.fpath().display());
//! ```
use std::path::PathBuf;
use anyhow::{Context, Result};
use tracing::info;

use crate::bids::{write_raw_bids, BidsPath, WriteOptions};
use crate::raw::Raw;

/// Name of the derivatives folder under the BIDS root.
pub const DERIVATIVES_DIR: &str = "derivatives";
/// `proc-` label of filtered output.
pub const FILTER_PROCESSING: &str = "filter";

/// Parameters of [`filter_and_export`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExport {
    pub l_freq:      Option<f64>,
    pub h_freq:      Option<f64>,
    /// Plain FIFF copy of the filtered data.
    pub native_path: PathBuf,
    /// Replace existing output files.
    pub overwrite:   bool,
}

impl FilterExport {
    /// The 13–30 Hz beta band, overwriting earlier output.
    pub fn beta(native_path: impl Into<PathBuf>) -> Self {
        Self { l_freq: Some(13.0), h_freq: Some(30.0), native_path: native_path.into(), overwrite: true }
    }
}

#[derive(Debug, Clone)]
pub struct FilterExportOutput {
    pub filtered:  Raw,
    /// Where the BIDS copy was written.
    pub bids_path: BidsPath,
}

/// Derivative location for `source`: the same entities under
/// `<root>/derivatives` with `proc-filter`.
pub fn derivative_path(source: &BidsPath) -> BidsPath {
    source
        .with_root(source.root.join(DERIVATIVES_DIR))
        .with_processing(FILTER_PROCESSING)
}

/// Filter `raw` (which is left unchanged), save it to
/// `params.native_path`, then write it as a BIDS derivative of `source`.
pub fn filter_and_export(raw: &Raw, source: &BidsPath, params: &FilterExport) -> Result<FilterExportOutput> {
    let filtered = raw
        .filter(params.l_freq, params.h_freq)
        .context("band-pass filtering")?;

    filtered
        .save(&params.native_path, params.overwrite)
        .with_context(|| format!("saving {}", params.native_path.display()))?;
    info!(path = %params.native_path.display(), "saved filtered FIFF");

    let opts = WriteOptions { overwrite: params.overwrite, allow_preload: true };
    let bids_path = write_raw_bids(&filtered, &derivative_path(source), &opts)
        .context("writing BIDS derivative")?;

    Ok(FilterExportOutput { filtered, bids_path })
}
