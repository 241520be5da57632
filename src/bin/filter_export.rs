use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use meeg_study::bids::BidsPath;
use meeg_study::export::{filter_and_export, FilterExport};
use meeg_study::raw::Raw;

#[derive(Parser)]
#[command(name = "filter_export", about = "Band-pass a recording, save it as FIFF and as a BIDS derivative")]
struct Args {
    /// Input FIFF recording
    #[arg(long)]
    fif: PathBuf,

    /// Root of the BIDS dataset; output goes to <root>/derivatives
    #[arg(long)]
    bids_root: PathBuf,

    /// Subject label, without `sub-`
    #[arg(long)]
    subject: String,

    #[arg(long)]
    session: Option<String>,

    #[arg(long)]
    task: Option<String>,

    #[arg(long)]
    run: Option<String>,

    /// Lower band edge in Hz
    #[arg(long, default_value_t = 13.0)]
    l_freq: f64,

    /// Upper band edge in Hz
    #[arg(long, default_value_t = 30.0)]
    h_freq: f64,

    /// Plain FIFF copy of the filtered data
    #[arg(long, default_value = "sample_audvis_beta_raw.fif")]
    out_fif: PathBuf,

    /// Replace existing outputs
    #[arg(long)]
    overwrite: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    meeg_study::logging::init(args.verbose);

    let raw = Raw::read(&args.fif)?;
    println!(
        "Loaded {} ch × {} samples @ {} Hz",
        raw.info.n_chan,
        raw.n_times(),
        raw.sfreq()
    );

    let mut source = BidsPath::new(&args.bids_root, &args.subject);
    if let Some(s) = &args.session {
        source = source.with_session(s);
    }
    if let Some(t) = &args.task {
        source = source.with_task(t);
    }
    if let Some(r) = &args.run {
        source = source.with_run(r);
    }

    let params = FilterExport {
        l_freq: Some(args.l_freq),
        h_freq: Some(args.h_freq),
        native_path: args.out_fif.clone(),
        overwrite: args.overwrite,
    };
    let out = filter_and_export(&raw, &source, &params)?;
    println!("Written → {}", args.out_fif.display());
    println!("Written → {}", out.bids_path.fpath().display());
    Ok(())
}
