use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use meeg_study::fiff::ChannelType;
use meeg_study::pick::PickTypes;
use meeg_study::plot::{pick_and_plot, PlotStyle};
use meeg_study::raw::Raw;

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Mag,
    Grad,
    Eeg,
    Stim,
    Eog,
    Ecg,
    Emg,
    Misc,
}

impl From<Kind> for ChannelType {
    fn from(k: Kind) -> Self {
        match k {
            Kind::Mag  => ChannelType::Mag,
            Kind::Grad => ChannelType::Grad,
            Kind::Eeg  => ChannelType::Eeg,
            Kind::Stim => ChannelType::Stim,
            Kind::Eog  => ChannelType::Eog,
            Kind::Ecg  => ChannelType::Ecg,
            Kind::Emg  => ChannelType::Emg,
            Kind::Misc => ChannelType::Misc,
        }
    }
}

#[derive(Parser)]
#[command(name = "plot_channel", about = "Plot the first seconds of one channel of a given type")]
struct Args {
    /// Input FIFF recording
    #[arg(long)]
    fif: PathBuf,

    /// Output image; `.svg` or a bitmap format such as `.png`
    #[arg(long)]
    output: PathBuf,

    /// Channel type to pick
    #[arg(long, value_enum, default_value = "stim")]
    kind: Kind,

    /// Position of the channel within the picked set
    #[arg(long, default_value_t = 6)]
    index: usize,

    /// Length of the window from the start of the recording
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,

    #[arg(long, default_value_t = 1024)]
    width: u32,

    #[arg(long, default_value_t = 384)]
    height: u32,

    /// Leave out the frame and grid
    #[arg(long)]
    no_axes: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    meeg_study::logging::init(args.verbose);

    let raw = Raw::read(&args.fif)?;
    let style = PlotStyle {
        width: args.width,
        height: args.height,
        with_axes: !args.no_axes,
        ..PlotStyle::default()
    };
    let picks = PickTypes::only(args.kind.into());
    let drawn = pick_and_plot(&raw, &picks, args.index, args.seconds, &args.output, &style)?;
    println!(
        "{}: {} samples ({} s @ {} Hz) → {}",
        drawn.channel,
        drawn.n_samples,
        args.seconds,
        raw.sfreq(),
        args.output.display()
    );
    Ok(())
}
