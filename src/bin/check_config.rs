use std::path::PathBuf;
use anyhow::Result;
use clap::{ArgGroup, Parser};
use meeg_study::config::{presets, StudyConfig};

#[derive(Parser)]
#[command(name = "check_config", about = "Validate a study configuration and print a summary")]
#[command(group(ArgGroup::new("source").required(true).args(["config", "preset", "list"])))]
struct Args {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of a bundled preset (see --list)
    #[arg(long)]
    preset: Option<String>,

    /// List bundled presets and exit
    #[arg(long)]
    list: bool,

    /// Print the configuration back as YAML
    #[arg(long)]
    print: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    meeg_study::logging::init(args.verbose);

    if args.list {
        for name in presets::names() {
            println!("{name}");
        }
        return Ok(());
    }

    let cfg = match (&args.config, &args.preset) {
        (Some(path), _) => StudyConfig::from_yaml_file(path)?,
        (None, Some(name)) => presets::load(name)?,
        (None, None) => unreachable!("clap requires a source"),
    };

    println!("study         {}", cfg.study_name);
    println!("bids_root     {}", cfg.bids_root.display());
    println!("deriv_root    {}", cfg.deriv_root.display());
    println!("subjects_dir  {}", cfg.subjects_dir.display());
    println!("subjects      {}", cfg.subjects_to_process().join(", "));
    println!("ch_types      {}", cfg.ch_types.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", "));
    println!("conditions    {}", cfg.conditions.join(", "));
    for c in &cfg.contrasts {
        println!("contrast      {}", c.name());
    }
    let warnings = cfg.check().warnings;
    println!("OK ({} warning{})", warnings.len(), if warnings.len() == 1 { "" } else { "s" });

    if args.print {
        print!("{}", cfg.to_yaml()?);
    }
    Ok(())
}
