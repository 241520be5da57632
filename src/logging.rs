//! Log setup shared by the binaries.
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset: `info`, `-v` debug, `-vv` trace.
pub fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// [`default_level`].
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
