//! Command line dumper for HSPICE binary result files

mod summary;

use std::{
    path::PathBuf,
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use clap::Parser;
use hspice_read::{read_metadata, read_with, HspiceError, NameStyle, ReadOptions};
use summary::{MetadataSummary, ResultSummary};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "hspice-dump",
    version = env!("CARGO_PKG_VERSION"),
    about = "Print the header and data of an HSPICE binary result file",
    long_about = None,
)]
struct Cli {
    /// Result file (.tr0, .ac0, .sw0)
    path: PathBuf,
    /// Diagnostic verbosity; repeat for per-record detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
    /// Include every sample in the output
    #[arg(long)]
    values: bool,
    /// Lower-case names and strip the `v(...)` wrapper
    #[arg(long)]
    legacy_names: bool,
    /// Stop after the header, variable table and sweep declaration
    #[arg(long)]
    header_only: bool,
}

/// `RUST_LOG` wins over the `-d` count when set
fn init_tracing(debug: u8) {
    let level = match debug {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print<T: serde::Serialize + std::fmt::Display>(value: &T, json: bool) -> Result<(), HspiceError> {
    if json {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| HspiceError::Io(std::io::Error::other(e)))?;
        println!("{}", text);
    } else {
        print!("{}", value);
    }
    Ok(())
}

fn run(cli: &Cli, cancel: &AtomicBool) -> Result<(), HspiceError> {
    let style = if cli.legacy_names {
        NameStyle::Legacy
    } else {
        NameStyle::Verbatim
    };
    let options = ReadOptions::with_debug(i32::from(cli.debug))
        .name_style(style)
        .cancel_on(cancel);

    if cli.header_only {
        let meta = read_metadata(&cli.path, &options)?;
        return print(&MetadataSummary::from(&meta), cli.json);
    }

    let result = read_with(&cli.path, &options)?;
    print(&ResultSummary::new(&result, cli.values), cli.json)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        warn!("cannot install Ctrl+C handler: {e}");
    }

    match run(&cli, &cancel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(HspiceError::Cancelled) => {
            error!("interrupted");
            ExitCode::from(130)
        }
        Err(e) => {
            error!("{}: {e}", cli.path.display());
            ExitCode::FAILURE
        }
    }
}
