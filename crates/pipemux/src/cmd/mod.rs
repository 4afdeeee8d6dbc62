use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fork producers and multiplex their pipes to a log file and stdout.
    Run(RunArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn dispatch(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Number of producer processes to fork.
    #[arg(long, short = 'p', default_value = "5")]
    pub producers: usize,
    /// Total run duration (e.g. 30s, 500ms).
    #[arg(long, default_value = "30s")]
    pub duration: String,
    /// Maximum per-iteration generator sleep (whole seconds).
    #[arg(long, default_value = "2s")]
    pub max_sleep: String,
    /// Seed for the generators' sleep schedule.
    #[arg(long, default_value = "0")]
    pub seed: u64,
    /// Log file path (created fresh, truncated).
    #[arg(long, short = 'o', default_value = "output.txt")]
    pub output: PathBuf,
    /// All producers generate; do not relay stdin through the last one.
    #[arg(long)]
    pub no_relay: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
