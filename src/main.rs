#![forbid(unsafe_code)]

mod console;
mod runner;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use slime_io::{DEFAULT_CONFIG_FILE, load_config_from_path};

use crate::runner::CancelOnEnter;

#[derive(Parser, Debug)]
#[command(
    name = "slimefinder",
    version,
    about = "Find positions surrounded by many slime chunks and draw them"
)]
struct Cli {
    /// Search for positions matching the criteria and save them to the results file.
    #[arg(short, long)]
    search: bool,

    /// Draw an image of every position listed in the results file.
    #[arg(short, long)]
    images: bool,

    /// Configuration file; created with defaults if missing.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if !cli.search && !cli.images {
        if let Err(e) = Cli::command().print_help() {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = load_config_from_path(&cli.config)?;
    let stop = CancelOnEnter::spawn()?;
    log::info!("press Enter to stop");
    if cli.search {
        runner::run_search(&config, &stop)?;
    }
    if cli.images {
        runner::run_images(&config, &stop)?;
    }
    Ok(())
}
