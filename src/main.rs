use std::process;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use trk2gis::batch::{print_summary, run_batch};
use trk2gis::cli::Cli;
use trk2gis::config::load_config;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

fn run(cli: &Cli) -> Result<()> {
    let entries = load_config(&cli.config)?.into_entries();
    tracing::info!("found {} tasks in {}", entries.len(), cli.config.display());

    let reports = run_batch(&entries);
    print_summary(&reports);
    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
