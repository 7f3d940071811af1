//! Command-line entry point.
//!
//! Snapshots of civic amenities (parks, playgrounds) are ingested from
//! scraped JSON, then enriched by geocoding addresses and reverse geocoding
//! coordinates until every record carries both.
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod address;
mod cli;
mod enrich;
mod geocode;
mod ingest;
mod store;
mod twd97;
mod util;
mod workflow;

fn main() -> Result<()> {
    let args = cli::RootArgs::parse();
    init_logging(args.command.verbose());
    match args.command {
        cli::Command::Enrich(args) => workflow::run_enrich(&args),
        cli::Command::Ingest(args) => workflow::run_ingest(&args),
        cli::Command::Status(args) => workflow::run_status(&args),
    }
}

/// Log to stderr; `RUST_LOG` overrides the level picked from `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "amenrich=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
