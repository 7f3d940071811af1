//! CLI argument parsing for the enrichment workflow.
use crate::enrich::Direction;
use crate::ingest::GridZone;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "amenrich",
    version,
    about = "Geocoding enrichment for civic amenity snapshots",
    after_help = "Commands:\n  ingest --snapshot <file> --input <file> --source-type <tag>  Normalize scraped places into a snapshot\n  enrich --snapshot <file>                                      Fill missing coordinates and addresses\n  status --snapshot <file>                                      Count records still missing data\n\nExamples:\n  amenrich ingest --snapshot parks.json --input raw_parks.json --source-type park --fallback-city 臺北市\n  amenrich enrich --snapshot parks.json --direction both --workers 5\n  amenrich status --snapshot parks.json --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Enrich(EnrichArgs),
    Ingest(IngestArgs),
    Status(StatusArgs),
}

/// Enrich command inputs.
#[derive(Parser, Debug)]
#[command(about = "Geocode and reverse geocode records with missing fields")]
pub struct EnrichArgs {
    /// Snapshot to enrich
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Write checkpoints here instead of back into --snapshot
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// JSON run configuration (defaults apply when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Which lookups to run
    #[arg(long, value_enum, default_value = "geocode")]
    pub direction: Direction,

    /// Concurrent lookups (overrides config)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Completed jobs between checkpoints (overrides config)
    #[arg(long, value_name = "N")]
    pub save_interval: Option<usize>,

    /// Delay between one worker's requests in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub pacing_ms: Option<u64>,

    /// Per-request timeout in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Write the run report as JSON
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Append a one-line run summary to this JSONL file
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// Emit debug logging
    #[arg(long)]
    pub verbose: bool,
}

/// Ingest command inputs.
#[derive(Parser, Debug)]
#[command(about = "Normalize raw places and merge them into a snapshot")]
pub struct IngestArgs {
    /// Snapshot to create or extend
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// JSON array of scraped places
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Source tag for places that carry none (e.g. park, playground)
    #[arg(long, value_name = "TAG")]
    pub source_type: String,

    /// City assumed when an address does not name one
    #[arg(long, value_name = "CITY")]
    pub fallback_city: Option<String>,

    /// Projection zone of x/y grid values in the input
    #[arg(long, value_enum, default_value = "121")]
    pub grid_zone: GridZone,

    /// JSON run configuration; only its bounds are used
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit debug logging
    #[arg(long)]
    pub verbose: bool,
}

/// Status command inputs.
#[derive(Parser, Debug)]
#[command(about = "Summarize how much of a snapshot still needs enrichment")]
pub struct StatusArgs {
    /// Snapshot to inspect
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// JSON run configuration; only its bounds are used
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Emit debug logging
    #[arg(long)]
    pub verbose: bool,
}

impl Command {
    pub fn verbose(&self) -> bool {
        match self {
            Command::Enrich(args) => args.verbose,
            Command::Ingest(args) => args.verbose,
            Command::Status(args) => args.verbose,
        }
    }
}
