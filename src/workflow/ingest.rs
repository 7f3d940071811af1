//! Workflow for `amenrich ingest`.
use crate::cli::IngestArgs;
use crate::enrich;
use crate::ingest::{self, IngestOptions};
use crate::store::RecordStore;
use anyhow::{anyhow, Result};

pub fn run_ingest(args: &IngestArgs) -> Result<()> {
    let source_type = args.source_type.trim();
    if source_type.is_empty() {
        return Err(anyhow!("--source-type must be non-empty"));
    }
    let config = enrich::load_config_optional(args.config.as_deref())?;
    enrich::validate_config(&config)?;

    let mut store = if args.snapshot.is_file() {
        let (store, stats) = RecordStore::load(&args.snapshot, &config.bounds)?;
        tracing::info!(records = stats.records, "extending existing snapshot");
        store
    } else {
        tracing::info!(snapshot = %args.snapshot.display(), "creating snapshot");
        RecordStore::new()
    };

    let places = ingest::read_places(&args.input)?;
    let options = IngestOptions {
        source_type: source_type.to_string(),
        fallback_city: args
            .fallback_city
            .as_deref()
            .and_then(crate::address::normalize_city),
        grid: args.grid_zone,
        bounds: config.bounds,
    };
    let summary = ingest::ingest_places(&mut store, places, &options);
    store.save(&args.snapshot)?;

    println!(
        "ingest: {} read, {} inserted, {} merged, {} unchanged, {} rejected",
        summary.read, summary.inserted, summary.merged, summary.unchanged, summary.rejected
    );
    println!(
        "  coordinates: {} projected from grid, {} missing",
        summary.projected, summary.without_coordinates
    );
    println!(
        "  snapshot: {} records -> {}",
        store.total_count(),
        args.snapshot.display()
    );
    Ok(())
}
