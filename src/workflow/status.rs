//! Workflow for `amenrich status`.
//!
//! Status is read-only: it loads the snapshot and reports what an enrichment
//! run would dispatch in each direction.
use crate::cli::StatusArgs;
use crate::enrich;
use crate::store::{LoadStats, MissingField, RecordStore};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts over one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub records: usize,
    pub with_coordinates: usize,
    pub with_address: usize,
    pub missing_city: usize,
    pub missing_district: usize,
    /// Jobs a geocode run would dispatch.
    pub pending_geocode: usize,
    /// Jobs a reverse run would dispatch.
    pub pending_reverse: usize,
    pub duplicates: usize,
    pub invalid_coordinates: usize,
    pub by_source_type: BTreeMap<String, usize>,
}

pub fn run_status(args: &StatusArgs) -> Result<()> {
    let config = enrich::load_config_optional(args.config.as_deref())?;
    enrich::validate_config(&config)?;
    let (store, stats) = RecordStore::load(&args.snapshot, &config.bounds)?;
    let summary = status_summary(&store, &stats);
    if args.json {
        let text = serde_json::to_string_pretty(&summary).context("serialize status")?;
        println!("{text}");
        return Ok(());
    }

    println!("status: {}", args.snapshot.display());
    println!("  records: {}", summary.records);
    println!(
        "  coordinates: {} present, {} pending geocode",
        summary.with_coordinates, summary.pending_geocode
    );
    println!(
        "  address: {} present, {} pending reverse",
        summary.with_address, summary.pending_reverse
    );
    println!(
        "  missing city: {}, missing district: {}",
        summary.missing_city, summary.missing_district
    );
    if summary.duplicates > 0 || summary.invalid_coordinates > 0 {
        println!(
            "  load fixes: {} duplicate ids folded, {} invalid coordinate pairs dropped",
            summary.duplicates, summary.invalid_coordinates
        );
    }
    for (source_type, count) in &summary.by_source_type {
        println!("  source {source_type}: {count}");
    }
    Ok(())
}

pub fn status_summary(store: &RecordStore, stats: &LoadStats) -> StatusSummary {
    let records = store.records();
    let mut by_source_type = BTreeMap::new();
    for record in records {
        let key = if record.source_type.trim().is_empty() {
            "(none)".to_string()
        } else {
            record.source_type.clone()
        };
        *by_source_type.entry(key).or_insert(0) += 1;
    }
    StatusSummary {
        records: records.len(),
        with_coordinates: records
            .iter()
            .filter(|record| record.coordinates().is_some())
            .count(),
        with_address: records.iter().filter(|record| record.has_address()).count(),
        missing_city: records.iter().filter(|record| record.city.is_none()).count(),
        missing_district: records
            .iter()
            .filter(|record| record.district.is_none())
            .count(),
        pending_geocode: store.records_missing(MissingField::Coordinates).count(),
        pending_reverse: store.records_missing(MissingField::Address).count(),
        duplicates: stats.duplicates,
        invalid_coordinates: stats.dropped_coordinates,
        by_source_type,
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
