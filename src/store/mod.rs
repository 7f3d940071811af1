//! In-memory record collection keyed by `sourceId`, plus snapshot persistence.
//!
//! The store never deletes: enrichment only fills missing fields, and ingest
//! only adds records or fills gaps in existing ones.
mod snapshot;
mod types;

pub use snapshot::{read_snapshot, write_snapshot};
pub use types::{derive_source_id, Coordinates, GeoBounds, MissingField, Record, Snapshot};

use crate::address;
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// What happened to a record handed to [`RecordStore::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Merged,
    Unchanged,
}

/// Counters from building a store out of raw records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub records: usize,
    pub duplicates: usize,
    pub derived_ids: usize,
    pub dropped_coordinates: usize,
}

#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    by_source_id: HashMap<String, usize>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store, canonicalizing city and district, deriving missing ids,
    /// sanitizing coordinates and folding duplicate ids into the first
    /// occurrence.
    pub fn from_records(
        records: impl IntoIterator<Item = Record>,
        bounds: &GeoBounds,
    ) -> Result<(Self, LoadStats)> {
        let mut store = Self::new();
        let mut stats = LoadStats::default();
        for (position, mut record) in records.into_iter().enumerate() {
            if record.name.trim().is_empty() {
                return Err(anyhow!("record at position {position} has an empty name"));
            }
            record.city = record.city.as_deref().and_then(address::normalize_city);
            record.district = record
                .district
                .as_deref()
                .and_then(address::normalize_district);
            if record.source_id.trim().is_empty() {
                record.source_id =
                    derive_source_id(&record.source_type, &record.name, &record.address);
                stats.derived_ids += 1;
            }
            if record.sanitize_coordinates(bounds) {
                tracing::warn!(
                    source_id = %record.source_id,
                    "dropped invalid coordinates on load"
                );
                stats.dropped_coordinates += 1;
            }
            if store.upsert(record) != Upsert::Inserted {
                stats.duplicates += 1;
            }
        }
        stats.records = store.total_count();
        Ok((store, stats))
    }

    /// Load a snapshot file into a store.
    pub fn load(path: &Path, bounds: &GeoBounds) -> Result<(Self, LoadStats)> {
        let snapshot = read_snapshot(path)?;
        Self::from_records(snapshot.data, bounds)
            .with_context(|| format!("load records from {}", path.display()))
    }

    /// Checkpoint the whole store to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_snapshot(path, &self.snapshot())
    }

    /// Records still lacking `field`, in store order. Side-effect free.
    pub fn records_missing(
        &self,
        field: MissingField,
    ) -> impl Iterator<Item = (usize, &Record)> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, record)| record.is_missing(field))
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Replace the record at `index` in place.
    ///
    /// The replacement must keep its `sourceId` and carry either both
    /// coordinates or neither.
    pub fn update(&mut self, index: usize, record: Record) -> Result<()> {
        let slot = self
            .records
            .get_mut(index)
            .ok_or_else(|| anyhow!("no record at index {index}"))?;
        if slot.source_id != record.source_id {
            return Err(anyhow!(
                "update at index {index} changes sourceId {:?} to {:?}",
                slot.source_id,
                record.source_id
            ));
        }
        if record.latitude.is_some() != record.longitude.is_some() {
            return Err(anyhow!(
                "update at index {index} carries a partial coordinate pair"
            ));
        }
        *slot = record;
        Ok(())
    }

    /// Insert a new record, or fill the gaps of the existing one with the same id.
    pub fn upsert(&mut self, record: Record) -> Upsert {
        if let Some(&index) = self.by_source_id.get(&record.source_id) {
            if self.records[index].fill_missing_from(&record) {
                return Upsert::Merged;
            }
            return Upsert::Unchanged;
        }
        self.by_source_id
            .insert(record.source_id.clone(), self.records.len());
        self.records.push(record);
        Upsert::Inserted
    }

    /// Immutable copy for checkpointing, with `totalCount` recomputed.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            total_count: self.records.len(),
            data: self.records.clone(),
        }
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
