//! Normalization of raw scraped places into store records.
//!
//! Source adapters emit loosely typed JSON: coordinates as strings or numbers,
//! sometimes only as TWD97 grid values, addresses with the city and district
//! still attached. Each place is reduced to a [`Record`] with canonical names
//! and either a valid coordinate pair or none, then upserted by `sourceId`.
use crate::address;
use crate::store::{derive_source_id, Coordinates, GeoBounds, Record, RecordStore, Upsert};
use crate::twd97::{self, TransverseMercator};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Projection zone of grid coordinates in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GridZone {
    /// TWD97 TM2, central meridian 121°E (Taiwan main island).
    #[value(name = "121")]
    Central121,
    /// TWD97 TM2, central meridian 119°E (Penghu, Kinmen, Matsu).
    #[value(name = "119")]
    Central119,
}

impl GridZone {
    pub fn projection(self) -> TransverseMercator {
        match self {
            GridZone::Central121 => twd97::TWD97_TM2_121,
            GridZone::Central119 => twd97::TWD97_TM2_119,
        }
    }
}

/// A number that may arrive as JSON text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    /// The finite value, if any.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            LooseNumber::Number(value) => *value,
            LooseNumber::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// One scraped place as emitted by a source adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default, alias = "lat")]
    pub latitude: Option<LooseNumber>,
    #[serde(default, alias = "lng", alias = "lon")]
    pub longitude: Option<LooseNumber>,
    /// TWD97 easting.
    #[serde(default, alias = "X", alias = "X坐標")]
    pub x: Option<LooseNumber>,
    /// TWD97 northing.
    #[serde(default, alias = "Y", alias = "Y坐標")]
    pub y: Option<LooseNumber>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, alias = "source")]
    pub source_type: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Defaults applied to every place in one ingest batch.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub source_type: String,
    pub fallback_city: Option<String>,
    pub grid: GridZone,
    pub bounds: GeoBounds,
}

/// Why a place was not turned into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingName,
}

/// Counters for one ingest batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub read: usize,
    pub inserted: usize,
    pub merged: usize,
    pub unchanged: usize,
    pub rejected: usize,
    pub projected: usize,
    pub without_coordinates: usize,
}

/// Read a JSON array of raw places.
pub fn read_places(path: &Path) -> Result<Vec<RawPlace>> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse places JSON {}", path.display()))
}

/// Reduce one raw place to a record. The flag reports a grid projection.
pub fn normalize_place(
    raw: RawPlace,
    options: &IngestOptions,
) -> std::result::Result<(Record, bool), Rejection> {
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(Rejection::MissingName)?
        .to_string();

    let (coordinates, projected) = place_coordinates(&raw, options);

    let raw_address = raw.address.as_deref().unwrap_or("").trim().to_string();
    let fallback_city = raw
        .city
        .as_deref()
        .and_then(address::normalize_city)
        .or_else(|| options.fallback_city.clone());
    let fallback_district = raw.district.as_deref().and_then(address::complete_district);
    let parsed = address::parse(
        &raw_address,
        fallback_city.as_deref(),
        fallback_district.as_deref(),
    )
    .normalized();

    let mut metadata = raw.metadata;
    let address = if parsed.remainder.is_empty() {
        raw_address.clone()
    } else {
        if parsed.remainder != raw_address {
            metadata
                .entry("originalAddress")
                .or_insert_with(|| Value::String(raw_address.clone()));
        }
        parsed.remainder
    };

    let source_type = raw
        .source_type
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| options.source_type.clone());
    let source_id = raw
        .source_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| derive_source_id(&source_type, &name, &raw_address));

    let mut record = Record::new(name, source_type);
    record.address = address;
    record.city = parsed.city;
    record.district = parsed.district;
    if let Some(coordinates) = coordinates {
        record.set_coordinates(coordinates);
    }
    record.link = raw
        .link
        .map(|link| link.trim().to_string())
        .filter(|link| !link.is_empty());
    record.source_id = source_id;
    record.metadata = metadata;
    record.extra = raw.extra;
    Ok((record, projected))
}

/// Geographic coordinates when given and in bounds, else projected grid values.
fn place_coordinates(raw: &RawPlace, options: &IngestOptions) -> (Option<Coordinates>, bool) {
    let geographic = match (
        raw.latitude.as_ref().and_then(LooseNumber::value),
        raw.longitude.as_ref().and_then(LooseNumber::value),
    ) {
        (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
        _ => None,
    };
    if let Some(coordinates) = geographic.filter(|c| options.bounds.contains(*c)) {
        return (Some(coordinates), false);
    }

    let grid = match (
        raw.x.as_ref().and_then(LooseNumber::value),
        raw.y.as_ref().and_then(LooseNumber::value),
    ) {
        (Some(x), Some(y)) if twd97::is_valid_grid_input(x, y) => Some((x, y)),
        _ => None,
    };
    if let Some((x, y)) = grid {
        let (latitude, longitude) = options.grid.projection().inverse(x, y);
        let coordinates = Coordinates::new(latitude, longitude);
        if options.bounds.contains(coordinates) {
            return (Some(coordinates), true);
        }
    }
    (None, false)
}

/// Normalize and upsert a batch of places into `store`.
pub fn ingest_places(
    store: &mut RecordStore,
    places: Vec<RawPlace>,
    options: &IngestOptions,
) -> IngestSummary {
    let mut summary = IngestSummary::default();
    for (position, raw) in places.into_iter().enumerate() {
        summary.read += 1;
        let (record, projected) = match normalize_place(raw, options) {
            Ok(normalized) => normalized,
            Err(rejection) => {
                tracing::warn!(position, ?rejection, "skipping place");
                summary.rejected += 1;
                continue;
            }
        };
        if projected {
            summary.projected += 1;
        }
        if record.coordinates().is_none() {
            summary.without_coordinates += 1;
        }
        match store.upsert(record) {
            Upsert::Inserted => summary.inserted += 1,
            Upsert::Merged => summary.merged += 1,
            Upsert::Unchanged => summary.unchanged += 1,
        }
    }
    summary
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
