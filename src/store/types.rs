//! Record and snapshot schema types.
//!
//! These mirror the durable JSON snapshot (`{ totalCount, data: [...] }`) so a
//! file written by one run is read back unchanged by the next.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Inclusive latitude/longitude box outside which coordinates are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeoBounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl GeoBounds {
    /// The box covering Taiwan and its outlying islands.
    pub const TAIWAN: GeoBounds = GeoBounds {
        min_latitude: 20.0,
        max_latitude: 26.0,
        min_longitude: 118.0,
        max_longitude: 123.0,
    };

    pub fn contains(&self, coordinates: Coordinates) -> bool {
        let Coordinates {
            latitude,
            longitude,
        } = coordinates;
        latitude.is_finite()
            && longitude.is_finite()
            && latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::TAIWAN
    }
}

/// Which field an enrichment job fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MissingField {
    Coordinates,
    Address,
}

impl MissingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingField::Coordinates => "coordinates",
            MissingField::Address => "address",
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One amenity, as produced by the source adapters and filled by enrichment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "loose_coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "loose_coordinate")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, alias = "source", deserialize_with = "null_as_empty")]
    pub source_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_id: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Top-level keys this schema does not name, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Record {
    /// A record with only the required fields set.
    pub fn new(name: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: String::new(),
            city: None,
            district: None,
            latitude: None,
            longitude: None,
            link: None,
            source_type: source_type.into(),
            source_id: String::new(),
            metadata: Map::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Both halves of the coordinate pair, if both are present.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        }
    }

    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.latitude = Some(coordinates.latitude);
        self.longitude = Some(coordinates.longitude);
    }

    pub fn clear_coordinates(&mut self) {
        self.latitude = None;
        self.longitude = None;
    }

    pub fn has_address(&self) -> bool {
        !self.address.trim().is_empty()
    }

    /// Whether an enrichment job for `field` applies to this record.
    ///
    /// An address can only be looked up from coordinates, so a record lacking
    /// both counts as missing coordinates only.
    pub fn is_missing(&self, field: MissingField) -> bool {
        match field {
            MissingField::Coordinates => self.coordinates().is_none(),
            MissingField::Address => !self.has_address() && self.coordinates().is_some(),
        }
    }

    /// Drop a half pair or an out-of-bounds pair. Returns whether anything was dropped.
    pub fn sanitize_coordinates(&mut self, bounds: &GeoBounds) -> bool {
        if self.latitude.is_none() && self.longitude.is_none() {
            return false;
        }
        match self.coordinates() {
            Some(coordinates) if bounds.contains(coordinates) => false,
            _ => {
                self.clear_coordinates();
                true
            }
        }
    }

    /// Single-line query for address geocoding.
    ///
    /// Parsed addresses keep only the remainder, so city and district are put
    /// back in front unless the address already carries them.
    pub fn geocode_query(&self) -> String {
        let address = self.address.trim();
        let mut prefix = String::new();
        for part in [self.city.as_deref(), self.district.as_deref()]
            .into_iter()
            .flatten()
        {
            let part = part.trim();
            if part.is_empty() || address.contains(part) {
                continue;
            }
            prefix.push_str(part);
        }
        if prefix.is_empty() {
            return address.to_string();
        }
        format!("{prefix}{address}")
    }

    /// Copy fields from `other` into the ones still missing here; never overwrites.
    pub fn fill_missing_from(&mut self, other: &Record) -> bool {
        let mut changed = false;
        if !self.has_address() && other.has_address() {
            self.address = other.address.clone();
            changed = true;
        }
        if self.city.is_none() && other.city.is_some() {
            self.city = other.city.clone();
            changed = true;
        }
        if self.district.is_none() && other.district.is_some() {
            self.district = other.district.clone();
            changed = true;
        }
        if self.coordinates().is_none() {
            if let Some(coordinates) = other.coordinates() {
                self.set_coordinates(coordinates);
                changed = true;
            }
        }
        if self.link.is_none() && other.link.is_some() {
            self.link = other.link.clone();
            changed = true;
        }
        for (key, value) in &other.metadata {
            if !self.metadata.contains_key(key) {
                self.metadata.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }
}

/// Identifier for records that arrive without one.
pub fn derive_source_id(source_type: &str, name: &str, address: &str) -> String {
    let collapse = |text: &str| text.split_whitespace().collect::<Vec<_>>().join(" ");
    format!(
        "{}_{}_{}",
        collapse(source_type),
        collapse(name),
        collapse(address)
    )
}

/// On-disk shape of a record collection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, alias = "total_count")]
    pub total_count: usize,
    #[serde(default)]
    pub data: Vec<Record>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A number, or numeric text; anything else reads as absent.
fn loose_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|value| value.is_finite()))
}
