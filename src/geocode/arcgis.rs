//! ArcGIS World Geocoding `findAddressCandidates` client.
use super::{Geocoder, HttpClient, LookupError};
use crate::store::Coordinates;
use crate::twd97;
use serde::Deserialize;

pub const ARCGIS_FIND_ADDRESS_URL: &str =
    "https://geocode.arcgis.com/arcgis/rest/services/World/GeocodeServer/findAddressCandidates";

/// WGS84 geographic coordinates.
const WGS84_WKID: u32 = 4326;

pub struct ArcGisGeocoder {
    http: HttpClient,
    endpoint: String,
    out_sr: u32,
    max_locations: u32,
}

impl ArcGisGeocoder {
    pub fn new(http: HttpClient, endpoint: String, out_sr: u32, max_locations: u32) -> Self {
        Self {
            http,
            endpoint,
            out_sr,
            max_locations,
        }
    }
}

impl Geocoder for ArcGisGeocoder {
    fn geocode(&self, address: &str) -> Result<Coordinates, LookupError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(LookupError::EmptyQuery);
        }
        let out_sr = format!("{{\"wkid\":{}}}", self.out_sr);
        let max_locations = self.max_locations.to_string();
        let body = self.http.get_text(
            &self.endpoint,
            &[
                ("SingleLine", address),
                ("f", "json"),
                ("outSR", &out_sr),
                ("outFields", "Addr_type,Match_addr,StAddr,City"),
                ("maxLocations", &max_locations),
            ],
        )?;
        best_candidate(&body)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidatesResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    spatial_reference: Option<SpatialReference>,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    location: Option<Location>,
}

#[derive(Deserialize)]
struct Location {
    x: Option<f64>,
    y: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpatialReference {
    #[serde(default)]
    wkid: Option<u32>,
    #[serde(default)]
    latest_wkid: Option<u32>,
}

#[derive(Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Pick the highest-scored candidate of a `findAddressCandidates` reply.
///
/// Equal scores keep whichever the service listed first.
pub(super) fn best_candidate(body: &str) -> Result<Coordinates, LookupError> {
    let response: CandidatesResponse =
        serde_json::from_str(body).map_err(|err| LookupError::Malformed(err.to_string()))?;
    if let Some(error) = response.error {
        let message = error.message.unwrap_or_else(|| "unknown error".to_string());
        return Err(LookupError::Service(match error.code {
            Some(code) => format!("{code}: {message}"),
            None => message,
        }));
    }

    let mut best: Option<(f64, &Candidate)> = None;
    for candidate in &response.candidates {
        let score = candidate.score.unwrap_or(0.0);
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, candidate));
        }
    }
    let (_, candidate) = best.ok_or(LookupError::NoResult)?;
    let (x, y) = candidate
        .location
        .as_ref()
        .and_then(|location| Some((location.x?, location.y?)))
        .ok_or_else(|| LookupError::Malformed("best candidate has no location".to_string()))?;

    let wkid = response
        .spatial_reference
        .and_then(|reference| reference.latest_wkid.or(reference.wkid))
        .unwrap_or(WGS84_WKID);
    if wkid == twd97::TWD97_TM2_121_WKID {
        if !twd97::is_valid_grid_input(x, y) {
            return Err(LookupError::Malformed(format!(
                "invalid grid coordinates ({x}, {y})"
            )));
        }
        let (latitude, longitude) = twd97::to_geographic(x, y);
        return Ok(Coordinates::new(latitude, longitude));
    }
    // ArcGIS puts longitude in x and latitude in y.
    Ok(Coordinates::new(y, x))
}
