//! Google Geocoding API client used for reverse lookups.
use super::{HttpClient, LookupError, ReverseGeocoder};
use crate::store::Coordinates;
use serde::Deserialize;

pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

pub struct GoogleReverseGeocoder {
    http: HttpClient,
    endpoint: String,
    api_key: String,
    language: String,
    region: String,
}

impl GoogleReverseGeocoder {
    pub fn new(
        http: HttpClient,
        endpoint: String,
        api_key: String,
        language: String,
        region: String,
    ) -> Self {
        Self {
            http,
            endpoint,
            api_key,
            language,
            region,
        }
    }
}

impl ReverseGeocoder for GoogleReverseGeocoder {
    fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, LookupError> {
        let latlng = format!("{},{}", coordinates.latitude, coordinates.longitude);
        let body = self.http.get_text(
            &self.endpoint,
            &[
                ("latlng", &latlng),
                ("key", &self.api_key),
                ("language", &self.language),
                ("region", &self.region),
            ],
        )?;
        first_formatted_address(&body)
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: Option<String>,
}

/// Extract the first result's formatted address from a Geocoding API reply.
pub(super) fn first_formatted_address(body: &str) -> Result<String, LookupError> {
    let response: GeocodeResponse =
        serde_json::from_str(body).map_err(|err| LookupError::Malformed(err.to_string()))?;
    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Err(LookupError::NoResult),
        status => {
            let detail = response
                .error_message
                .unwrap_or_else(|| status.to_string());
            return Err(LookupError::Service(detail));
        }
    }
    response
        .results
        .into_iter()
        .next()
        .and_then(|result| result.formatted_address)
        .map(|address| address.trim().to_string())
        .filter(|address| !address.is_empty())
        .ok_or(LookupError::NoResult)
}
