//! External geocoding services, one capability per direction.
//!
//! Both directions fail soft: every failure comes back as a [`LookupError`]
//! value the caller tallies, never as an error that aborts a batch. There is
//! no retry here; a record left unfilled is simply selected again next run.
mod arcgis;
mod google;
mod http;

pub use arcgis::{ArcGisGeocoder, ARCGIS_FIND_ADDRESS_URL};
pub use google::{GoogleReverseGeocoder, GOOGLE_GEOCODE_URL};
pub use http::HttpClient;

use crate::store::Coordinates;
use thiserror::Error;

/// Why a lookup produced no usable result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("empty query")]
    EmptyQuery,
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("service error: {0}")]
    Service(String),
    #[error("no result")]
    NoResult,
    #[error("coordinates {0} outside the valid area")]
    OutOfBounds(Coordinates),
}

impl LookupError {
    /// Stable label used to tally failures by kind.
    pub fn reason(&self) -> &'static str {
        match self {
            LookupError::EmptyQuery => "empty_query",
            LookupError::Timeout => "timeout",
            LookupError::Transport(_) => "transport",
            LookupError::Status(_) => "http_status",
            LookupError::Malformed(_) => "malformed",
            LookupError::Service(_) => "service",
            LookupError::NoResult => "no_result",
            LookupError::OutOfBounds(_) => "out_of_bounds",
        }
    }
}

/// Address → coordinate lookup.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str) -> Result<Coordinates, LookupError>;
}

/// Coordinate → formatted address lookup.
pub trait ReverseGeocoder: Send + Sync {
    fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, LookupError>;
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
