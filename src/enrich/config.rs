//! Enrichment run configuration.
//!
//! Loaded from an optional JSON file, defaulted field by field, overridden by
//! command-line flags, and validated before any job is dispatched.
use super::CONFIG_SCHEMA_VERSION;
use crate::geocode::{ARCGIS_FIND_ADDRESS_URL, GOOGLE_GEOCODE_URL};
use crate::store::GeoBounds;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Tunables for one enrichment run.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichConfig {
    pub schema_version: u32,
    /// Concurrent lookups in flight.
    pub workers: usize,
    /// Completed jobs between checkpoints.
    pub save_interval: usize,
    /// Delay each worker waits between consecutive requests.
    pub pacing_ms: u64,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Completed jobs between progress lines.
    pub progress_interval: usize,
    pub bounds: GeoBounds,
    pub services: ServiceConfig,
}

/// External service endpoints and request parameters.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub geocode_url: String,
    pub reverse_url: String,
    pub language: String,
    pub region: String,
    pub max_locations: u32,
    pub out_sr: u32,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        default_config()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            geocode_url: ARCGIS_FIND_ADDRESS_URL.to_string(),
            reverse_url: GOOGLE_GEOCODE_URL.to_string(),
            language: "zh-TW".to_string(),
            region: "tw".to_string(),
            max_locations: 6,
            out_sr: 4326,
        }
    }
}

/// Defaults sized for the public geocoding services' rate limits.
pub fn default_config() -> EnrichConfig {
    EnrichConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        workers: 5,
        save_interval: 50,
        pacing_ms: 100,
        timeout_ms: 10_000,
        progress_interval: 50,
        bounds: GeoBounds::TAIWAN,
        services: ServiceConfig::default(),
    }
}

/// Load a config file.
pub fn load_config(path: &Path) -> Result<EnrichConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: EnrichConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    Ok(config)
}

/// Load `path` when given, otherwise start from defaults.
pub fn load_config_optional(path: Option<&Path>) -> Result<EnrichConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(default_config()),
    }
}

/// Reject values that would make a run meaningless or unbounded.
pub fn validate_config(config: &EnrichConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.workers == 0 {
        return Err(anyhow!("workers must be at least 1"));
    }
    if config.save_interval == 0 {
        return Err(anyhow!("save_interval must be at least 1"));
    }
    if config.timeout_ms == 0 {
        return Err(anyhow!("timeout_ms must be greater than 0"));
    }
    if config.progress_interval == 0 {
        return Err(anyhow!("progress_interval must be at least 1"));
    }
    validate_bounds(&config.bounds)?;

    let services = &config.services;
    for (label, url) in [
        ("geocode_url", &services.geocode_url),
        ("reverse_url", &services.reverse_url),
    ] {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(anyhow!("{label} must be an http(s) URL (got {url:?})"));
        }
    }
    if services.language.trim().is_empty() || services.region.trim().is_empty() {
        return Err(anyhow!("language and region must be non-empty"));
    }
    if services.max_locations == 0 {
        return Err(anyhow!("max_locations must be at least 1"));
    }
    Ok(())
}

fn validate_bounds(bounds: &GeoBounds) -> Result<()> {
    let values = [
        bounds.min_latitude,
        bounds.max_latitude,
        bounds.min_longitude,
        bounds.max_longitude,
    ];
    if values.iter().any(|value| !value.is_finite()) {
        return Err(anyhow!("bounds must be finite"));
    }
    if bounds.min_latitude >= bounds.max_latitude || bounds.min_longitude >= bounds.max_longitude
    {
        return Err(anyhow!("bounds must have min < max on both axes"));
    }
    if bounds.min_latitude < -90.0
        || bounds.max_latitude > 90.0
        || bounds.min_longitude < -180.0
        || bounds.max_longitude > 180.0
    {
        return Err(anyhow!("bounds exceed the geographic range"));
    }
    Ok(())
}

impl EnrichConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
