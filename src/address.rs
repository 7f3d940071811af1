//! Free-text Taiwanese address decomposition.
//!
//! Addresses arrive as one string, e.g. `臺北市北投區榮華三路與磺溪旁`. The
//! parser peels off the city prefix and the district that follows it, and
//! leaves the rest untouched.
use regex::Regex;
use std::sync::LazyLock;

/// Top-level administrative names, in priority order. Both spellings of the
/// 臺/台 homophone are listed so raw data matches either way.
const CITY_NAMES: [&str; 26] = [
    "臺北市", "台北市", "新北市", "桃園市", "臺中市", "台中市", "臺南市", "台南市", "高雄市",
    "基隆市", "新竹市", "嘉義市", "新竹縣", "苗栗縣", "彰化縣", "南投縣", "雲林縣", "嘉義縣",
    "屏東縣", "宜蘭縣", "花蓮縣", "臺東縣", "台東縣", "澎湖縣", "金門縣", "連江縣",
];

/// Characters that terminate a second-level administrative name.
const DISTRICT_SUFFIXES: [char; 5] = ['區', '市', '鎮', '鄉', '縣'];

static DISTRICT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^區市鎮鄉縣]{1,4}[區市鎮鄉縣]").expect("district pattern compiles")
});

static LOCALE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d{3,6}\s*)?(?:[臺台]灣(?:省)?)?\s*(?:\d{3,6}\s*)?")
        .expect("locale prefix pattern compiles")
});

/// Result of splitting an address into administrative components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub city: Option<String>,
    pub district: Option<String>,
    pub remainder: String,
}

impl ParsedAddress {
    /// Apply the canonical spelling to city and district.
    pub fn normalized(self) -> Self {
        Self {
            city: self.city.as_deref().and_then(normalize_city),
            district: self.district.as_deref().and_then(normalize_district),
            remainder: self.remainder,
        }
    }
}

/// Split `address` into city, district and remainder.
///
/// The city is matched against the known names (longest first); the district
/// is only looked for once a city is known, either matched or from
/// `fallback_city`. Unmatched components fall back to the provided values.
pub fn parse(
    address: &str,
    fallback_city: Option<&str>,
    fallback_district: Option<&str>,
) -> ParsedAddress {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return ParsedAddress {
            city: fallback_city.map(str::to_string),
            district: fallback_district.map(str::to_string),
            remainder: String::new(),
        };
    }

    let mut rest = trimmed;
    let mut city = match_city(rest).map(|name| {
        rest = &rest[name.len()..];
        name.to_string()
    });
    if city.is_none() {
        city = fallback_city.map(str::to_string);
    }

    let mut district = None;
    if city.is_some() && !rest.is_empty() {
        if let Some(found) = DISTRICT_PATTERN.find(rest) {
            district = Some(found.as_str().to_string());
            rest = &rest[found.end()..];
        }
    }
    if district.is_none() {
        district = fallback_district.map(str::to_string);
    }

    ParsedAddress {
        city,
        district,
        remainder: rest.trim().to_string(),
    }
}

fn match_city(address: &str) -> Option<&'static str> {
    let mut best: Option<&'static str> = None;
    for name in CITY_NAMES {
        if !address.starts_with(name) {
            continue;
        }
        // Strictly longer only, so equal-length names keep list priority.
        if best.is_none_or(|current| name.chars().count() > current.chars().count()) {
            best = Some(name);
        }
    }
    best
}

/// Canonical spelling for a city name; `None` for blank input.
pub fn normalize_city(city: &str) -> Option<String> {
    normalize_name(city)
}

/// Canonical spelling for a district name; `None` for blank input.
pub fn normalize_district(district: &str) -> Option<String> {
    normalize_name(district)
}

/// Unify the 台/臺 homophone on 臺 and trim. Idempotent.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.replace('台', "臺"))
}

/// Append `區` to a bare district name that carries no administrative suffix.
pub fn complete_district(district: &str) -> Option<String> {
    let trimmed = district.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.ends_with(DISTRICT_SUFFIXES) {
        return Some(trimmed.to_string());
    }
    Some(format!("{trimmed}區"))
}

/// Drop the postal code and country name a reverse-geocoded address leads with,
/// e.g. `112台灣臺北市北投區…` becomes `臺北市北投區…`.
pub fn strip_locale_prefix(address: &str) -> &str {
    match LOCALE_PREFIX.find(address) {
        Some(found) => &address[found.end()..],
        None => address,
    }
}

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;
