//! Google API key discovery.
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "API_KEY"];
const DOTENV_KEYS: [&str; 3] = ["key", "API_KEY", "GOOGLE_API_KEY"];

/// Resolve the reverse-geocoding key from the environment, then from `.env`
/// files in `search_dirs` (first hit wins).
///
/// The environment is consulted before any `.env` file on purpose: an exported
/// `GOOGLE_API_KEY` or `API_KEY` overrides a key checked into the data
/// directory.
pub fn resolve_api_key(search_dirs: &[PathBuf]) -> Result<String> {
    resolve_api_key_with(|name| std::env::var(name).ok(), search_dirs)
}

pub(crate) fn resolve_api_key_with(
    lookup: impl Fn(&str) -> Option<String>,
    search_dirs: &[PathBuf],
) -> Result<String> {
    for name in ENV_VARS {
        if let Some(value) = lookup(name).map(|value| value.trim().to_string()) {
            if !value.is_empty() {
                tracing::debug!(source = name, "using API key from environment");
                return Ok(value);
            }
        }
    }
    for dir in search_dirs {
        let path = dir.join(".env");
        if let Some(value) = read_dotenv_key(&path)? {
            tracing::debug!(source = %path.display(), "using API key from .env");
            return Ok(value);
        }
    }
    Err(anyhow!(
        "no Google API key found: set GOOGLE_API_KEY or add GOOGLE_API_KEY=... to a .env file"
    ))
}

fn read_dotenv_key(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(parse_dotenv_key(&text))
}

/// First `key=`, `API_KEY=` or `GOOGLE_API_KEY=` line with a non-empty value.
pub(crate) fn parse_dotenv_key(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let line = line.trim();
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (name, value) = line.split_once('=')?;
        if !DOTENV_KEYS.contains(&name.trim()) {
            return None;
        }
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}
