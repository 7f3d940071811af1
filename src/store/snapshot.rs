//! Durable snapshot I/O.
//!
//! Writes go to a temporary file next to the target and are renamed over it,
//! so a crash mid-checkpoint leaves the previous generation intact.
use super::Snapshot;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Read a snapshot from disk.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let bytes = fs::read(path).with_context(|| format!("read snapshot {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse snapshot JSON {}", path.display()))?;
    Ok(snapshot)
}

/// Replace the snapshot at `path`, recomputing `totalCount`.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;

    let mut serializable = snapshot.clone();
    serializable.total_count = serializable.data.len();
    let text = serde_json::to_string_pretty(&serializable).context("serialize snapshot")?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    tmp.write_all(text.as_bytes())
        .with_context(|| format!("write {}", tmp.path().display()))?;
    tmp.write_all(b"\n")
        .with_context(|| format!("write {}", tmp.path().display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync {}", tmp.path().display()))?;
    tmp.persist(path)
        .with_context(|| format!("publish {}", path.display()))?;
    Ok(())
}
