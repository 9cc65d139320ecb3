use crate::model::ShortlistEntry;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const SHORTLIST_FILE: &str = "recap-shortlist.json";

pub fn default_export_path() -> PathBuf {
    PathBuf::from(SHORTLIST_FILE)
}

/// Serializes the shortlist in insertion order as a pretty-printed JSON
/// array of camelCase records.
pub fn write_shortlist(path: &Path, entries: &[ShortlistEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
