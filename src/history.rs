use crate::model::StreamingRecord;
use anyhow::{Context, Result};
use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const EXPORT_PREFIX: &str = "Streaming_History_Audio_";

/// Decodes one export file. The top level must be an array; entries that
/// don't fit the record shape are logged and dropped.
pub fn parse_history(raw: &str) -> Result<Vec<StreamingRecord>> {
    let entries: Vec<Value> =
        serde_json::from_str(raw).context("history export is not a JSON array")?;

    let total = entries.len();
    let mut skipped = 0_usize;
    let mut records = Vec::with_capacity(total);
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<StreamingRecord>(entry) {
            Ok(record) => records.push(record),
            Err(err) => {
                skipped += 1;
                log::debug!("skipping history entry {index}: {err}");
            }
        }
    }

    if skipped > 0 {
        log::warn!("skipped {skipped} of {total} malformed history entries");
    }
    let untimed = records
        .iter()
        .filter(|record| record.played_at().is_none())
        .count();
    if untimed > 0 {
        log::warn!("{untimed} history entries have an unreadable timestamp");
    }
    Ok(records)
}

pub fn load_history_file(path: &Path) -> Result<Vec<StreamingRecord>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let records =
        parse_history(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    log::info!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Finds `Streaming_History_Audio_*.json` files below `root`, in path order.
pub fn discover_history_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_history_export(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn is_history_export(path: &Path) -> bool {
    let has_prefix = path
        .file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.starts_with(EXPORT_PREFIX));
    let is_json = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    has_prefix && is_json
}

/// Concatenates every file and orders the result by play time.
pub fn load_history(paths: &[PathBuf]) -> Result<Vec<StreamingRecord>> {
    let mut records = Vec::new();
    for path in paths {
        records.append(&mut load_history_file(path)?);
    }
    sort_by_timestamp(&mut records);
    Ok(records)
}

pub fn load_history_dir(root: &Path) -> Result<Vec<StreamingRecord>> {
    let files = discover_history_files(root);
    if files.is_empty() {
        anyhow::bail!(
            "no {EXPORT_PREFIX}*.json files found under {}",
            root.display()
        );
    }
    load_history(&files)
}

/// Stable ascending sort on the parsed instant. Unreadable timestamps go
/// last, in their original order.
pub fn sort_by_timestamp(records: &mut [StreamingRecord]) {
    records.sort_by_cached_key(|record| {
        let at = record.played_at();
        (at.is_none(), at)
    });
}
