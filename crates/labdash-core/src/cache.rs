//! `_dashboard_cache.json` sidecar: a serialized [`Summary`] that stays
//! valid until an archive or extracted directory next to it changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::classify::is_report_archive;
use crate::error::Result;
use crate::fs::write_atomic;
use crate::models::Summary;
use crate::notes;

pub const CACHE_FILE_NAME: &str = "_dashboard_cache.json";

#[must_use]
pub fn cache_path(run_dir: &Path) -> PathBuf {
    run_dir.join(CACHE_FILE_NAME)
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// True when the cache exists and is no older than every archive and
/// subdirectory directly inside `run_dir`. Other files are ignored.
#[must_use]
pub fn cache_valid(run_dir: &Path) -> bool {
    let Some(cache_mtime) = modified(&cache_path(run_dir)) else {
        return false;
    };
    let Ok(entries) = fs::read_dir(run_dir) else {
        return false;
    };

    for entry in entries.filter_map(std::result::Result::ok) {
        let name = entry.file_name().to_string_lossy().to_string();
        if name == CACHE_FILE_NAME {
            continue;
        }
        let path = entry.path();
        if !(path.is_dir() || is_report_archive(&name)) {
            continue;
        }
        match modified(&path) {
            Some(mtime) if mtime > cache_mtime => {
                debug!(run_dir = %run_dir.display(), entry = %name, "cache stale");
                return false;
            }
            Some(_) => {}
            None => return false,
        }
    }
    true
}

/// Reads the cache; an unreadable or corrupt file is removed and treated
/// as absent.
#[must_use]
pub fn load_cache(run_dir: &Path) -> Option<Summary> {
    let path = cache_path(run_dir);
    let parsed = fs::read_to_string(&path)
        .map_err(|err| err.to_string())
        .and_then(|raw| serde_json::from_str::<Summary>(&raw).map_err(|err| err.to_string()));
    match parsed {
        Ok(summary) => {
            info!(cache = %path.display(), "cache hit");
            Some(summary)
        }
        Err(err) => {
            warn!(cache = %path.display(), error = %err, "discarding unreadable cache");
            let _ = fs::remove_file(&path);
            None
        }
    }
}

fn existing_cache_notes(path: &Path) -> Option<crate::models::Notes> {
    let raw = fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
    serde_json::from_value(value.get("notes")?.clone()).ok()
}

/// Persists `summary`, folding in notes from the notes sidecar and any
/// cache already on disk (later sources win). Returns the summary as written.
pub fn save_cache(run_dir: &Path, mut summary: Summary) -> Result<Summary> {
    let path = cache_path(run_dir);
    summary.notes.extend(notes::load_notes(run_dir));
    if let Some(existing) = existing_cache_notes(&path) {
        summary.notes.extend(existing);
    }
    let raw = serde_json::to_string_pretty(&summary)?;
    write_atomic(&path, &raw)?;
    info!(cache = %path.display(), "cache saved");
    Ok(summary)
}
