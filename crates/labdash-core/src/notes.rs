use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;
use crate::fs::write_atomic;
use crate::models::Notes;

pub const NOTES_FILE_NAME: &str = "_dashboard_notes.json";

#[must_use]
pub fn notes_path(run_dir: &Path) -> PathBuf {
    run_dir.join(NOTES_FILE_NAME)
}

/// Missing or unreadable sidecars read as no notes.
#[must_use]
pub fn load_notes(run_dir: &Path) -> Notes {
    let path = notes_path(run_dir);
    let Ok(raw) = fs::read_to_string(&path) else {
        return Notes::new();
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!(notes = %path.display(), error = %err, "ignoring corrupt notes file");
        Notes::new()
    })
}

pub fn save_notes(run_dir: &Path, notes: &Notes) -> Result<()> {
    let raw = serde_json::to_string_pretty(notes)?;
    write_atomic(&notes_path(run_dir), &raw)
}
