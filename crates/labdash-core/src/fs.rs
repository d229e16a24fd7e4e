use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{DashboardError, Result};

pub const RUN_DIR_PREFIX: &str = "all_test_";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Resolves `<base>/<platform>/all_test_<date>` paths under one report root.
#[derive(Debug, Clone)]
pub struct ReportTree {
    root: PathBuf,
}

impl ReportTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platform_dir(&self, platform: &str) -> Result<PathBuf> {
        ensure_segment("platform", platform)?;
        Ok(self.root.join(platform))
    }

    /// Run directory for `date`, or `None` when no matching directory exists.
    ///
    /// `all_test_<date>` is tried verbatim first; otherwise a sibling whose
    /// date suffix parses to the same calendar day is accepted.
    pub fn run_dir(&self, platform: &str, date: &str) -> Result<Option<PathBuf>> {
        ensure_segment("date", date)?;
        let platform_dir = self.platform_dir(platform)?;
        let exact = platform_dir.join(format!("{RUN_DIR_PREFIX}{date}"));
        if exact.is_dir() {
            return Ok(Some(exact));
        }

        let Some(wanted) = normalize_date(date) else {
            return Ok(None);
        };
        Ok(self
            .run_dirs(platform)?
            .into_iter()
            .find(|(raw, _)| normalize_date(raw) == Some(wanted))
            .map(|(_, path)| path))
    }

    /// `(date suffix, path)` for every run directory of a platform.
    pub fn run_dirs(&self, platform: &str) -> Result<Vec<(String, PathBuf)>> {
        let platform_dir = self.platform_dir(platform)?;
        if !platform_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&platform_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(date) = name.strip_prefix(RUN_DIR_PREFIX) else {
                continue;
            };
            if entry.path().is_dir() {
                out.push((date.to_string(), entry.path()));
            }
        }
        Ok(out)
    }

    /// Non-hidden directories directly under the report root.
    pub fn platforms(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') && entry.path().is_dir() {
                out.push(name);
            }
        }
        out.sort();
        Ok(out)
    }
}

#[must_use]
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Rejects values that would escape their directory when joined as one
/// path component.
pub fn ensure_segment(label: &str, value: &str) -> Result<()> {
    if value.contains('/') || value.contains('\\') || value.contains("..") || value.contains('\0')
    {
        return Err(DashboardError::Validation(format!(
            "invalid {label} path segment: {value}"
        )));
    }
    Ok(())
}

/// Writes `content` to a sibling temp file, then renames it over `path`.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        DashboardError::Validation(format!("target has no parent: {}", path.display()))
    })?;
    let file_name = path.file_name().and_then(|x| x.to_str()).ok_or_else(|| {
        DashboardError::Validation(format!("invalid target filename: {}", path.display()))
    })?;
    let tmp_path = parent.join(format!(
        ".{file_name}.labdash.tmp.{}",
        uuid::Uuid::new_v4().simple()
    ));

    {
        let mut tmp = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&tmp_path)?;
        tmp.write_all(content.as_bytes())?;
        tmp.sync_all()?;
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(DashboardError::from(err));
    }
    Ok(())
}
