use std::fs;
use std::path::PathBuf;

use chrono::Local;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{self, cache_valid, load_cache, save_cache};
use crate::classify::{archive_prefix, exit_evt_topology};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::fs::{DATE_FORMAT, ReportTree, normalize_date};
use crate::models::{
    BucketKey, CurrentPlatform, DiffReport, Level, Notes, PlatformSource, PregenerateReport,
    Summary, TestLogDetail, TrendPoint, TrendRange,
};
use crate::notes::{load_notes, save_notes};
use crate::test_log::{describe, fallback_buckets, read_test_section};
use crate::trend;
use crate::walker::build_summary;

/// Entry point for every dashboard query, bound to one report tree.
#[derive(Debug, Clone)]
pub struct Dashboard {
    config: DashboardConfig,
    tree: ReportTree,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let tree = ReportTree::new(config.report_base.clone());
        Self { config, tree }
    }

    pub fn from_env() -> Self {
        Self::new(DashboardConfig::from_env())
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Run dates for a platform, newest first. Dates that parse sort before
    /// names that do not.
    pub fn list_dates(&self, platform: &str) -> Result<Vec<String>> {
        let mut dated = Vec::new();
        let mut undated = Vec::new();
        for (raw, _) in self.tree.run_dirs(platform)? {
            match normalize_date(&raw) {
                Some(date) => dated.push(date),
                None => undated.push(raw),
            }
        }
        dated.sort_unstable_by(|a, b| b.cmp(a));
        dated.dedup();
        undated.sort_unstable_by(|a, b| b.cmp(a));

        Ok(dated
            .into_iter()
            .map(|date| date.format(DATE_FORMAT).to_string())
            .chain(undated)
            .collect())
    }

    /// Summary for one run, from cache when still valid. `None` when the run
    /// directory does not exist.
    pub fn summary(&self, platform: &str, date: &str) -> Result<Option<Summary>> {
        let Some(run_dir) = self.tree.run_dir(platform, date)? else {
            return Ok(None);
        };

        if cache_valid(&run_dir) {
            if let Some(summary) = load_cache(&run_dir) {
                return Ok(Some(summary));
            }
        }

        info!(platform, date, "building summary from report entries");
        let summary = build_summary(&run_dir, platform, date);
        match save_cache(&run_dir, summary.clone()) {
            Ok(saved) => Ok(Some(saved)),
            Err(err) => {
                warn!(platform, date, error = %err, "cache write failed");
                Ok(Some(summary))
            }
        }
    }

    /// One point per day of `range` ending at `end_date` (today when absent
    /// or unparseable), oldest first.
    pub fn trend(
        &self,
        platform: &str,
        end_date: Option<&str>,
        bucket: Option<BucketKey>,
        range: TrendRange,
    ) -> Result<Vec<TrendPoint>> {
        let end = end_date
            .and_then(normalize_date)
            .unwrap_or_else(|| Local::now().date_naive());

        let mut points = Vec::with_capacity(range.days() as usize);
        for day in trend::window_dates(end, range) {
            let date = day.format(DATE_FORMAT).to_string();
            let summary = self.summary(platform, &date)?;
            points.push(trend::project(&date, summary.as_ref(), bucket));
        }
        Ok(points)
    }

    pub fn diff(&self, platform: &str, date_curr: &str, date_prev: &str) -> Result<DiffReport> {
        let curr = self.summary(platform, date_curr)?;
        let prev = self.summary(platform, date_prev)?;
        Ok(trend::diff(curr.as_ref(), prev.as_ref()))
    }

    /// Builds caches for every platform directory and run date that lacks
    /// a valid one.
    pub fn pregenerate_all(&self) -> Result<PregenerateReport> {
        let mut report = PregenerateReport::default();
        for platform in self.tree.platforms()? {
            for date in self.list_dates(&platform)? {
                let Some(run_dir) = self.tree.run_dir(&platform, &date)? else {
                    continue;
                };
                if cache_valid(&run_dir) {
                    report.already_cached += 1;
                    continue;
                }
                match self.summary(&platform, &date) {
                    Ok(_) => report.generated += 1,
                    Err(err) => warn!(platform = %platform, date = %date, error = %err, "pregeneration failed"),
                }
            }
        }
        info!(
            generated = report.generated,
            already_cached = report.already_cached,
            "cache pregeneration complete"
        );
        Ok(report)
    }

    fn existing_run_dir(&self, platform: &str, date: &str) -> Result<PathBuf> {
        self.tree
            .run_dir(platform, date)?
            .ok_or_else(|| DashboardError::NotFound(format!("report {platform}/{date}")))
    }

    pub fn notes(&self, platform: &str, date: &str) -> Result<Notes> {
        Ok(self
            .tree
            .run_dir(platform, date)?
            .map(|run_dir| load_notes(&run_dir))
            .unwrap_or_default())
    }

    /// Stores one note and mirrors it into the cache file when one exists.
    pub fn save_note(&self, platform: &str, date: &str, key: &str, value: Value) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DashboardError::Validation("note key must not be empty".to_string()));
        }
        let run_dir = self.existing_run_dir(platform, date)?;

        let mut notes = load_notes(&run_dir);
        notes.insert(key.to_string(), value.clone());
        save_notes(&run_dir, &notes)?;

        let cache_file = cache::cache_path(&run_dir);
        if cache_file.is_file() {
            if let Some(mut cached) = load_cache(&run_dir) {
                cached.notes.insert(key.to_string(), value);
                let raw = serde_json::to_string_pretty(&cached)?;
                crate::fs::write_atomic(&cache_file, &raw)?;
            }
        }
        info!(platform, date, key, "note saved");
        Ok(())
    }

    /// First archive in the run directory that backs `bucket`.
    pub fn locate_archive(
        &self,
        platform: &str,
        date: &str,
        bucket: BucketKey,
    ) -> Result<Option<PathBuf>> {
        let Some(prefix) = archive_prefix(bucket) else {
            return Ok(None);
        };
        let Some(run_dir) = self.tree.run_dir(platform, date)? else {
            return Ok(None);
        };

        // Same case folding as `classify`: `LINK_t1_*` backs `link/t1`.
        let prefix = prefix.to_ascii_uppercase();
        let mut names = Vec::new();
        for entry in fs::read_dir(&run_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.to_ascii_uppercase().starts_with(&prefix) && name.ends_with(".tar.gz") {
                names.push(name);
            }
        }
        names.sort();

        let topology = exit_evt_topology(bucket.level);
        Ok(names
            .into_iter()
            .find(|name| topology.is_none_or(|token| mentions_topology(name, bucket.level, token)))
            .map(|name| run_dir.join(name)))
    }

    /// Log section of one test, searched in the bucket's archive and then in
    /// the archives of the sibling categories at the same level.
    pub fn test_log_detail(
        &self,
        platform: &str,
        date: &str,
        bucket: BucketKey,
        test_name: &str,
    ) -> Result<TestLogDetail> {
        let test_name = test_name.trim();
        if test_name.is_empty() {
            return Err(DashboardError::Validation(
                "test name must not be empty".to_string(),
            ));
        }
        self.existing_run_dir(platform, date)?;
        let Some(primary) = self.locate_archive(platform, date, bucket)? else {
            return Err(DashboardError::NotFound(format!(
                "test archive for {bucket} in {platform}/{date}"
            )));
        };

        let mut archives = vec![primary];
        for fallback in fallback_buckets(bucket) {
            if let Some(path) = self.locate_archive(platform, date, fallback)? {
                archives.push(path);
            }
        }
        for archive in &archives {
            match read_test_section(archive, test_name) {
                Ok(Some(section)) => return Ok(describe(section)),
                Ok(None) => debug!(archive = %archive.display(), test_name, "test not in archive"),
                Err(err) => warn!(
                    archive = %archive.display(),
                    error = %err,
                    "cannot read test log"
                ),
            }
        }
        Err(DashboardError::NotFound(format!(
            "log for test {test_name} in {platform}/{date}"
        )))
    }

    /// Platform the lab is currently pointed at.
    pub fn current_platform(&self) -> Result<CurrentPlatform> {
        if let Some(path) = &self.config.platform_cache_file {
            let cached = fs::read_to_string(path).unwrap_or_default();
            let cached = cached.trim();
            if !cached.is_empty() {
                let has_data = !self.list_dates(cached)?.is_empty();
                return Ok(CurrentPlatform {
                    platform: cached.to_string(),
                    has_data,
                    source: PlatformSource::CacheFile,
                });
            }
        }

        let mut newest: Option<(chrono::NaiveDate, &String)> = None;
        for platform in &self.config.platforms {
            let latest = self
                .list_dates(platform)?
                .first()
                .and_then(|date| normalize_date(date));
            if let Some(date) = latest {
                if newest.is_none_or(|(best, _)| date > best) {
                    newest = Some((date, platform));
                }
            }
        }

        Ok(match newest {
            Some((_, platform)) => CurrentPlatform {
                platform: platform.clone(),
                has_data: true,
                source: PlatformSource::TestData,
            },
            None => CurrentPlatform {
                platform: self.config.platforms.first().cloned().unwrap_or_default(),
                has_data: false,
                source: PlatformSource::TestData,
            },
        })
    }
}

fn mentions_topology(name: &str, level: Level, token: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if level == Level::EvDefault {
        return lower.contains("default")
            || !["optics", "copper", "400g"]
                .iter()
                .any(|other| lower.contains(other));
    }
    lower.contains(token)
}
