//! Builds a [`Summary`] for one run directory by reading every report entry
//! in it. Entries are parsed independently; a failed entry is recorded as a
//! diagnostic and the walk moves on.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, warn};

use crate::bundle::{DirBundle, ReportBundle, TarBundle};
use crate::cache::CACHE_FILE_NAME;
use crate::classify::{
    Classification, classify, extract_commit_hash, extract_run_timestamp, is_report_archive,
};
use crate::metadata::{
    self, COMMIT_URL_FILE, FBOSS_COMMIT_ID, FW_INFO_FILE, HW_INFO_FILE, RunWindow,
    TEST_STATUS_FILE, VERSION_INFO_FILE, WINDOW_TIME_FORMAT,
};
use crate::models::{BucketKey, Category, Level, Summary, VersionInfo};
use crate::reconcile::{CsvTally, mine_running_tests, reconcile_csv};

/// Everything read out of one archive or extracted directory.
#[derive(Debug, Clone)]
pub struct EntryReport {
    pub name: String,
    pub classification: Classification,
    pub version_info: Option<VersionInfo>,
    /// Name-derived and hardware/firmware fields; always merged.
    pub extended_info: VersionInfo,
    pub commit_hash: Option<String>,
    pub timestamp: Option<String>,
    pub window: Option<RunWindow>,
    pub tallies: Vec<(String, CsvTally)>,
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub name: String,
    pub reason: String,
}

fn text(bytes: &[u8]) -> Result<String, String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|err| err.to_string())
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Reads one entry. Only failing to open the entry at all is fatal to it;
/// unreadable member files become diagnostics.
pub fn read_entry(
    path: &Path,
    name: &str,
    classification: Classification,
) -> Result<EntryReport, EntryFailure> {
    let bundle: Box<dyn ReportBundle> = if path.is_dir() {
        Box::new(DirBundle::new(path))
    } else {
        Box::new(TarBundle::open(path).map_err(|err| EntryFailure {
            name: name.to_string(),
            reason: err.to_string(),
        })?)
    };

    let header = format!(
        "{name}: {} members, bucket {}",
        bundle.entry_count(),
        classification.key
    );
    let mut report = EntryReport {
        name: name.to_string(),
        classification,
        version_info: None,
        extended_info: VersionInfo::new(),
        commit_hash: extract_commit_hash(name),
        timestamp: extract_run_timestamp(name),
        window: None,
        tallies: Vec::new(),
        diagnostics: vec![header],
    };

    if let Some(raw) = bundle.root_file(VERSION_INFO_FILE) {
        match text(&raw) {
            Ok(content) => report.version_info = Some(metadata::parse_version_info(&content)),
            Err(err) => report
                .diagnostics
                .push(format!("error parsing {VERSION_INFO_FILE} in {name}: {err}")),
        }
    }

    if report.classification.extended_version_info {
        metadata::parse_linktest_name(name).apply(&mut report.extended_info);
        if let Some(raw) = bundle.root_file(HW_INFO_FILE) {
            report
                .extended_info
                .extend(metadata::parse_hw_info(&lossy(&raw)));
        }
        if let Some(raw) = bundle.root_file(FW_INFO_FILE) {
            report
                .extended_info
                .extend(metadata::parse_fw_info(&lossy(&raw)));
        }
        if let Some(raw) = bundle.root_file(COMMIT_URL_FILE) {
            report
                .extended_info
                .extend(metadata::parse_commit_url(&lossy(&raw)));
        }
    }

    if let Some(raw) = bundle.root_file(TEST_STATUS_FILE) {
        match text(&raw)
            .and_then(|content| metadata::parse_test_status(&content).map_err(|e| e.to_string()))
        {
            Ok(window) => report.window = Some(window),
            Err(err) => report
                .diagnostics
                .push(format!("error parsing {TEST_STATUS_FILE} in {name}: {err}")),
        }
    }

    let mut available = BTreeSet::new();
    for (log_name, raw) in bundle.files_with_suffix(".log") {
        let found = mine_running_tests(&lossy(&raw));
        report
            .diagnostics
            .push(format!("{log_name}: {} executed tests", found.len()));
        available.extend(found);
    }

    let csvs = bundle.files_with_suffix(".csv");
    if csvs.is_empty() {
        report.diagnostics.push(format!("no CSV files found in {name}"));
    }
    for (csv_name, raw) in csvs {
        match text(&raw) {
            Ok(content) => {
                let tally = reconcile_csv(&content, &available);
                report.tallies.push((csv_name, tally));
            }
            Err(err) => report
                .diagnostics
                .push(format!("error reading CSV {csv_name}: {err}")),
        }
    }

    Ok(report)
}

/// Accumulates entry reports into a summary in walk order.
struct Fold {
    summary: Summary,
    window: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl Fold {
    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(platform = %self.summary.platform, date = %self.summary.date, "{message}");
        self.summary
            .debug_logs
            .push(format!("[{}] {message}", Local::now().format("%H:%M:%S")));
    }

    fn apply(&mut self, report: EntryReport) {
        let key = report.classification.key;
        for line in &report.diagnostics {
            self.log(line.clone());
        }

        if let Some(info) = report.version_info {
            if self.summary.version_info.is_empty() {
                self.summary.version_info = info;
                self.log(format!("version info taken from {}", report.name));
            }
        }
        self.summary.version_info.extend(report.extended_info);

        let has_commit = self
            .summary
            .version_info
            .get(FBOSS_COMMIT_ID)
            .is_some_and(|id| !id.is_empty());
        if !has_commit {
            if let Some(hash) = report.commit_hash {
                self.log(format!("commit hash from filename: {hash}"));
                self.summary
                    .version_info
                    .insert(FBOSS_COMMIT_ID.to_string(), hash);
            }
        }

        let bucket = self.summary.bucket_mut(key);
        if bucket.topology.is_none() {
            bucket.topology = report.classification.topology;
        }
        if let Some(timestamp) = report.timestamp {
            bucket.timestamp = Some(timestamp);
        }
        if let Some(window) = report.window {
            bucket.start_time = Some(window.start_raw.clone());
            bucket.end_time = Some(window.end_raw.clone());
            bucket.duration = Some(window.duration());
            self.widen(&window);
        }

        for (csv_name, tally) in report.tallies {
            for line in &tally.diagnostics {
                self.log(format!("{csv_name}: {line}"));
            }
            self.log(format!(
                "{csv_name}: passed={}, failed={}, skipped={}",
                tally.passed, tally.failed, tally.skipped
            ));
            for (test, outcome) in &tally.outcomes {
                self.summary.record(key, test, *outcome);
            }
        }
    }

    fn widen(&mut self, window: &RunWindow) {
        let (start, end) = match self.window {
            Some((start, end)) => (start.min(window.start), end.max(window.end)),
            None => (window.start, window.end),
        };
        self.window = Some((start, end));
        self.summary.test_times.start = Some(start.format(WINDOW_TIME_FORMAT).to_string());
        self.summary.test_times.end = Some(end.format(WINDOW_TIME_FORMAT).to_string());
        self.summary.test_times.duration = Some(metadata::format_duration(start, end));
    }

    fn finish(mut self) -> Summary {
        let ev = BucketKey::new(Category::Link, Level::Ev);
        let ev_default = BucketKey::new(Category::Link, Level::EvDefault);
        let ev_empty = self.summary.bucket(ev).is_none_or(|stats| stats.is_empty());
        if ev_empty {
            if let Some(stats) = self.summary.bucket(ev_default).filter(|s| !s.is_empty()) {
                let stats = stats.clone();
                *self.summary.bucket_mut(ev) = stats;
            }
        }
        self.summary
    }
}

/// Report entries of a run directory, sorted by name.
fn report_entries(run_dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(run_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let path = entry.path();
        if name == CACHE_FILE_NAME {
            continue;
        }
        if path.is_dir() || (path.is_file() && is_report_archive(&name)) {
            out.push((name, path));
        }
    }
    out.sort();
    Ok(out)
}

/// Full walk of `run_dir`. Never fails; problems land in `debug_logs`.
#[must_use]
pub fn build_summary(run_dir: &Path, platform: &str, date: &str) -> Summary {
    let mut fold = Fold {
        summary: Summary::new(platform, date),
        window: None,
    };

    let entries = match report_entries(run_dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(run_dir = %run_dir.display(), error = %err, "cannot list run directory");
            fold.log(format!("cannot list {}: {err}", run_dir.display()));
            return fold.finish();
        }
    };

    let mut failures = Vec::new();
    for (name, path) in entries {
        let Some(classification) = classify(&name) else {
            fold.log(format!("skipping unknown category/level for {name}"));
            continue;
        };
        match read_entry(&path, &name, classification) {
            Ok(report) => fold.apply(report),
            Err(failure) => {
                warn!(entry = %failure.name, reason = %failure.reason, "report entry skipped");
                fold.log(format!("error processing {}: {}", failure.name, failure.reason));
                failures.push(failure);
            }
        }
    }
    if !failures.is_empty() {
        debug!(count = failures.len(), "entries failed during walk");
    }
    fold.finish()
}
