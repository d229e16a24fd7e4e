//! Day-by-day projections and run-to-run diffs over built summaries.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::models::{
    BucketKey, BucketMap, BucketTrendPoint, DiffEntry, DiffReport, DiffResult, DiffStats,
    OverallTrendPoint, Summary, TestCounts, TestOutcome, TrendPoint, TrendRange, VersionInfo,
};

/// The `range` calendar days ending at `end`, oldest first.
#[must_use]
pub fn window_dates(end: NaiveDate, range: TrendRange) -> Vec<NaiveDate> {
    (0..range.days())
        .rev()
        .filter_map(|back| end.checked_sub_days(Days::new(u64::from(back))))
        .collect()
}

/// Projects one day; a missing summary becomes a zeroed point.
#[must_use]
pub fn project(date: &str, summary: Option<&Summary>, bucket: Option<BucketKey>) -> TrendPoint {
    match bucket {
        Some(key) => {
            let stats = summary.and_then(|summary| summary.bucket(key));
            TrendPoint::Bucket(BucketTrendPoint {
                date: date.to_string(),
                passed: stats.map_or(0, |s| s.passed),
                failed: stats.map_or(0, |s| s.failed),
                total: stats.map_or(0, |s| s.total),
                items: stats.map(|s| s.items.clone()).unwrap_or_default(),
                version_info: summary
                    .map(|s| s.version_info.clone())
                    .unwrap_or_default(),
                duration: stats.and_then(|s| s.duration.clone()),
            })
        }
        None => TrendPoint::Overall(OverallTrendPoint {
            date: date.to_string(),
            all_tests: summary.map_or_else(TestCounts::default, |s| s.all_tests),
            version_info: summary.map_or_else(VersionInfo::new, |s| s.version_info.clone()),
            tests: summary.map_or_else(BucketMap::new, |s| s.tests.clone()),
        }),
    }
}

type FlatItems<'a> = BTreeMap<String, (BucketKey, &'a str, TestOutcome)>;

/// `category|level|name` → result. A name repeated within a bucket keeps
/// its last result.
fn flatten(summary: &Summary) -> FlatItems<'_> {
    let mut out = FlatItems::new();
    for (key, stats) in summary.buckets() {
        for item in &stats.items {
            out.insert(
                format!("{}|{}|{}", key.category, key.level, item.name),
                (key, item.name.as_str(), item.result),
            );
        }
    }
    out
}

fn entry(key: BucketKey, name: &str, curr: DiffResult, prev: DiffResult) -> DiffEntry {
    DiffEntry {
        name: name.to_string(),
        category: key.category,
        level: key.level,
        curr_result: curr,
        prev_result: prev,
    }
}

/// Compares two runs. Either side missing yields an empty report.
#[must_use]
pub fn diff(curr: Option<&Summary>, prev: Option<&Summary>) -> DiffReport {
    let (Some(curr), Some(prev)) = (curr, prev) else {
        return DiffReport::default();
    };
    let curr_items = flatten(curr);
    let prev_items = flatten(prev);
    let mut report = DiffReport::default();

    for (flat_key, (key, name, outcome)) in &curr_items {
        let before = prev_items.get(flat_key).map(|(_, _, result)| *result);
        match (outcome, before) {
            (TestOutcome::Fail, None | Some(TestOutcome::Pass)) => report.new_failures.push(
                entry(*key, name, DiffResult::Fail, DiffResult::from(before)),
            ),
            (TestOutcome::Pass, Some(TestOutcome::Fail)) => {
                report
                    .fixed
                    .push(entry(*key, name, DiffResult::Pass, DiffResult::Fail));
            }
            _ => {}
        }
        if before.is_none() {
            report.added_tests.push(entry(
                *key,
                name,
                DiffResult::from(*outcome),
                DiffResult::NotApplicable,
            ));
        }
    }

    for (flat_key, (key, name, outcome)) in &prev_items {
        if !curr_items.contains_key(flat_key) {
            report.removed_tests.push(entry(
                *key,
                name,
                DiffResult::NotApplicable,
                DiffResult::from(*outcome),
            ));
        }
    }

    report.stats = DiffStats {
        new_failures_count: report.new_failures.len(),
        fixed_count: report.fixed.len(),
        added_count: report.added_tests.len(),
        removed_count: report.removed_tests.len(),
    };
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Level};

    fn run(results: &[(&str, TestOutcome)]) -> Summary {
        let mut summary = Summary::new("P", "2026-01-10");
        let key = BucketKey::new(Category::Sai, Level::T0);
        for (name, outcome) in results {
            summary.record(key, name, *outcome);
        }
        summary
    }

    #[test]
    fn window_is_oldest_first_and_inclusive() {
        let end = NaiveDate::from_ymd_opt(2026, 1, 10).expect("date");
        let dates = window_dates(end, TrendRange::Week);
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2026, 1, 4).expect("date"));
        assert_eq!(dates[6], end);
        assert_eq!(window_dates(end, TrendRange::Year).len(), 365);
    }

    #[test]
    fn missing_day_projects_zeroed_points() {
        let key = BucketKey::new(Category::Link, Level::T1);
        let TrendPoint::Bucket(point) = project("2026-01-10", None, Some(key)) else {
            panic!("bucket point expected");
        };
        assert_eq!((point.passed, point.total), (0, 0));
        assert!(point.items.is_empty() && point.duration.is_none());

        let TrendPoint::Overall(point) = project("2026-01-10", None, None) else {
            panic!("overall point expected");
        };
        assert!(point.tests.is_empty());
        assert_eq!(point.all_tests.total, 0);
    }

    #[test]
    fn regression_is_a_new_failure_and_recovery_is_fixed() {
        let prev = run(&[("X", TestOutcome::Pass)]);
        let curr = run(&[("X", TestOutcome::Fail)]);

        let report = diff(Some(&curr), Some(&prev));
        assert_eq!(report.new_failures.len(), 1);
        assert_eq!(report.new_failures[0].prev_result, DiffResult::Pass);
        assert!(report.fixed.is_empty());

        let report = diff(Some(&prev), Some(&curr));
        assert_eq!(report.fixed.len(), 1);
        assert_eq!(report.fixed[0].name, "X");
        assert_eq!(report.stats.fixed_count, 1);
    }

    #[test]
    fn added_and_removed_tests_carry_na_on_missing_side() {
        let prev = run(&[("Old", TestOutcome::Pass)]);
        let curr = run(&[("New", TestOutcome::Fail)]);
        let report = diff(Some(&curr), Some(&prev));

        assert_eq!(report.new_failures[0].prev_result, DiffResult::NotApplicable);
        assert_eq!(report.added_tests[0].name, "New");
        assert_eq!(report.removed_tests[0].name, "Old");
        assert_eq!(report.removed_tests[0].curr_result, DiffResult::NotApplicable);
        assert_eq!(report.stats.added_count, 1);
        assert_eq!(report.stats.removed_count, 1);
    }

    #[test]
    fn missing_side_gives_empty_diff() {
        let curr = run(&[("X", TestOutcome::Fail)]);
        let report = diff(Some(&curr), None);
        assert!(report.is_empty());
        assert_eq!(report.stats, DiffStats::default());
    }
}
