//! Counts CSV test results, cross-checked against the tests a run's log
//! says were actually executed.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use csv::ReaderBuilder;
use regex::Regex;

use crate::models::TestOutcome;

static RUNNING_TEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#{10,}\s+Running test:\s+(\S+)").expect("running test marker regex")
});

const HEADER_CELLS: [&str; 3] = ["test name", "result", "test case"];
const BOOT_PREFIXES: [&str; 2] = ["warm_boot.", "cold_boot."];
const DEFAULT_RESULT_COLUMN: usize = 1;

/// Test names announced by `########## Running test: <name>` markers.
#[must_use]
pub fn mine_running_tests(log_text: &str) -> BTreeSet<String> {
    RUNNING_TEST_RE
        .captures_iter(log_text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Counted(TestOutcome),
    Skipped,
    Unknown,
}

fn verdict(raw: &str) -> Verdict {
    match raw {
        "OK" | "PASS" | "PASSED" => Verdict::Counted(TestOutcome::Pass),
        "FAIL" | "FAILED" | "ERROR" => Verdict::Counted(TestOutcome::Fail),
        "SKIPPED" | "SKIP" | "IGNORED" => Verdict::Skipped,
        _ => Verdict::Unknown,
    }
}

fn executed(name: &str, available: &BTreeSet<String>) -> bool {
    available.contains(name)
        || BOOT_PREFIXES
            .iter()
            .any(|prefix| available.contains(&name.replace(prefix, "")))
}

/// Per-file reconciliation outcome; counted rows appear in `outcomes` in
/// encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTally {
    pub outcomes: Vec<(String, TestOutcome)>,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub diagnostics: Vec<String>,
}

impl CsvTally {
    #[must_use]
    pub fn counted(&self) -> u64 {
        self.passed + self.failed
    }
}

fn row_index(line: u64) -> usize {
    usize::try_from(line.saturating_sub(1)).unwrap_or(usize::MAX)
}

/// Tallies one results CSV. An empty `available` set disables the
/// executed-test gate.
#[must_use]
pub fn reconcile_csv(content: &str, available: &BTreeSet<String>) -> CsvTally {
    let mut tally = CsvTally::default();
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    // Rows are numbered by source line: the reader drops blank lines, and
    // `Test_<n>` names must not shift when a file contains them.
    let mut rows = Vec::new();
    for (seq, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                let idx = record.position().map_or(seq, |pos| row_index(pos.line()));
                rows.push((idx, record));
            }
            Err(err) => {
                let idx = err.position().map_or(seq, |pos| row_index(pos.line()));
                tally.diagnostics.push(format!("row {idx} unreadable: {err}"));
            }
        }
    }
    let Some((_, first)) = rows.first() else {
        tally.diagnostics.push("CSV is empty".to_string());
        return tally;
    };

    let has_header = first
        .iter()
        .any(|cell| HEADER_CELLS.contains(&cell.trim().to_ascii_lowercase().as_str()));
    let result_col = if has_header {
        first
            .iter()
            .position(|cell| cell.trim().eq_ignore_ascii_case("result"))
            .unwrap_or(DEFAULT_RESULT_COLUMN)
    } else {
        DEFAULT_RESULT_COLUMN
    };
    let data_start = usize::from(has_header);

    for (idx, row) in rows.iter().skip(data_start) {
        let idx = *idx;
        let Some(raw_result) = row.get(result_col) else {
            tally
                .diagnostics
                .push(format!("row {idx} has insufficient columns"));
            continue;
        };
        let result = raw_result.trim().to_ascii_uppercase();
        let name = match row.get(0).map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Test_{idx}"),
        };

        if !available.is_empty() && !executed(&name, available) {
            tally
                .diagnostics
                .push(format!("skipping test '{name}': not found in log file"));
            continue;
        }

        match verdict(&result) {
            Verdict::Counted(outcome) => {
                match outcome {
                    TestOutcome::Pass => tally.passed += 1,
                    TestOutcome::Fail => tally.failed += 1,
                }
                tally.outcomes.push((name, outcome));
            }
            Verdict::Skipped => tally.skipped += 1,
            Verdict::Unknown => tally
                .diagnostics
                .push(format!("row {idx}: unknown result '{result}'")),
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn headerless_csv_uses_second_column() {
        let tally = reconcile_csv("Test1,PASS,Msg\nTest2,PASS,Msg", &BTreeSet::new());
        assert_eq!((tally.passed, tally.failed, tally.counted()), (2, 0, 2));
        assert_eq!(tally.outcomes[0], ("Test1".to_string(), TestOutcome::Pass));
    }

    #[test]
    fn header_locates_result_column() {
        let csv = "Test Name,Message,Result\na,boom,FAILED\nb,,ok\nc,,skipped\n";
        let tally = reconcile_csv(csv, &BTreeSet::new());
        assert_eq!((tally.passed, tally.failed, tally.skipped), (1, 1, 1));
        assert_eq!(tally.outcomes.len(), 2);
    }

    #[test]
    fn header_without_result_column_falls_back_to_index_one() {
        let tally = reconcile_csv("Test Case,Status\nx,PASS\n", &BTreeSet::new());
        assert_eq!(tally.passed, 1);
    }

    #[test]
    fn boot_prefixed_names_match_log_markers() {
        let csv = "warm_boot.Test3,PASS\ncold_boot.Test4,FAIL\nStale,PASS\n";
        let tally = reconcile_csv(csv, &set(&["Test3", "Test4"]));
        assert_eq!((tally.passed, tally.failed), (1, 1));
        assert!(tally.diagnostics.iter().any(|line| line.contains("'Stale'")));
    }

    #[test]
    fn short_rows_and_unknown_results_are_not_counted() {
        let tally = reconcile_csv("lonely\nx,MAYBE\ny,ERROR\n", &BTreeSet::new());
        assert_eq!((tally.passed, tally.failed), (0, 1));
        assert_eq!(tally.diagnostics.len(), 2);
    }

    #[test]
    fn empty_name_is_synthesized_from_row_index() {
        let tally = reconcile_csv("Test Name,Result\n,PASS\n", &BTreeSet::new());
        assert_eq!(tally.outcomes[0].0, "Test_1");
    }

    #[test]
    fn blank_lines_keep_row_numbers_aligned_with_the_file() {
        let csv = "Test Name,Result\nA,PASS\n\n,FAIL\nB,MAYBE\n";
        let tally = reconcile_csv(csv, &BTreeSet::new());
        assert_eq!(tally.outcomes[1].0, "Test_3");
        assert!(
            tally
                .diagnostics
                .iter()
                .any(|line| line.starts_with("row 4: unknown result"))
        );
    }

    #[test]
    fn log_markers_need_ten_hashes() {
        let log = "########## Running test: HwVlanTest.add\n#### Running test: Short\n############   Running test: Other.x extra\n";
        assert_eq!(mine_running_tests(log), set(&["HwVlanTest.add", "Other.x"]));
    }
}
