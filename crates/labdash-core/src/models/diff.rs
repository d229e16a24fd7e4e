use serde::{Deserialize, Serialize};

use super::summary::{Category, Level, TestOutcome};

/// Result column of a diff row; `N/A` marks the side where the test is absent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DiffResult {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl From<TestOutcome> for DiffResult {
    fn from(value: TestOutcome) -> Self {
        match value {
            TestOutcome::Pass => Self::Pass,
            TestOutcome::Fail => Self::Fail,
        }
    }
}

impl From<Option<TestOutcome>> for DiffResult {
    fn from(value: Option<TestOutcome>) -> Self {
        value.map_or(Self::NotApplicable, Self::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffEntry {
    pub name: String,
    pub category: Category,
    pub level: Level,
    pub curr_result: DiffResult,
    pub prev_result: DiffResult,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffStats {
    pub new_failures_count: usize,
    pub fixed_count: usize,
    pub added_count: usize,
    pub removed_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffReport {
    pub new_failures: Vec<DiffEntry>,
    pub fixed: Vec<DiffEntry>,
    pub added_tests: Vec<DiffEntry>,
    pub removed_tests: Vec<DiffEntry>,
    pub stats: DiffStats,
}

impl DiffReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_failures.is_empty()
            && self.fixed.is_empty()
            && self.added_tests.is_empty()
            && self.removed_tests.is_empty()
    }
}
