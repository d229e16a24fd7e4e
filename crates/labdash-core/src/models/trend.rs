use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::summary::{BucketMap, TestCounts, TestItem, VersionInfo};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrendRange {
    #[default]
    Week,
    Month,
    Year,
}

impl TrendRange {
    pub const fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Unknown or missing range names fall back to a week.
    #[must_use]
    pub fn from_query(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for TrendRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendRange {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(format!("unknown trend range: {other}")),
        }
    }
}

/// One day of a single-bucket trend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketTrendPoint {
    pub date: String,
    pub passed: u64,
    pub failed: u64,
    pub total: u64,
    pub items: Vec<TestItem>,
    pub version_info: VersionInfo,
    pub duration: Option<String>,
}

/// One day of the whole-run trend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverallTrendPoint {
    pub date: String,
    pub all_tests: TestCounts,
    pub version_info: VersionInfo,
    pub tests: BucketMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TrendPoint {
    Bucket(BucketTrendPoint),
    Overall(OverallTrendPoint),
}

impl TrendPoint {
    #[must_use]
    pub fn date(&self) -> &str {
        match self {
            Self::Bucket(point) => &point.date,
            Self::Overall(point) => &point.date,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        match self {
            Self::Bucket(point) => point.total,
            Self::Overall(point) => point.all_tests.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_days_match_window_names() {
        assert_eq!(TrendRange::Week.days(), 7);
        assert_eq!(TrendRange::Month.days(), 30);
        assert_eq!(TrendRange::Year.days(), 365);
    }

    #[test]
    fn unknown_query_range_defaults_to_week() {
        assert_eq!(TrendRange::from_query(Some("decade")), TrendRange::Week);
        assert_eq!(TrendRange::from_query(None), TrendRange::Week);
        assert_eq!(TrendRange::from_query(Some("MONTH")), TrendRange::Month);
    }
}
