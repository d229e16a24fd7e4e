use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type VersionInfo = BTreeMap<String, String>;
pub type Notes = BTreeMap<String, serde_json::Value>;
pub type BucketMap = BTreeMap<Category, BTreeMap<Level, LevelStats>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sai,
    AgentHw,
    Link,
    LinkTest,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Sai, Self::AgentHw, Self::Link, Self::LinkTest];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sai => "sai",
            Self::AgentHw => "agent_hw",
            Self::Link => "link",
            Self::LinkTest => "link_test",
        }
    }

    /// Levels every fresh summary carries for this category.
    pub const fn levels(self) -> &'static [Level] {
        match self {
            Self::Sai | Self::AgentHw => &[Level::T0, Level::T1, Level::T2],
            Self::Link => &[
                Level::T0,
                Level::T1,
                Level::T2,
                Level::Ev,
                Level::EvDefault,
                Level::Ev400g,
                Level::EvOpticsOne,
                Level::EvOpticsTwo,
                Level::EvCopper,
            ],
            Self::LinkTest => &[Level::Default],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sai" => Ok(Self::Sai),
            "agent_hw" => Ok(Self::AgentHw),
            "link" => Ok(Self::Link),
            "link_test" => Ok(Self::LinkTest),
            other => Err(format!("unknown test category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    #[serde(rename = "t0")]
    T0,
    #[serde(rename = "t1")]
    T1,
    #[serde(rename = "t2")]
    T2,
    #[serde(rename = "ev")]
    Ev,
    #[serde(rename = "ev_default")]
    EvDefault,
    #[serde(rename = "ev_400g")]
    Ev400g,
    #[serde(rename = "ev_optics_one")]
    EvOpticsOne,
    #[serde(rename = "ev_optics_two")]
    EvOpticsTwo,
    #[serde(rename = "ev_copper")]
    EvCopper,
    #[serde(rename = "default")]
    Default,
}

impl Level {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::T0 => "t0",
            Self::T1 => "t1",
            Self::T2 => "t2",
            Self::Ev => "ev",
            Self::EvDefault => "ev_default",
            Self::Ev400g => "ev_400g",
            Self::EvOpticsOne => "ev_optics_one",
            Self::EvOpticsTwo => "ev_optics_two",
            Self::EvCopper => "ev_copper",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "t0" => Ok(Self::T0),
            "t1" => Ok(Self::T1),
            "t2" => Ok(Self::T2),
            "ev" => Ok(Self::Ev),
            "ev_default" => Ok(Self::EvDefault),
            "ev_400g" => Ok(Self::Ev400g),
            "ev_optics_one" => Ok(Self::EvOpticsOne),
            "ev_optics_two" => Ok(Self::EvOpticsTwo),
            "ev_copper" => Ok(Self::EvCopper),
            "default" => Ok(Self::Default),
            other => Err(format!("unknown test level: {other}")),
        }
    }
}

/// A `(category, level)` pair addressing one bucket of a [`Summary`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    pub category: Category,
    pub level: Level,
}

impl BucketKey {
    #[must_use]
    pub const fn new(category: Category, level: Level) -> Self {
        Self { category, level }
    }

    pub fn parse(category: &str, level: &str) -> Result<Self, String> {
        Ok(Self::new(category.parse()?, level.parse()?))
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.level)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestOutcome {
    Pass,
    Fail,
}

impl TestOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestItem {
    pub name: String,
    pub result: TestOutcome,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelStats {
    pub passed: u64,
    pub failed: u64,
    pub total: u64,
    pub items: Vec<TestItem>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub topology: Option<String>,
}

impl LevelStats {
    pub(crate) fn record(&mut self, name: &str, outcome: TestOutcome) {
        match outcome {
            TestOutcome::Pass => self.passed += 1,
            TestOutcome::Fail => self.failed += 1,
        }
        self.total += 1;
        self.items.push(TestItem {
            name: name.to_string(),
            result: outcome,
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestCounts {
    pub passed: u64,
    pub failed: u64,
    pub total: u64,
}

impl TestCounts {
    pub(crate) fn add(&mut self, outcome: TestOutcome) {
        match outcome {
            TestOutcome::Pass => self.passed += 1,
            TestOutcome::Fail => self.failed += 1,
        }
        self.total += 1;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestTimes {
    pub start: Option<String>,
    pub end: Option<String>,
    pub duration: Option<String>,
}

/// Aggregated results for one `(platform, date)` run directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub platform: String,
    pub date: String,
    pub version_info: VersionInfo,
    pub tests: BucketMap,
    pub all_tests: TestCounts,
    pub test_times: TestTimes,
    #[serde(default)]
    pub debug_logs: Vec<String>,
    #[serde(default)]
    pub notes: Notes,
}

impl Summary {
    /// Fresh summary with every known bucket present and zeroed.
    #[must_use]
    pub fn new(platform: impl Into<String>, date: impl Into<String>) -> Self {
        let mut tests = BucketMap::new();
        for category in Category::ALL {
            let levels = tests.entry(category).or_default();
            for level in category.levels() {
                levels.insert(*level, LevelStats::default());
            }
        }
        Self {
            platform: platform.into(),
            date: date.into(),
            version_info: VersionInfo::new(),
            tests,
            all_tests: TestCounts::default(),
            test_times: TestTimes::default(),
            debug_logs: Vec::new(),
            notes: Notes::new(),
        }
    }

    #[must_use]
    pub fn bucket(&self, key: BucketKey) -> Option<&LevelStats> {
        self.tests
            .get(&key.category)
            .and_then(|levels| levels.get(&key.level))
    }

    pub(crate) fn bucket_mut(&mut self, key: BucketKey) -> &mut LevelStats {
        self.tests
            .entry(key.category)
            .or_default()
            .entry(key.level)
            .or_default()
    }

    /// Counts a test result against its bucket and the global totals.
    pub(crate) fn record(&mut self, key: BucketKey, name: &str, outcome: TestOutcome) {
        self.bucket_mut(key).record(name, outcome);
        self.all_tests.add(outcome);
    }

    pub fn buckets(&self) -> impl Iterator<Item = (BucketKey, &LevelStats)> {
        self.tests.iter().flat_map(|(category, levels)| {
            levels
                .iter()
                .map(|(level, stats)| (BucketKey::new(*category, *level), stats))
        })
    }
}
