//! Maps report archive/directory names onto the dashboard's bucket taxonomy.
//!
//! Names are matched against an ordered rule table; the first rule whose
//! prefix matches the uppercased name wins and later rules are never
//! consulted.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::{BucketKey, Category, Level};

static RUN_TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_(\d{4}-\d{2}-\d{2}-[AP]M\d{2}-\d{2})").expect("run timestamp regex")
});
static COMMIT_HASH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_(\d{8}_\d{2}_\d{2}_\d{2})_([a-f0-9]{10})_").expect("commit hash regex")
});
static RUN_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("run date regex"));

/// How a matched rule derives the bucket level and topology.
#[derive(Debug, Clone, Copy)]
enum LevelRule {
    Fixed(Level),
    /// Exit-criteria runs: level is `ev_<topology>`.
    ExitEvt,
    /// Staged link runs: fixed level, topology recorded on the bucket.
    Link(Level, &'static [(&'static str, &'static str)]),
}

#[derive(Debug, Clone, Copy)]
struct ClassifierRule {
    prefix: &'static str,
    category: Category,
    level: LevelRule,
    extended_version_info: bool,
}

const LINK_T0_TOPOLOGIES: &[(&str, &str)] = &[
    ("optic_one", "optic_one"),
    ("optic_two", "optic_two"),
    ("copper", "copper"),
    ("400g", "400g"),
];

const LINK_TOPOLOGIES: &[(&str, &str)] = &[
    ("optic_one", "optic_one"),
    ("optic_two", "optic_two"),
    ("optics_one", "optics_one"),
    ("optics_two", "optics_two"),
    ("copper", "copper"),
    ("400g", "400g"),
];

const EXIT_EVT_TOPOLOGIES: &[(&str, Level)] = &[
    ("optic_one", Level::EvOpticsOne),
    ("optic_two", Level::EvOpticsTwo),
    ("optics_one", Level::EvOpticsOne),
    ("optics_two", Level::EvOpticsTwo),
    ("copper", Level::EvCopper),
    ("400g", Level::Ev400g),
    ("default", Level::EvDefault),
];

const RULES: &[ClassifierRule] = &[
    ClassifierRule {
        prefix: "AGENT_HW_T0",
        category: Category::AgentHw,
        level: LevelRule::Fixed(Level::T0),
        extended_version_info: false,
    },
    ClassifierRule {
        prefix: "AGENT_HW_T1",
        category: Category::AgentHw,
        level: LevelRule::Fixed(Level::T1),
        extended_version_info: false,
    },
    ClassifierRule {
        prefix: "AGENT_HW_T2",
        category: Category::AgentHw,
        level: LevelRule::Fixed(Level::T2),
        extended_version_info: false,
    },
    ClassifierRule {
        prefix: "EXITEVT",
        category: Category::Link,
        level: LevelRule::ExitEvt,
        extended_version_info: false,
    },
    ClassifierRule {
        prefix: "LINK_T0",
        category: Category::Link,
        level: LevelRule::Link(Level::T0, LINK_T0_TOPOLOGIES),
        extended_version_info: false,
    },
    ClassifierRule {
        prefix: "LINK_T1",
        category: Category::Link,
        level: LevelRule::Link(Level::T1, LINK_TOPOLOGIES),
        extended_version_info: false,
    },
    ClassifierRule {
        prefix: "LINK_T2",
        category: Category::Link,
        level: LevelRule::Link(Level::T2, LINK_TOPOLOGIES),
        extended_version_info: false,
    },
    ClassifierRule {
        prefix: "SAI_T0",
        category: Category::Sai,
        level: LevelRule::Fixed(Level::T0),
        extended_version_info: false,
    },
    ClassifierRule {
        prefix: "SAI_T1",
        category: Category::Sai,
        level: LevelRule::Fixed(Level::T1),
        extended_version_info: false,
    },
    ClassifierRule {
        prefix: "SAI_T2",
        category: Category::Sai,
        level: LevelRule::Fixed(Level::T2),
        extended_version_info: false,
    },
    ClassifierRule {
        prefix: "LINKTEST_LOG_",
        category: Category::LinkTest,
        level: LevelRule::Fixed(Level::Default),
        extended_version_info: true,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub key: BucketKey,
    /// Cabling variant for staged link runs; `None` for every other rule.
    pub topology: Option<String>,
    /// `LINKTEST_LOG_` bundles carry version data in their name and extra
    /// hardware/firmware files.
    pub extended_version_info: bool,
}

#[must_use]
pub fn classify(name: &str) -> Option<Classification> {
    let upper = name.to_ascii_uppercase();
    let rule = RULES.iter().find(|rule| upper.starts_with(rule.prefix))?;
    let lower = name.to_ascii_lowercase();

    let (level, topology) = match rule.level {
        LevelRule::Fixed(level) => (level, None),
        LevelRule::ExitEvt => (exit_evt_level(&lower), None),
        LevelRule::Link(level, table) => (level, Some(link_topology(&lower, table).to_string())),
    };

    Some(Classification {
        key: BucketKey::new(rule.category, level),
        topology,
        extended_version_info: rule.extended_version_info,
    })
}

fn exit_evt_level(lower: &str) -> Level {
    let stem = strip_archive_extension(lower);
    EXIT_EVT_TOPOLOGIES
        .iter()
        .find(|(token, _)| {
            stem.contains(&format!("_{token}_")) || stem.ends_with(&format!("_{token}"))
        })
        .map_or(Level::EvDefault, |(_, level)| *level)
}

fn link_topology(lower: &str, table: &[(&str, &'static str)]) -> &'static str {
    table
        .iter()
        .find(|(token, _)| lower.contains(&format!("_{token}")) || lower.contains(&format!("{token}_")))
        .map_or("default", |(_, topology)| *topology)
}

#[must_use]
pub fn is_report_archive(name: &str) -> bool {
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

#[must_use]
pub fn strip_archive_extension(name: &str) -> &str {
    name.strip_suffix(".tar.gz")
        .or_else(|| name.strip_suffix(".tgz"))
        .unwrap_or(name)
}

/// `YYYY-MM-DD-AMhh-mm` run timestamp embedded in an entry name.
#[must_use]
pub fn extract_run_timestamp(name: &str) -> Option<String> {
    RUN_TIMESTAMP_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Ten-hex-digit commit hash that follows a `YYYYMMDD_HH_MM_SS` build stamp.
#[must_use]
pub fn extract_commit_hash(name: &str) -> Option<String> {
    let lower = name.to_ascii_lowercase();
    COMMIT_HASH_RE
        .captures(&lower)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// First valid calendar date in the name, independent of classification.
#[must_use]
pub fn extract_run_date(name: &str) -> Option<NaiveDate> {
    RUN_DATE_RE
        .captures_iter(name)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok())
}

/// Filename prefix used to find the archive backing a bucket.
#[must_use]
pub fn archive_prefix(key: BucketKey) -> Option<&'static str> {
    let prefix = match (key.category, key.level) {
        (Category::Sai, Level::T0) => "SAI_t0_",
        (Category::Sai, Level::T1) => "SAI_t1_",
        (Category::Sai, Level::T2) => "SAI_t2_",
        (Category::AgentHw, Level::T0) => "AGENT_HW_t0_",
        (Category::AgentHw, Level::T1) => "AGENT_HW_t1_",
        (Category::AgentHw, Level::T2) => "AGENT_HW_t2_",
        (Category::Link, Level::T0) => "LINK_T0_",
        (Category::Link, Level::T1) => "LINK_T1_",
        (Category::Link, Level::T2) => "LINK_T2_",
        (
            Category::Link,
            Level::EvDefault
            | Level::Ev400g
            | Level::EvOpticsOne
            | Level::EvOpticsTwo
            | Level::EvCopper,
        ) => "ExitEVT_",
        (Category::LinkTest, Level::Default) => "LINKTEST_LOG_",
        _ => return None,
    };
    Some(prefix)
}

/// Topology token an EV archive name must mention to back `level`.
#[must_use]
pub fn exit_evt_topology(level: Level) -> Option<&'static str> {
    match level {
        Level::EvDefault => Some("default"),
        Level::Ev400g => Some("400g"),
        Level::EvOpticsOne => Some("optics_one"),
        Level::EvOpticsTwo => Some("optics_two"),
        Level::EvCopper => Some("copper"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(name: &str) -> Option<BucketKey> {
        classify(name).map(|c| c.key)
    }

    #[test]
    fn sai_archive_maps_to_sai_bucket() {
        let c = classify("SAI_t0_WEDGE800BACT_2026-01-22.tar.gz").expect("classified");
        assert_eq!(c.key, BucketKey::new(Category::Sai, Level::T0));
        assert_eq!(c.topology, None);
        assert!(!c.extended_version_info);
    }

    #[test]
    fn exit_evt_optic_one_normalizes_to_optics_one() {
        assert_eq!(
            key_of("ExitEVT_WEDGE800BACT_optic_one_2026-01-22.tar.gz"),
            Some(BucketKey::new(Category::Link, Level::EvOpticsOne))
        );
        assert_eq!(
            key_of("ExitEVT_MINIPACK3BA_v1_copper.tar.gz"),
            Some(BucketKey::new(Category::Link, Level::EvCopper))
        );
        assert_eq!(
            key_of("ExitEVT_MINIPACK3BA_fboss_bins_2026-01-09.tar.gz"),
            Some(BucketKey::new(Category::Link, Level::EvDefault))
        );
    }

    #[test]
    fn link_t1_records_topology() {
        let c = classify("LINK_t1_WEDGE800BACT_optics_two_2026-01-22.tar.gz").expect("classified");
        assert_eq!(c.key, BucketKey::new(Category::Link, Level::T1));
        assert_eq!(c.topology.as_deref(), Some("optics_two"));
    }

    #[test]
    fn link_t0_ignores_plural_optics_tokens() {
        let c = classify("LINK_T0_MP3BA_optics_two_2026-01-22.tar.gz").expect("classified");
        assert_eq!(c.topology.as_deref(), Some("default"));
        let c = classify("LINK_T0_MP3BA.zst_400g_2026-01-22.tar.gz").expect("classified");
        assert_eq!(c.topology.as_deref(), Some("400g"));
    }

    #[test]
    fn agent_hw_wins_over_later_rules() {
        assert_eq!(
            key_of("AGENT_HW_t0_MINIPACK3BA_fboss_bins_varFBOSSsai_SAI_13_3_0_GA_tar.zst_2026-01-09.tar.gz"),
            Some(BucketKey::new(Category::AgentHw, Level::T0))
        );
    }

    #[test]
    fn linktest_log_requests_extended_version_info() {
        let c = classify("LINKTEST_LOG_20260115-1318_fboss_bins.tar.gz").expect("classified");
        assert_eq!(c.key, BucketKey::new(Category::LinkTest, Level::Default));
        assert!(c.extended_version_info);
    }

    #[test]
    fn unknown_prefix_is_unclassified_but_date_still_extracts() {
        let name = "UNKNOWN_test_2026-01-22.tar.gz";
        assert_eq!(classify(name), None);
        assert_eq!(
            extract_run_date(name),
            NaiveDate::from_ymd_opt(2026, 1, 22)
        );
    }

    #[test]
    fn commit_hash_follows_build_stamp() {
        let name = "LINK_T0_fboss_bins_20260115_13_18_02_94239F9CE8_copper.tar.gz";
        assert_eq!(extract_commit_hash(name).as_deref(), Some("94239f9ce8"));
        assert_eq!(extract_commit_hash("SAI_t0_2026-01-22.tar.gz"), None);
    }

    #[test]
    fn run_timestamp_is_extracted_from_name() {
        assert_eq!(
            extract_run_timestamp("SAI_t1_MP3N_2026-01-28-AM10-50.tar.gz").as_deref(),
            Some("2026-01-28-AM10-50")
        );
        assert_eq!(extract_run_timestamp("SAI_t1_MP3N_2026-01-28.tar.gz"), None);
    }

    #[test]
    fn archive_extension_helpers() {
        assert!(is_report_archive("a.tar.gz"));
        assert!(is_report_archive("a.tgz"));
        assert!(!is_report_archive("a.zip"));
        assert_eq!(strip_archive_extension("x_copper.tgz"), "x_copper");
    }

    #[test]
    fn archive_prefix_covers_every_populated_bucket() {
        assert_eq!(
            archive_prefix(BucketKey::new(Category::Link, Level::EvCopper)),
            Some("ExitEVT_")
        );
        assert_eq!(archive_prefix(BucketKey::new(Category::Link, Level::Ev)), None);
        assert_eq!(exit_evt_topology(Level::EvOpticsTwo), Some("optics_two"));
    }
}
