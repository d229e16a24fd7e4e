use std::path::PathBuf;

mod env;

pub use env::parse_env_bool;

pub const REPORT_BASE_ENV: &str = "LABDASH_REPORT_BASE";
pub const PLATFORMS_ENV: &str = "LABDASH_PLATFORMS";
pub const PLATFORM_CACHE_ENV: &str = "LABDASH_PLATFORM_CACHE";

pub const DEFAULT_REPORT_BASE: &str = "test_report";
pub const DEFAULT_PLATFORMS: [&str; 4] =
    ["MINIPACK3N", "MINIPACK3BA", "WEDGE800BACT", "WEDGE800CACT"];

/// Where test reports live and which platforms the dashboard knows about.
///
/// Owned by the caller and handed to [`crate::Dashboard`]; nothing in the
/// crate reads a process-wide report root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub report_base: PathBuf,
    pub platforms: Vec<String>,
    pub platform_cache_file: Option<PathBuf>,
}

impl DashboardConfig {
    #[must_use]
    pub fn new(report_base: impl Into<PathBuf>) -> Self {
        Self {
            report_base: report_base.into(),
            platforms: default_platforms(),
            platform_cache_file: None,
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        let report_base = env::read_non_empty_env(REPORT_BASE_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_REPORT_BASE), PathBuf::from);
        let platforms = env::read_non_empty_env(PLATFORMS_ENV)
            .map(|raw| env::parse_csv_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(default_platforms);
        let platform_cache_file = env::read_non_empty_env(PLATFORM_CACHE_ENV).map(PathBuf::from);

        Self {
            report_base,
            platforms,
            platform_cache_file,
        }
    }

    #[must_use]
    pub fn with_report_base(mut self, report_base: impl Into<PathBuf>) -> Self {
        self.report_base = report_base.into();
        self
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_BASE)
    }
}

fn default_platforms() -> Vec<String> {
    DEFAULT_PLATFORMS.iter().map(ToString::to_string).collect()
}
