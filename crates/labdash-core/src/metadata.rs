//! Line-oriented parsers for the free-text metadata files bundled with a run.

use chrono::NaiveDateTime;

use crate::models::VersionInfo;

pub const VERSION_INFO_FILE: &str = "Version_Info.txt";
pub const TEST_STATUS_FILE: &str = "TEST_STATUS";
pub const HW_INFO_FILE: &str = "HW_info.txt";
pub const FW_INFO_FILE: &str = "mp3n_sdk_ver_fw_ver.txt";
pub const COMMIT_URL_FILE: &str = "fboss_commit_url.txt";

pub const FBOSS_COMMIT_URL: &str = "FBOSS_COMMIT_URL";
pub const FBOSS_COMMIT_DESC: &str = "FBOSS_COMMIT_DESC";
pub const FBOSS_COMMIT_ID: &str = "FBOSS_COMMIT_ID";
pub const FBOSS_BINARY: &str = "FBOSS_BINARY";
pub const BCM_SAI_VERSION: &str = "BCM_SAI_VERSION";
pub const OCP_SAI_VERSION: &str = "OCP_SAI_VERSION";
pub const BCM_HSDK_VERSION: &str = "BCM_HSDK_VERSION";
pub const SDK_VERSION: &str = "SDK_VERSION";
pub const SAI_BUILD: &str = "SAI_BUILD";

/// Upstream harness writes the start label misspelled.
pub const START_TIME_LABEL: &str = "Sart Time:";
pub const END_TIME_LABEL: &str = "End Time:";
pub const RUN_TIME_FORMAT: &str = "%Y-%m-%d-%p%I-%M";
pub const WINDOW_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

type FieldTable = &'static [(&'static str, &'static str)];

const VERSION_FIELDS: FieldTable = &[
    ("FBOSS_COMMIT_URL", FBOSS_COMMIT_URL),
    ("FBOSS_COMMIT_DESC", FBOSS_COMMIT_DESC),
    ("FBOSS_BINARY", FBOSS_BINARY),
    ("BCM SAI_VERSION", BCM_SAI_VERSION),
    ("OCP SAI_VERSION", OCP_SAI_VERSION),
    ("BCM HSDK_VERSION", BCM_HSDK_VERSION),
];

const HW_FIELDS: FieldTable = &[
    ("Product Name:", "PRODUCT_NAME"),
    ("Production State:", "PRODUCTION_STATE"),
    ("ASIC:", "ASIC"),
    ("PCB Manufacturer:", "PCB_MANUFACTURER"),
    ("Product Serial Number:", "PRODUCT_SERIAL_NUMBER"),
];

const FW_FIELDS: FieldTable = &[
    ("Image type:", "FW_IMAGE_TYPE"),
    ("FW Version:", "FW_VERSION"),
    ("FW Release Date:", "FW_RELEASE_DATE"),
    ("Product Version:", "PRODUCT_VERSION"),
    ("PSID:", "FW_PSID"),
];

/// Value after the first `:` when `marker` appears in the line.
fn field_value<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    if !line.contains(marker) {
        return None;
    }
    line.split_once(':').map(|(_, value)| value.trim())
}

fn scan_fields(content: &str, table: FieldTable, out: &mut VersionInfo) {
    for line in content.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let hit = table
            .iter()
            .find_map(|(marker, key)| field_value(line, marker).map(|value| (*key, value)));
        if let Some((key, value)) = hit {
            out.insert(key.to_string(), value.to_string());
        }
    }
}

/// Parses `Version_Info.txt`. Every known key is present, empty when absent.
#[must_use]
pub fn parse_version_info(content: &str) -> VersionInfo {
    let mut info: VersionInfo = VERSION_FIELDS
        .iter()
        .map(|(_, key)| ((*key).to_string(), String::new()))
        .collect();
    scan_fields(content, VERSION_FIELDS, &mut info);
    info
}

#[must_use]
pub fn parse_hw_info(content: &str) -> VersionInfo {
    let mut info = VersionInfo::new();
    scan_fields(content, HW_FIELDS, &mut info);
    info
}

#[must_use]
pub fn parse_fw_info(content: &str) -> VersionInfo {
    let mut info = VersionInfo::new();
    scan_fields(content, FW_FIELDS, &mut info);
    info
}

/// Commit URL plus the commit id after the last `/commit/`, if any.
#[must_use]
pub fn parse_commit_url(content: &str) -> VersionInfo {
    let mut info = VersionInfo::new();
    let url = content.trim();
    if url.is_empty() {
        return info;
    }
    info.insert(FBOSS_COMMIT_URL.to_string(), url.to_string());
    if let Some((_, commit)) = url.rsplit_once("/commit/") {
        info.insert(FBOSS_COMMIT_ID.to_string(), commit.to_string());
    }
    info
}

/// Fields encoded in a `LINKTEST_LOG_<stamp>_<binary>_<sdk>_<saibuild>` name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTestName {
    pub binary: Option<String>,
    pub sdk_version: Option<String>,
    pub sai_build: Option<String>,
}

impl LinkTestName {
    pub fn apply(&self, info: &mut VersionInfo) {
        let fields = [
            (FBOSS_BINARY, &self.binary),
            (SDK_VERSION, &self.sdk_version),
            (SAI_BUILD, &self.sai_build),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                info.insert(key.to_string(), value.clone());
            }
        }
    }
}

fn is_run_stamp(part: &str) -> bool {
    let bytes = part.as_bytes();
    bytes.len() >= 13
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'-'
        && bytes[9..13].iter().all(u8::is_ascii_digit)
}

#[must_use]
pub fn parse_linktest_name(name: &str) -> LinkTestName {
    let stem = name.replace(".tar.gz", "").replace(".tgz", "");
    let parts: Vec<&str> = stem.split('_').collect();
    let upper = |idx: usize| parts[idx].to_ascii_uppercase();

    let mut binary = Vec::new();
    let mut sdk_version = None;
    let mut sai_build = None;
    let mut idx = 0;
    while idx < parts.len() {
        let part = parts[idx];
        if upper(idx).starts_with("SWITCH")
            && idx + 1 < parts.len()
            && upper(idx + 1).starts_with("SDK")
        {
            let start = idx;
            while idx < parts.len() && !upper(idx).starts_with("SAIBUILD") {
                idx += 1;
            }
            sdk_version = Some(parts[start..idx].join("_"));
            continue;
        }
        if upper(idx).starts_with("SAIBUILD") {
            sai_build = Some(parts[idx..].join("_"));
            break;
        }
        if !part.starts_with("LINKTEST") && !part.starts_with("LOG") && !is_run_stamp(part) {
            binary.push(part);
        }
        idx += 1;
    }

    LinkTestName {
        binary: (!binary.is_empty()).then(|| binary.join("_")),
        sdk_version,
        sai_build,
    }
}

/// Start/end of one archive's run, read from `TEST_STATUS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunWindow {
    pub start_raw: String,
    pub end_raw: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl RunWindow {
    #[must_use]
    pub fn duration(&self) -> String {
        format_duration(self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestStatusError {
    MissingLabel,
    BadTimestamp(String),
}

impl std::fmt::Display for TestStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLabel => f.write_str("start or end time not recorded"),
            Self::BadTimestamp(raw) => write!(f, "unparseable run time '{raw}'"),
        }
    }
}

pub fn parse_test_status(content: &str) -> Result<RunWindow, TestStatusError> {
    let mut start = None;
    let mut end = None;
    for line in content.lines().map(str::trim) {
        if line.starts_with(START_TIME_LABEL) {
            start = line.split_once(':').map(|(_, value)| value.trim().to_string());
        } else if line.starts_with(END_TIME_LABEL) {
            end = line.split_once(':').map(|(_, value)| value.trim().to_string());
        }
    }

    let (Some(start_raw), Some(end_raw)) = (start, end) else {
        return Err(TestStatusError::MissingLabel);
    };
    let parse = |raw: &str| {
        NaiveDateTime::parse_from_str(raw, RUN_TIME_FORMAT)
            .map_err(|_| TestStatusError::BadTimestamp(raw.to_string()))
    };
    let start = parse(&start_raw)?;
    let end = parse(&end_raw)?;
    Ok(RunWindow {
        start_raw,
        end_raw,
        start,
        end,
    })
}

/// `"{h}h {m}m"`, or `"{m}m"` under an hour.
#[must_use]
pub fn format_duration(start: NaiveDateTime, end: NaiveDateTime) -> String {
    let seconds = (end - start).num_seconds();
    let hours = seconds.div_euclid(3600);
    let minutes = seconds.rem_euclid(3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
