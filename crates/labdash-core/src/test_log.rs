//! Per-test slices of the run log stored inside a report archive.
//!
//! A report archive carries one main log, either directly or inside a nested
//! `.tar.gz`. Each test in it opens with a [`TEST_START_MARKER`] line naming
//! the test; the section runs until the next test starts or the run ends.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::models::{BucketKey, Category, LogStatus, TestLogDetail};

pub const TEST_START_MARKER: &str = "########## Running test:";
pub const TESTS_END_MARKER: &str = "Running all tests took";

/// Characters kept by a preview of a test section.
pub const PREVIEW_CHARS: usize = 5000;

const NAME_PREFIXES: [&str; 5] = ["warm_boot.", "cold_boot.", "test.", "t0.", "t1."];
const LOG_SUFFIXES: [&str; 2] = [".log", ".txt"];
const NESTED_SUFFIXES: [&str; 2] = [".tar.gz", ".tgz"];

const FAIL_MARKERS: [&str; 5] = [
    "[ FAILED ]",
    "[  FAILED  ]",
    "FAILED TEST",
    "Test FAILED",
    "TESTS FAILED",
];
const PASS_MARKERS: [&str; 4] = ["[ PASSED ]", "[  PASSED  ]", "Test PASSED", "ALL TESTS PASSED"];

/// Buckets searched, in order, when a test is missing from its own archive.
#[must_use]
pub fn fallback_buckets(bucket: BucketKey) -> Vec<BucketKey> {
    let categories: &[Category] = match bucket.category {
        Category::Sai => &[Category::Link, Category::AgentHw],
        Category::Link => &[Category::Sai, Category::AgentHw],
        Category::AgentHw => &[Category::Sai, Category::Link],
        Category::LinkTest => &[],
    };
    categories
        .iter()
        .map(|category| BucketKey::new(*category, bucket.level))
        .collect()
}

/// Section of `test_name` in the main log of the archive at `path`.
pub fn read_test_section(path: &Path, test_name: &str) -> io::Result<Option<String>> {
    let Some(log) = main_log(File::open(path)?)? else {
        return Ok(None);
    };
    Ok(extract_test_section(&log, test_name))
}

/// Largest log of the largest nested archive, or of the archive itself when
/// nothing is nested.
pub fn main_log(reader: impl Read) -> io::Result<Option<String>> {
    let outer = scan(reader)?;
    let raw = match outer.nested.content {
        Some(inner) => scan(inner.as_slice())?.log.content,
        None => outer.log.content,
    };
    Ok(raw
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .filter(|log| !log.is_empty()))
}

#[derive(Default)]
struct Largest {
    size: u64,
    content: Option<Vec<u8>>,
}

impl Largest {
    /// Keeps the first member of the greatest size.
    fn offer(&mut self, member: &mut impl Read, size: u64) -> io::Result<()> {
        if self.content.is_some() && self.size >= size {
            return Ok(());
        }
        let mut buf = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
        member.read_to_end(&mut buf)?;
        self.size = size;
        self.content = Some(buf);
        Ok(())
    }
}

#[derive(Default)]
struct Candidates {
    nested: Largest,
    log: Largest,
}

fn scan(reader: impl Read) -> io::Result<Candidates> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let mut found = Candidates::default();
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path()?.to_string_lossy().to_ascii_lowercase();
        let size = entry.size();
        if NESTED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            found.nested.offer(&mut entry, size)?;
        } else if LOG_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            found.log.offer(&mut entry, size)?;
        }
    }
    Ok(found)
}

fn sanitize(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Lines from the start marker naming `test_name` up to the next test or the
/// end of the run. Names also match with a boot/level prefix removed and with
/// path separators folded to `_`.
#[must_use]
pub fn extract_test_section(log: &str, test_name: &str) -> Option<String> {
    let mut variants = vec![test_name.to_string()];
    variants.extend(
        NAME_PREFIXES
            .iter()
            .filter_map(|prefix| test_name.strip_prefix(prefix))
            .map(str::to_string),
    );
    variants.push(sanitize(test_name));
    let variants: Vec<(String, String)> = variants
        .into_iter()
        .map(|variant| {
            let folded = sanitize(&variant);
            (variant, folded)
        })
        .collect();

    let mut capturing = false;
    let mut lines: Vec<&str> = Vec::new();
    for line in log.split('\n') {
        if capturing && line.contains(TESTS_END_MARKER) {
            break;
        }
        if let Some((_, named)) = line.split_once(TEST_START_MARKER) {
            let current = named.trim();
            let folded = sanitize(current);
            if variants
                .iter()
                .any(|(variant, variant_folded)| current == variant || folded == *variant_folded)
            {
                capturing = true;
                lines = vec![line];
            } else if capturing {
                break;
            }
            continue;
        }
        if capturing {
            lines.push(line);
        }
    }

    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// Failure markers win over pass markers.
#[must_use]
pub fn log_status(section: &str) -> LogStatus {
    if FAIL_MARKERS.iter().any(|marker| section.contains(marker)) {
        LogStatus::Fail
    } else if PASS_MARKERS.iter().any(|marker| section.contains(marker)) {
        LogStatus::Pass
    } else {
        LogStatus::Unknown
    }
}

#[must_use]
pub fn describe(section: String) -> TestLogDetail {
    TestLogDetail {
        status: log_status(&section),
        log_size: section.chars().count(),
        log_content: section,
    }
}
