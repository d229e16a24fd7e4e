//! Uniform read access to a report entry, whether it is still a gzip'd tar
//! archive or has already been extracted into a directory.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use walkdir::WalkDir;

use crate::error::{DashboardError, Result};
use crate::metadata::{
    COMMIT_URL_FILE, FW_INFO_FILE, HW_INFO_FILE, TEST_STATUS_FILE, VERSION_INFO_FILE,
};

/// Root-level members the walker reads by name.
pub const ROOT_METADATA_FILES: [&str; 5] = [
    VERSION_INFO_FILE,
    TEST_STATUS_FILE,
    HW_INFO_FILE,
    FW_INFO_FILE,
    COMMIT_URL_FILE,
];

/// Members the walker reads by suffix, anywhere in the bundle.
pub const SCANNED_SUFFIXES: [&str; 2] = [".csv", ".log"];

pub trait ReportBundle {
    /// Contents of a file at the bundle root (`name` or `./name`).
    fn root_file(&self, name: &str) -> Option<Cow<'_, [u8]>>;

    /// Every file whose path ends with `suffix`, in bundle order.
    fn files_with_suffix(&self, suffix: &str) -> Vec<(String, Cow<'_, [u8]>)>;

    fn entry_count(&self) -> usize;
}

fn root_name(member: &str) -> &str {
    member.strip_prefix("./").unwrap_or(member)
}

fn is_scanned_member(member: &str) -> bool {
    ROOT_METADATA_FILES.contains(&root_name(member))
        || SCANNED_SUFFIXES.iter().any(|suffix| member.ends_with(suffix))
}

/// A `.tar.gz`/`.tgz` archive. Members are streamed once on open; only the
/// metadata, CSV and log members are kept in memory.
#[derive(Debug, Default)]
pub struct TarBundle {
    order: Vec<String>,
    files: BTreeMap<String, Vec<u8>>,
    member_count: usize,
}

impl TarBundle {
    pub fn open(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        Self::from_reader(file)
            .map_err(|err| DashboardError::InvalidArchive(format!("{}: {err}", path.display())))
    }

    pub fn from_reader(reader: impl Read) -> std::io::Result<Self> {
        let mut archive = Archive::new(GzDecoder::new(reader));
        let mut bundle = Self::default();
        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            bundle.member_count += 1;
            let name = entry.path()?.to_string_lossy().to_string();
            if !is_scanned_member(&name) {
                continue;
            }
            let mut buf = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
            entry.read_to_end(&mut buf)?;
            if !bundle.files.contains_key(&name) {
                bundle.order.push(name.clone());
            }
            bundle.files.insert(name, buf);
        }
        Ok(bundle)
    }
}

impl ReportBundle for TarBundle {
    fn root_file(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        self.files
            .get(&format!("./{name}"))
            .or_else(|| self.files.get(name))
            .map(|content| Cow::Borrowed(content.as_slice()))
    }

    fn files_with_suffix(&self, suffix: &str) -> Vec<(String, Cow<'_, [u8]>)> {
        self.order
            .iter()
            .filter(|name| name.ends_with(suffix))
            .filter_map(|name| {
                self.files
                    .get(name)
                    .map(|content| (name.clone(), Cow::Borrowed(content.as_slice())))
            })
            .collect()
    }

    fn entry_count(&self) -> usize {
        self.member_count
    }
}

/// A pre-extracted report directory.
#[derive(Debug, Clone)]
pub struct DirBundle {
    root: PathBuf,
}

impl DirBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn files(&self) -> impl Iterator<Item = walkdir::DirEntry> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
    }
}

impl ReportBundle for DirBundle {
    fn root_file(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        let path = self.root.join(name);
        path.is_file()
            .then(|| fs::read(path).ok())
            .flatten()
            .map(Cow::Owned)
    }

    fn files_with_suffix(&self, suffix: &str) -> Vec<(String, Cow<'_, [u8]>)> {
        self.files()
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(suffix))
            .filter_map(|entry| {
                let content = fs::read(entry.path()).ok()?;
                Some((entry.path().display().to_string(), Cow::Owned(content)))
            })
            .collect()
    }

    fn entry_count(&self) -> usize {
        self.files().count()
    }
}
