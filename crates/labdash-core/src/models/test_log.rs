use serde::{Deserialize, Serialize};

/// Verdict read from the result markers inside one test's log section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogStatus {
    Pass,
    Fail,
    Unknown,
}

/// One test's slice of a run log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestLogDetail {
    pub status: LogStatus,
    pub log_content: String,
    /// Length of `log_content` in characters.
    pub log_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestLogPreview {
    pub status: LogStatus,
    pub log_preview: String,
    pub log_size: usize,
}

impl TestLogDetail {
    /// First `max_chars` characters, with a marker line when cut short.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> TestLogPreview {
        let mut log_preview: String = self.log_content.chars().take(max_chars).collect();
        if self.log_size > max_chars {
            log_preview.push_str("\n\n... (truncated)");
        }
        TestLogPreview {
            status: self.status,
            log_preview,
            log_size: self.log_size,
        }
    }
}
