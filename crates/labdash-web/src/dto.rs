use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestLogQuery {
    /// Return a truncated `log_preview` in place of the full section.
    #[serde(default)]
    pub preview: bool,
}

#[derive(Debug, Deserialize)]
pub struct SaveNoteRequest {
    /// Missing keys reach validation as empty and answer 400.
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct SaveNoteResponse {
    pub status: &'static str,
    pub key: String,
}
