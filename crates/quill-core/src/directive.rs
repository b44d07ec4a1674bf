//! Report directive detection.
//!
//! A finished reply is treated as a report request only when the whole buffer
//! is one JSON object with `report: true` and non-empty `title` and `content`
//! strings. Anything else is ordinary text.

use serde::Deserialize;

/// Extension appended to report file names.
pub const REPORT_EXTENSION: &str = "pdf";

/// A structured request from the model to render `content` as a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDirective {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize)]
struct RawDirective {
    #[serde(default)]
    report: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl ReportDirective {
    /// Decodes a finalized reply buffer. Returns `None` for anything that is
    /// not a complete directive; this never fails.
    pub fn decode(buffer: &str) -> Option<Self> {
        let raw: RawDirective = serde_json::from_str(buffer.trim()).ok()?;
        if raw.report != Some(serde_json::Value::Bool(true)) {
            return None;
        }
        let title = raw.title.filter(|t| !t.is_empty())?;
        let content = raw.content.filter(|c| !c.is_empty())?;
        Some(Self { title, content })
    }

    /// Suggested download name: spaces become `_`, then `.pdf`.
    pub fn file_name(&self) -> String {
        format!("{}.{REPORT_EXTENSION}", self.title.replace(' ', "_"))
    }
}
