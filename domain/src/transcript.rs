//! Export formats for the chat transcript and analysis reports.

use crate::memory::Message;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Json,
}

impl ExportFormat {
    /// `.json` selects JSON, anything else plain text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Text,
        }
    }
}

pub fn render_transcript(messages: &[Message], format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(messages),
        ExportFormat::Text => Ok(messages
            .iter()
            .map(|m| {
                if m.is_error() {
                    format!("{} [error]: {}\n", m.role, m.content)
                } else {
                    format!("{}: {}\n", m.role, m.content)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}
