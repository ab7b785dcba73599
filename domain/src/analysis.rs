use crate::transcript::ExportFormat;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a single document analysis. Not persisted unless exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub source_text: String,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(source_text: String, recommendation: String) -> Self {
        Self {
            source_text,
            recommendation,
            created_at: Utc::now(),
        }
    }

    /// Plain-text report offered for download.
    pub fn report(&self) -> String {
        format!("PDF Analysis Results\n\n{}\n", self.recommendation)
    }

    pub fn render(&self, format: ExportFormat) -> serde_json::Result<String> {
        match format {
            ExportFormat::Text => Ok(self.report()),
            ExportFormat::Json => serde_json::to_string_pretty(self),
        }
    }
}
