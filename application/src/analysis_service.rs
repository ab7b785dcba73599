//! Single-shot document analysis: extract text, then one completion call.

use domain::analysis::AnalysisResult;
use domain::completion::{CompletionClient, CompletionRequest};
use domain::error::{AnalysisError, ExtractionError};
use domain::extractor::DocumentExtractor;
use domain::profiles::{analysis_prompt, ANALYSIS_MAX_TOKENS, HEALTH_REPORT_INSTRUCTION};
use shared::telemetry::Telemetry;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct AnalysisService {
    extractor: Arc<dyn DocumentExtractor>,
    client: Arc<dyn CompletionClient>,
    instruction: String,
    model: String,
    max_tokens: Option<u32>,
}

impl AnalysisService {
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        client: Arc<dyn CompletionClient>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            extractor,
            client,
            instruction: HEALTH_REPORT_INSTRUCTION.to_string(),
            model: model.into(),
            max_tokens: Some(ANALYSIS_MAX_TOKENS),
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Fails with the first error encountered; no partial result is returned
    /// and the backend is never called when extraction fails.
    #[instrument(skip_all, fields(bytes = document.len()))]
    pub async fn analyze(&self, document: &[u8]) -> Result<AnalysisResult, AnalysisError> {
        let telemetry = Telemetry::new();

        let text = self.extractor.extract(document).map_err(|err| {
            warn!(error = %err, "document extraction failed");
            err
        })?;
        if text.trim().is_empty() {
            return Err(ExtractionError("document contains no extractable text".to_string()).into());
        }

        let request = CompletionRequest::new(
            self.model.clone(),
            analysis_prompt(&self.instruction, &text),
        )
        .with_max_tokens(self.max_tokens);
        let recommendation = self.client.complete(&request).await?;

        info!(
            chars = text.len(),
            elapsed_ms = telemetry.elapsed_ms(),
            "document analyzed"
        );
        Ok(AnalysisResult::new(text, recommendation))
    }
}
