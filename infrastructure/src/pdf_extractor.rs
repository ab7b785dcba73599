use domain::error::ExtractionError;
use domain::extractor::DocumentExtractor;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// PDF text extraction backed by `pdf-extract`. Pages are emitted in
/// document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if bytes.is_empty() {
            return Err(ExtractionError("document is empty".to_string()));
        }
        // pdf-extract panics on some malformed streams instead of erroring.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }));
        match result {
            Ok(Ok(text)) => {
                debug!(bytes = bytes.len(), chars = text.len(), "pdf text extracted");
                Ok(text)
            }
            Ok(Err(err)) => Err(ExtractionError(err.to_string())),
            Err(_) => Err(ExtractionError("malformed PDF structure".to_string())),
        }
    }
}
