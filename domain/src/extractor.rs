use crate::error::ExtractionError;

/// Turns a binary document into plain text, all pages in document order.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}
