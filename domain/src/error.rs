//! Error taxonomy shared by every layer.
//!
//! Validation errors (`TemplateError`, `FormError`) are recovered by asking
//! the user again and never reach a completion backend. Backend errors
//! (`CompletionError`) are caught at the session boundary and recorded as an
//! error message. `ExtractionError` ends the document pipeline.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("missing value for placeholder `{0}`")]
    MissingField(String),
    #[error("template placeholders have no form field: {}", .0.join(", "))]
    Unbound(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("{field}: {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field}: `{value}` is not one of the allowed options")]
    InvalidChoice { field: String, value: String },
    #[error("{field}: expected a {expected} value")]
    KindMismatch {
        field: String,
        expected: &'static str,
    },
    #[error("{field}: `{raw}` is not a number")]
    InvalidNumber { field: String, raw: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("form schema has no fields")]
    Empty,
    #[error("field name must not be empty")]
    EmptyName,
    #[error("duplicate field `{0}`")]
    DuplicateField(String),
    #[error("{field}: invalid bounds [{min}, {max}]")]
    InvalidBounds { field: String, min: f64, max: f64 },
    #[error("{0}: option list is empty")]
    NoOptions(String),
    #[error("{field}: default value rejected: {source}")]
    InvalidDefault {
        field: String,
        #[source]
        source: FormError,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompletionError {
    /// Network failure, timeout, rate limit or server-side fault. May be retried.
    #[error("transient backend error: {0}")]
    Transient(String),
    /// Rejected request (content policy, bad request, auth). Never retried.
    #[error("model error: {0}")]
    Model(String),
}

impl CompletionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CompletionError::Transient(_))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("text extraction failed: {0}")]
pub struct ExtractionError(pub String);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Local failures that abort a turn before anything is recorded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TurnError {
    #[error("query cannot be empty")]
    EmptyQuery,
    #[error("invalid profile: {0}")]
    Validation(#[from] FormError),
    #[error("prompt rendering failed: {0}")]
    Template(#[from] TemplateError),
}
