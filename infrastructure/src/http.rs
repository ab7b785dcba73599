//! Mapping of HTTP transport failures onto the completion error taxonomy.

use domain::error::CompletionError;
use reqwest::StatusCode;

pub(crate) fn send_error(backend: &str, err: reqwest::Error) -> CompletionError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        CompletionError::Transient(format!("{backend} unreachable: {err}"))
    } else {
        CompletionError::Model(format!("{backend} request failed: {err}"))
    }
}

/// 408, 429 and 5xx are worth retrying; every other failure status is terminal.
pub(crate) fn status_error(backend: &str, status: StatusCode, body: &str) -> CompletionError {
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        CompletionError::Transient(format!("{backend} API error {detail}"))
    } else {
        CompletionError::Model(format!("{backend} API error {detail}"))
    }
}
