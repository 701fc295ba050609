//! Translation of upstream failures into [`UpstreamError`] kinds
//!
//! Every function here is pure; the client feeds it whatever it managed to
//! read off the wire.

use crate::error::{UpstreamError, UpstreamErrorKind};

/// Code used when a 4xx body carries no parseable error envelope
pub const UNPARSEABLE_ERROR_CODE: &str = "unparseableError";

/// Classify a structured error response (`{"code": ..., "message": ...}`)
///
/// `status` only enriches the message of unrecognized codes; recognized codes
/// forward the upstream message verbatim.
pub fn classify(status: u16, code: &str, message: &str) -> UpstreamError {
    match recognized_kind(code) {
        Some(kind) => UpstreamError::new(kind, message),
        None => {
            let detail = if message.is_empty() {
                format!("HTTP {} ({})", status, code)
            } else {
                message.to_string()
            };
            UpstreamError::new(
                UpstreamErrorKind::BadRequest,
                format!("Unexpected Error: {}", detail),
            )
        }
    }
}

/// Kind of a documented upstream error code, `None` for anything else
pub fn recognized_kind(code: &str) -> Option<UpstreamErrorKind> {
    use UpstreamErrorKind::*;

    match code {
        "apiKeyDisabled" | "apiKeyExhausted" | "apiKeyInvalid" | "apiKeyMissing" => Some(Unauthorized),
        "parameterInvalid" | "parametersMissing" | "sourcesTooMany" => Some(BadRequest),
        "rateLimited" => Some(RateLimited),
        "sourceDoesNotExist" => Some(NotFound),
        "unexpectedError" => Some(ServerError),
        _ => None,
    }
}

/// Classify a 5xx response by status alone
///
/// Used when the body is unparseable or carries an unrecognized code.
pub fn classify_server_status(status: u16) -> UpstreamError {
    let message = match status {
        500 => "Internal Server Error: Please try again later.".to_string(),
        502 => "Bad Gateway: Issue with upstream server.".to_string(),
        503 => "Service Unavailable: NewsAPI is down.".to_string(),
        other => format!("Unexpected Server Error: HTTP {}", other),
    };
    UpstreamError::new(UpstreamErrorKind::ServerError, message)
}

/// Wrap a transport-level failure (refused connection, timeout, bad body)
pub fn transport(
    message: impl Into<String>,
    cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> UpstreamError {
    UpstreamError::new(UpstreamErrorKind::UnknownTransport, message).with_source(cause)
}
