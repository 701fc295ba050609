use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, UpstreamErrorKind};

/// An error rendered as `{"error": <kind>, "message": <text>}`
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl HttpError {
    pub fn from_error(err: Error) -> Self {
        match err {
            Error::InvalidParams(msg) => Self::new(
                StatusCode::BAD_REQUEST,
                "invalid_params",
                format!("Bad Request: {}", msg),
            ),
            Error::Upstream(upstream) => {
                let kind = upstream.kind;
                let (status, prefix) = match kind {
                    UpstreamErrorKind::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized: "),
                    UpstreamErrorKind::BadRequest => (StatusCode::BAD_REQUEST, "Bad Request: "),
                    UpstreamErrorKind::RateLimited => {
                        (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded: ")
                    }
                    UpstreamErrorKind::NotFound => (StatusCode::NOT_FOUND, "Not Found: "),
                    UpstreamErrorKind::ServerError => {
                        (StatusCode::SERVICE_UNAVAILABLE, "Internal server error: ")
                    }
                    UpstreamErrorKind::UnknownTransport => (StatusCode::BAD_GATEWAY, "Bad Gateway: "),
                };
                Self::new(status, kind.as_str(), format!("{}{}", prefix, upstream.message))
            }
            Error::Persistence(e) => {
                tracing::error!("Persistence failure: {}", e);
                Self::internal(e.to_string())
            }
            other => {
                tracing::error!("Request failed: {}", other);
                Self::internal(other.to_string())
            }
        }
    }

    fn internal(message: String) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            format!("An internal server error occurred: {}", message),
        )
    }

    fn new(status: StatusCode, kind: &'static str, message: String) -> Self {
        Self {
            status,
            kind,
            message,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for HttpError {
    fn from(err: Error) -> Self {
        Self::from_error(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let payload = ErrorBody {
            error: self.kind.to_string(),
            message: self.message,
        };
        (self.status, Json(payload)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

pub type HttpResult<T> = Result<T, HttpError>;
