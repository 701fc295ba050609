use std::fmt;

use thiserror::Error;

/// Failure classes reported by the upstream news API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamErrorKind {
    Unauthorized,
    BadRequest,
    RateLimited,
    NotFound,
    ServerError,
    UnknownTransport,
}

impl UpstreamErrorKind {
    /// Stable machine-readable name, used in HTTP error bodies and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::BadRequest => "bad_request",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::ServerError => "upstream_unavailable",
            Self::UnknownTransport => "upstream_unreachable",
        }
    }
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified error from the upstream API
///
/// `source` keeps the transport cause (if any) for diagnostics; it is not part
/// of equality or of the displayed message.
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl UpstreamError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// The upstream classification, if this error came from the news API
    pub fn upstream_kind(&self) -> Option<UpstreamErrorKind> {
        match self {
            Error::Upstream(e) => Some(e.kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
