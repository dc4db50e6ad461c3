//! Error types for the pager service.

use axum::http::StatusCode;
use thiserror::Error;

/// Reasons an inbound message body cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Fewer than two space-separated words (or an empty body).
    #[error("invalid message format")]
    InvalidMessageFormat,

    /// The leading session identifier is not exactly six characters.
    #[error("invalid identifier format")]
    InvalidIdentifierFormat,
}

/// Errors surfaced by the store, the reconciler and the merge pipeline.
#[derive(Error, Debug)]
pub enum PagerError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A point lookup found nothing at the path.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The sender holds no session and named no usable one.
    #[error("No session found")]
    NoSessionFound,

    #[error("Store failure: {0}")]
    Store(String),

    /// A stored document failed a field type check when loaded.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
}

impl PagerError {
    /// HTTP status the webhook answers with for this error.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Parse(_) | Self::NotFound(_) | Self::NoSessionFound => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::MalformedDocument(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller, not the service, is at fault.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::NotFound(_) | Self::NoSessionFound
        )
    }
}

impl From<rusqlite::Error> for PagerError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<serde_json::Error> for PagerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Store(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_bad_request() {
        assert_eq!(
            PagerError::from(ParseError::InvalidMessageFormat).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PagerError::NoSessionFound.status_code(), StatusCode::BAD_REQUEST);
        assert!(PagerError::NoSessionFound.is_client_error());
    }

    #[test]
    fn store_errors_map_to_server_error() {
        let err = PagerError::Store("connection reset".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_client_error());
        assert!(!PagerError::MalformedDocument("x".into()).is_client_error());
    }
}
