//! Error types for the canvas client.

use thiserror::Error;

/// Errors that can occur when talking to the canvas server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL is invalid.
    #[error("invalid canvas server URL: {0}")]
    InvalidUrl(String),

    /// HTTP layer failed (connection, timeout, etc.).
    #[error("canvas server request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body could not be parsed.
    #[error("failed to parse canvas server response: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered 404 for the given resource.
    #[error("not found on canvas server: {0}")]
    NotFound(String),

    /// The server answered with any other non-success status.
    #[error("canvas server returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
}

impl ClientError {
    /// Returns true for transient failures: transport errors and 5xx responses.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if the connection could not be established at all, so
    /// the server cannot have seen the request.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect())
    }

    /// Returns true if the server reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_is_retryable() {
        let server = ClientError::Status {
            status: 503,
            body: "unavailable".into(),
        };
        assert!(server.is_retryable());

        let client = ClientError::Status {
            status: 400,
            body: "bad request".into(),
        };
        assert!(!client.is_retryable());

        assert!(!ClientError::NotFound("/api/elements/x".into()).is_retryable());
        assert!(!ClientError::InvalidUrl("bad".into()).is_retryable());
    }

    #[test]
    fn test_not_found_detection() {
        assert!(ClientError::NotFound("x".into()).is_not_found());
        assert!(!ClientError::InvalidUrl("x".into()).is_not_found());
        assert!(!ClientError::NotFound("x".into()).is_connect());
    }

    #[test]
    fn test_status_display() {
        let err = ClientError::Status {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "canvas server returned 500: boom");
    }
}
