//! Error types for the workbook client.

use thiserror::Error;

/// Result type for workbook client operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur talking to the remote document service.
#[derive(Debug, Error)]
pub enum GraphError {
    /// No usable credential, or the refresh exchange failed. Reconnect required.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Non-2xx response from the remote API.
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// Response body was not the JSON we expected.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Response parsed but made no sense.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The credential store could not be read or written.
    #[error("credential store error: {0}")]
    Credentials(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GraphError {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            GraphError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True once retries for a 429 have been exhausted.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, GraphError::Auth(_))
    }
}
