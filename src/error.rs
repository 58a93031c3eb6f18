// API client error types
use reqwest::StatusCode;
use thiserror::Error;

use crate::storage::StorageError;

/// Failures surfaced by the typed API client.
///
/// Nothing here is retried: each variant is reported once to the caller that
/// started the request.
#[derive(Debug, Error)]
pub enum ClientError {
    // Transport level (DNS, TLS, connection reset, ...)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    Status {
        status: StatusCode,
        url: String,
        body: Option<String>,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Invalid endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("File '{name}' is {size} bytes, exceeding the {limit} byte upload limit")]
    PayloadTooLarge { name: String, size: u64, limit: u64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Token storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ClientError::InvalidArgument(message.into())
    }

    /// HTTP status carried by the error, if the backend answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Network(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
