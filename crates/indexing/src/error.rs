//! Error types for the search-index sink.

use thiserror::Error;

/// Errors raised while talking to the search index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// HTTP request failed.
    #[error("{operation}: request failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with an unexpected status.
    #[error("{operation}: unexpected status: {status}")]
    UnexpectedStatus { operation: &'static str, status: u16 },

    /// Failed to deserialize response.
    #[error("{operation}: unmarshal json failed: {source}")]
    Deserialize {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Index does not exist on the server.
    #[error("indexing {0} not found")]
    IndexNotFound(String),

    /// Server reported a task for another index.
    #[error("indexing {0} not match")]
    IndexNotMatch(String),

    /// Server version could not be parsed.
    #[error("invalid server version: {0}")]
    InvalidVersion(String),

    /// Nothing to push.
    #[error("push documents failed: collects empty")]
    EmptyCollects,

    /// Invalid endpoint provided.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
