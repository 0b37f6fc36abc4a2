//! Layered error definitions
//!
//! Categorized by source: config / validation / connection / protocol /
//! cancellation / bundle

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Validation Errors =====
    /// Nothing to publish
    #[error("publish to {destination}: collects empty")]
    EmptyCollects { destination: String },

    /// Precondition failed before any network call
    #[error("{destination} validation failed: {message}")]
    Validation {
        destination: String,
        message: String,
    },

    /// Signing key or token could not be resolved
    #[error("{destination} credential error: {message}")]
    Credential {
        destination: String,
        message: String,
    },

    // ===== Connection / Protocol Errors =====
    /// Endpoint unreachable
    #[error("connect to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    /// Endpoint acknowledged with an unexpected status
    #[error("published to {endpoint} status is {status}, not {expected}")]
    Status {
        endpoint: String,
        status: String,
        expected: String,
    },

    /// Platform rejected the delivery
    #[error("publish to {destination} failed: {message}")]
    Delivery {
        destination: String,
        message: String,
    },

    // ===== Cancellation Errors =====
    /// Ambient cancellation observed
    #[error("context canceled")]
    Cancelled,

    /// Ambient deadline elapsed
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// A task panicked and was contained
    #[error("task '{task}' panicked: {message}")]
    Panicked { task: String, message: String },

    // ===== Bundle Errors =====
    /// No reduxer was handed to the publish call
    #[error("invalid reduxer")]
    InvalidReduxer,

    /// Reduxer has no entry for the requested source
    #[error("reduxer data not found for {source_url}")]
    ReduxerNotFound { source_url: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn empty_collects(destination: impl Into<String>) -> Self {
        Self::EmptyCollects {
            destination: destination.into(),
        }
    }

    pub fn validation(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            destination: destination.into(),
            message: message.into(),
        }
    }

    pub fn credential(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Credential {
            destination: destination.into(),
            message: message.into(),
        }
    }

    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create delivery error
    pub fn delivery(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Whether the error reports that the caller gave up, rather than a
    /// rejection by the destination.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Whether the error was raised before any network I/O was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyCollects { .. } | Self::Validation { .. } | Self::Credential { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_distinct_from_delivery() {
        assert!(ContractError::Cancelled.is_cancellation());
        assert!(ContractError::DeadlineExceeded.is_cancellation());
        assert!(!ContractError::delivery("nostr", "relay down").is_cancellation());
    }

    #[test]
    fn test_status_display() {
        let err = ContractError::Status {
            endpoint: "wss://relay.example".to_string(),
            status: "failed".to_string(),
            expected: "succeeded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "published to wss://relay.example status is failed, not succeeded"
        );
    }
}
