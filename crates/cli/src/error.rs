//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or is invalid
    #[error("Failed to load configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// Archive results or bundle could not be decoded
    #[error("Failed to read {what} from {path}: {message}")]
    Input {
        what: &'static str,
        path: String,
        message: String,
    },

    /// Search index not configured
    #[error("Meilisearch is not configured (set [meili] or WAYBACK_MEILI_ENDPOINT)")]
    IndexDisabled,

    /// Search index error
    #[error("Search index error: {0}")]
    Index(#[from] indexing::IndexError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn input(what: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Input {
            what,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
