//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Apply `WAYBACK_*` environment overrides
//! - Validate configuration legality
//! - Generate `PublishOptions`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let opts = ConfigLoader::load_from_path(Path::new("publish.toml")).unwrap();
//! println!("nostr enabled: {}", opts.publish_to_nostr());
//! ```

mod env;
mod parser;
mod validator;

pub use contracts::PublishOptions;
pub use env::apply_env_overrides;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<PublishOptions, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from file path, then overlay the process environment
    pub fn load_with_env(path: &Path) -> Result<PublishOptions, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        let mut opts = parser::parse(&content, format)?;
        apply_env_overrides(&mut opts, std::env::vars())?;
        validator::validate(&opts)?;
        Ok(opts)
    }

    /// Build configuration from the process environment only
    pub fn from_env() -> Result<PublishOptions, ContractError> {
        let mut opts = PublishOptions::default();
        apply_env_overrides(&mut opts, std::env::vars())?;
        validator::validate(&opts)?;
        Ok(opts)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<PublishOptions, ContractError> {
        Self::parse_and_validate(content, format)
    }

}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<PublishOptions, ContractError> {
        let opts = parser::parse(content, format)?;
        validator::validate(&opts)?;
        Ok(opts)
    }
}
