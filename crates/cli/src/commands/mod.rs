//! Command implementations.

mod index_setup;
mod publish;
mod validate;

pub use index_setup::run_index_setup;
pub use publish::run_publish;
pub use validate::run_validate;

use std::path::Path;

use config_loader::{ConfigLoader, PublishOptions};
use tracing::info;

use crate::error::{CliError, Result};

/// Load options from `path` overlaid with `WAYBACK_*`, or from the environment alone
pub(crate) fn load_options(path: Option<&Path>) -> Result<PublishOptions> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()));
            }
            info!(config = %path.display(), "Loading configuration");
            Ok(ConfigLoader::load_with_env(path)?)
        }
        None => {
            info!("Loading configuration from environment");
            Ok(ConfigLoader::from_env()?)
        }
    }
}
