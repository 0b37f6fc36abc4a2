//! `index-setup` command implementation.

use anyhow::Result;
use tracing::info;

use indexing::MeiliClient;

use super::load_options;
use crate::cli::IndexSetupArgs;
use crate::error::CliError;

/// Execute the `index-setup` command
pub async fn run_index_setup(args: &IndexSetupArgs) -> Result<()> {
    let options = load_options(args.config.as_deref())?;
    let meili = match options.meili {
        Some(ref meili) if options.enabled_meilisearch() => meili,
        _ => return Err(CliError::IndexDisabled.into()),
    };

    let mut client = MeiliClient::from_options(meili).map_err(CliError::from)?;
    client.setup().await.map_err(CliError::from)?;

    info!(index = %client.index(), "Index setup complete");
    println!(
        "✓ Index '{}' ready (server {})",
        client.index(),
        client.version().unwrap_or("unknown")
    );
    Ok(())
}
