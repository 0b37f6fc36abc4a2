//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Wayback Publish - deliver archive results to chat channels, social networks and relays
#[derive(Parser, Debug)]
#[command(
    name = "wayback-publish",
    author,
    version,
    about = "Publish archive results to every enabled destination",
    long_about = "Reads archive results produced by the capture pipeline and publishes them \n\
                  concurrently to every enabled destination (Telegram channel, Mastodon, \n\
                  GitHub issues, Nostr relays), optionally feeding a Meilisearch index."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "WAYBACK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "WAYBACK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Expose Prometheus metrics on this port
    #[arg(long, global = true, env = "WAYBACK_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish archive results to every enabled destination
    Publish(PublishArgs),

    /// Validate configuration file without publishing
    Validate(ValidateArgs),

    /// Create and configure the Meilisearch index
    IndexSetup(IndexSetupArgs),
}

/// Arguments for the `publish` command
#[derive(Parser, Debug, Clone)]
pub struct PublishArgs {
    /// Path to configuration file (TOML or JSON); environment only when omitted
    #[arg(short, long, env = "WAYBACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Archive results as a JSON array of records (`-` for stdin)
    #[arg(short, long, default_value = "-")]
    pub records: PathBuf,

    /// Reduxer bundle (JSON object keyed by source) used to enrich messages
    #[arg(short, long)]
    pub bundle: Option<PathBuf>,

    /// Origin label attached to the publish request
    #[arg(long, default_value = "cli")]
    pub from: String,

    /// Give up after this many seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "WAYBACK_PUBLISH_TIMEOUT")]
    pub timeout: u64,

    /// Skip the random delay before each publish
    #[arg(long)]
    pub no_pacing: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "wayback.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `index-setup` command
#[derive(Parser, Debug)]
pub struct IndexSetupArgs {
    /// Path to configuration file; environment only when omitted
    #[arg(short, long, env = "WAYBACK_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
