//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::{ConfigLoader, PublishOptions};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    max_delay_secs: u64,
    enabled: Vec<&'static str>,
    relay_count: usize,
    search_index: Option<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match ConfigLoader::load_from_path(&args.config) {
        Ok(opts) => {
            let warnings = collect_warnings(&opts);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(summarize(&opts)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(opts: &PublishOptions) -> ConfigSummary {
    ConfigSummary {
        max_delay_secs: opts.max_delay_secs,
        enabled: enabled_destinations(opts),
        relay_count: opts.nostr.as_ref().map_or(0, |n| n.relay_urls.len()),
        search_index: opts
            .meili
            .as_ref()
            .filter(|_| opts.enabled_meilisearch())
            .map(|m| m.index.clone()),
    }
}

fn enabled_destinations(opts: &PublishOptions) -> Vec<&'static str> {
    [
        ("telegram", opts.publish_to_channel()),
        ("mastodon", opts.publish_to_mastodon()),
        ("github", opts.publish_to_issues()),
        ("nostr", opts.publish_to_nostr()),
    ]
    .into_iter()
    .filter_map(|(name, on)| on.then_some(name))
    .collect()
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(opts: &PublishOptions) -> Vec<String> {
    let mut warnings = Vec::new();

    if enabled_destinations(opts).is_empty() {
        warnings.push("No destination enabled - publish will be a no-op".to_string());
    }
    if opts.telegram.is_some() && !opts.publish_to_channel() {
        warnings.push("[telegram] present but token or channel is blank".to_string());
    }
    if opts.mastodon.is_some() && !opts.publish_to_mastodon() {
        warnings.push("[mastodon] present but server or access_token is blank".to_string());
    }
    if opts.nostr.is_some() && !opts.publish_to_nostr() {
        warnings.push("[nostr] present but private_key or relay_urls is empty".to_string());
    }
    if opts.max_delay_secs == 0 {
        warnings.push("max_delay_secs = 0 - pacing disabled".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Max delay: {}s", summary.max_delay_secs);
            println!("  Destinations: {}", summary.enabled.join(", "));
            println!("  Relays: {}", summary.relay_count);
            if let Some(ref index) = summary.search_index {
                println!("  Search index: {}", index);
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_reports_enabled_destinations() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            br#"
max_delay_secs = 0

[nostr]
private_key = "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa"
relay_urls = ["wss://relay.damus.io", "wss://nos.lol"]
"#,
        )
        .unwrap();

        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(result.valid);

        let summary = result.summary.unwrap();
        assert_eq!(summary.enabled, vec!["nostr"]);
        assert_eq!(summary.relay_count, 2);
        assert!(result
            .warnings
            .unwrap()
            .iter()
            .any(|w| w.contains("pacing disabled")));
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/wayback.toml".into(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
