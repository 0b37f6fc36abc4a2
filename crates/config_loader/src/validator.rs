//! Config validation
//!
//! Rules:
//! - relay URLs use ws:// or wss:// and are unique
//! - HTTP endpoints use http:// or https://
//! - enabled sections carry all required fields

use std::collections::HashSet;

use contracts::{ContractError, PublishOptions};
use url::Url;

/// Validate PublishOptions
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(opts: &PublishOptions) -> Result<(), ContractError> {
    validate_nostr(opts)?;
    validate_http_endpoints(opts)?;
    validate_github(opts)?;
    Ok(())
}

fn validate_nostr(opts: &PublishOptions) -> Result<(), ContractError> {
    let Some(nostr) = &opts.nostr else {
        return Ok(());
    };

    let mut seen = HashSet::new();
    for (idx, relay) in nostr.relay_urls.iter().enumerate() {
        let field = format!("nostr.relay_urls[{idx}]");
        let url = Url::parse(relay)
            .map_err(|e| ContractError::config_validation(&field, format!("invalid url '{relay}': {e}")))?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ContractError::config_validation(
                field,
                format!("relay url must use ws:// or wss://, got '{relay}'"),
            ));
        }
        if !seen.insert(url.as_str().to_string()) {
            return Err(ContractError::config_validation(
                field,
                format!("duplicate relay url '{relay}'"),
            ));
        }
    }
    Ok(())
}

fn validate_http_endpoints(opts: &PublishOptions) -> Result<(), ContractError> {
    let mut endpoints: Vec<(&str, &str)> = Vec::new();
    if let Some(t) = &opts.telegram {
        endpoints.push(("telegram.api_base", &t.api_base));
    }
    if let Some(m) = &opts.mastodon {
        endpoints.push(("mastodon.server", &m.server));
    }
    if let Some(g) = &opts.github {
        endpoints.push(("github.api_base", &g.api_base));
    }
    if let Some(m) = &opts.meili {
        endpoints.push(("meili.endpoint", &m.endpoint));
    }

    for (field, endpoint) in endpoints {
        if endpoint.trim().is_empty() {
            continue;
        }
        let url = Url::parse(endpoint).map_err(|e| {
            ContractError::config_validation(field, format!("invalid url '{endpoint}': {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ContractError::config_validation(
                field,
                format!("endpoint must use http:// or https://, got '{endpoint}'"),
            ));
        }
    }
    Ok(())
}

fn validate_github(opts: &PublishOptions) -> Result<(), ContractError> {
    let Some(github) = &opts.github else {
        return Ok(());
    };
    if github.token.trim().is_empty() {
        return Ok(());
    }
    if github.owner.trim().is_empty() {
        return Err(ContractError::config_validation(
            "github.owner",
            "owner cannot be empty when token is set",
        ));
    }
    if github.repo.trim().is_empty() {
        return Err(ContractError::config_validation(
            "github.repo",
            "repo cannot be empty when token is set",
        ));
    }
    Ok(())
}
