//! `WAYBACK_*` environment overrides
//!
//! Values from the environment take precedence over the config file.
//! A section is created on demand when one of its variables is present.

use contracts::{
    default_meili_index, ContractError, GitHubOptions, MastodonOptions, MeiliOptions,
    NostrOptions, PublishOptions, TelegramOptions,
};
use tracing::debug;

/// Apply recognised variables from `vars` onto `opts`.
///
/// Unknown variables are ignored.
pub fn apply_env_overrides<I, K, V>(opts: &mut PublishOptions, vars: I) -> Result<(), ContractError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    for (key, value) in vars {
        let key = key.as_ref();
        if !key.starts_with("WAYBACK_") {
            continue;
        }
        let value: String = value.into();
        if apply_one(opts, key, value)? {
            debug!(variable = key, "Applied environment override");
        }
    }
    Ok(())
}

fn apply_one(opts: &mut PublishOptions, key: &str, value: String) -> Result<bool, ContractError> {
    match key {
        "WAYBACK_PUBLISH_MAX_DELAY" => {
            opts.max_delay_secs = value.trim().parse().map_err(|e| {
                ContractError::config_validation(key, format!("expected seconds, got '{value}': {e}"))
            })?;
        }
        "WAYBACK_TELEGRAM_TOKEN" => telegram(opts).token = value,
        "WAYBACK_TELEGRAM_CHANNEL" => telegram(opts).channel = value,
        "WAYBACK_MASTODON_SERVER" => mastodon(opts).server = value,
        "WAYBACK_MASTODON_TOKEN" => mastodon(opts).access_token = value,
        "WAYBACK_GITHUB_TOKEN" => github(opts).token = value,
        "WAYBACK_GITHUB_OWNER" => github(opts).owner = value,
        "WAYBACK_GITHUB_REPO" => github(opts).repo = value,
        "WAYBACK_NOSTR_PRIVATE_KEY" => nostr(opts).private_key = value,
        "WAYBACK_NOSTR_RELAY_URL" => {
            nostr(opts).relay_urls = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        "WAYBACK_MEILI_ENDPOINT" => meili(opts).endpoint = value,
        "WAYBACK_MEILI_APIKEY" => meili(opts).api_key = value,
        "WAYBACK_MEILI_INDEXING" => meili(opts).index = value,
        _ => return Ok(false),
    }
    Ok(true)
}

fn telegram(opts: &mut PublishOptions) -> &mut TelegramOptions {
    opts.telegram.get_or_insert_with(|| TelegramOptions {
        api_base: "https://api.telegram.org".to_string(),
        ..Default::default()
    })
}

fn mastodon(opts: &mut PublishOptions) -> &mut MastodonOptions {
    opts.mastodon.get_or_insert_with(|| MastodonOptions {
        visibility: "public".to_string(),
        ..Default::default()
    })
}

fn github(opts: &mut PublishOptions) -> &mut GitHubOptions {
    opts.github.get_or_insert_with(|| GitHubOptions {
        api_base: "https://api.github.com".to_string(),
        ..Default::default()
    })
}

fn nostr(opts: &mut PublishOptions) -> &mut NostrOptions {
    opts.nostr.get_or_insert_with(NostrOptions::default)
}

fn meili(opts: &mut PublishOptions) -> &mut MeiliOptions {
    opts.meili.get_or_insert_with(|| MeiliOptions {
        endpoint: String::new(),
        api_key: String::new(),
        index: default_meili_index(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_list_is_split() {
        let mut opts = PublishOptions::default();
        apply_env_overrides(
            &mut opts,
            [
                ("WAYBACK_NOSTR_RELAY_URL", "wss://a.example, wss://b.example,"),
                ("WAYBACK_NOSTR_PRIVATE_KEY", "nsec1abc"),
            ],
        )
        .unwrap();

        let nostr = opts.nostr.as_ref().unwrap();
        assert_eq!(nostr.relay_urls, vec!["wss://a.example", "wss://b.example"]);
        assert!(opts.publish_to_nostr());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut opts = PublishOptions {
            telegram: Some(TelegramOptions {
                token: "old".to_string(),
                channel: "@old".to_string(),
                api_base: "https://api.telegram.org".to_string(),
            }),
            ..Default::default()
        };
        apply_env_overrides(&mut opts, [("WAYBACK_TELEGRAM_TOKEN", "new")]).unwrap();

        let telegram = opts.telegram.as_ref().unwrap();
        assert_eq!(telegram.token, "new");
        assert_eq!(telegram.channel, "@old");
    }

    #[test]
    fn test_unrelated_variables_ignored() {
        let mut opts = PublishOptions::default();
        apply_env_overrides(&mut opts, [("HOME", "/root"), ("WAYBACK_UNKNOWN", "x")]).unwrap();
        assert!(opts.telegram.is_none());
        assert!(opts.nostr.is_none());
    }

    #[test]
    fn test_bad_delay_rejected() {
        let mut opts = PublishOptions::default();
        let err = apply_env_overrides(&mut opts, [("WAYBACK_PUBLISH_MAX_DELAY", "soon")]);
        assert!(err.is_err());
    }

    #[test]
    fn test_meili_defaults_index() {
        let mut opts = PublishOptions::default();
        apply_env_overrides(&mut opts, [("WAYBACK_MEILI_ENDPOINT", "http://localhost:7700")])
            .unwrap();
        assert_eq!(opts.meili.as_ref().unwrap().index, "capsules");
        assert!(opts.enabled_meilisearch());
    }
}
