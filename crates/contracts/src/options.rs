//! PublishOptions - Config Loader output
//!
//! Destination credentials, endpoint lists and pacing.

use serde::{Deserialize, Serialize};

/// Complete publish configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOptions {
    /// Upper bound of the per-group pacing delay, seconds (0 = no pacing)
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,

    #[serde(default)]
    pub telegram: Option<TelegramOptions>,

    #[serde(default)]
    pub mastodon: Option<MastodonOptions>,

    #[serde(default)]
    pub github: Option<GitHubOptions>,

    #[serde(default)]
    pub nostr: Option<NostrOptions>,

    /// Search index fed after delivery
    #[serde(default)]
    pub meili: Option<MeiliOptions>,
}

fn default_max_delay_secs() -> u64 {
    10
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            max_delay_secs: default_max_delay_secs(),
            telegram: None,
            mastodon: None,
            github: None,
            nostr: None,
            meili: None,
        }
    }
}

/// Telegram channel settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramOptions {
    /// Bot token
    pub token: String,

    /// Channel username (`@name`) or numeric chat id
    pub channel: String,

    #[serde(default = "default_telegram_api")]
    pub api_base: String,
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

/// Mastodon account settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MastodonOptions {
    /// Instance base URL
    pub server: String,

    pub access_token: String,

    #[serde(default = "default_visibility")]
    pub visibility: String,
}

fn default_visibility() -> String {
    "public".to_string()
}

/// GitHub issues settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubOptions {
    pub token: String,
    pub owner: String,
    pub repo: String,

    #[serde(default = "default_github_api")]
    pub api_base: String,
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

/// Nostr relay settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NostrOptions {
    /// Hex or bech32 (`nsec1...`) private key
    pub private_key: String,

    /// Relay endpoints (`wss://...`)
    #[serde(default)]
    pub relay_urls: Vec<String>,
}

/// Meilisearch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeiliOptions {
    pub endpoint: String,

    /// Admin API key, may be empty
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_meili_index")]
    pub index: String,
}

pub fn default_meili_index() -> String {
    "capsules".to_string()
}

fn filled(s: &str) -> bool {
    !s.trim().is_empty()
}

impl PublishOptions {
    /// Telegram channel publishing is configured
    pub fn publish_to_channel(&self) -> bool {
        self.telegram
            .as_ref()
            .is_some_and(|t| filled(&t.token) && filled(&t.channel))
    }

    pub fn publish_to_mastodon(&self) -> bool {
        self.mastodon
            .as_ref()
            .is_some_and(|m| filled(&m.server) && filled(&m.access_token))
    }

    /// GitHub issue publishing is configured
    pub fn publish_to_issues(&self) -> bool {
        self.github
            .as_ref()
            .is_some_and(|g| filled(&g.token) && filled(&g.owner) && filled(&g.repo))
    }

    pub fn publish_to_nostr(&self) -> bool {
        self.nostr.as_ref().is_some_and(|n| {
            filled(&n.private_key) && n.relay_urls.iter().any(|url| filled(url))
        })
    }

    pub fn enabled_meilisearch(&self) -> bool {
        self.meili.as_ref().is_some_and(|m| filled(&m.endpoint))
    }
}
