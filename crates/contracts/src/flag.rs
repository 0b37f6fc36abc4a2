//! Flag - inbound service that triggered a publish

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which inbound service produced the publish request.
///
/// Used only to look up a live, already authenticated platform handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    /// HTTP service
    Web,
    Telegram,
    Twitter,
    Mastodon,
    Discord,
    Matrix,
    Slack,
    Nostr,
    /// IRC relay chat
    Irc,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::Web => "httpd",
            Flag::Telegram => "telegram",
            Flag::Twitter => "twitter",
            Flag::Mastodon => "mastodon",
            Flag::Discord => "discord",
            Flag::Matrix => "matrix",
            Flag::Slack => "slack",
            Flag::Nostr => "nostr",
            Flag::Irc => "irc",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
