//! Concrete destinations

mod github;
mod http;
mod mastodon;
pub mod nostr;
mod telegram;

pub use github::GitHubPublisher;
pub use mastodon::{MastodonClient, MastodonPublisher};
pub use nostr::NostrPublisher;
pub use telegram::{TelegramBot, TelegramPublisher};
