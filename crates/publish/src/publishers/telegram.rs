//! Telegram channel publisher (Bot API `sendMessage`)

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use contracts::{Collect, ContractError, TelegramOptions};
use observability::{record_publish, PublishStatus};

use super::http;
use crate::context::PublishContext;
use crate::extract::extract;
use crate::publisher::Publisher;
use crate::render::{PlainText, Render};

const NAME: &str = "telegram";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Authenticated bot handle
#[derive(Clone)]
pub struct TelegramBot {
    http: Client,
    api_base: String,
    token: String,
}

impl fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramBot")
            .field("api_base", &self.api_base)
            .field("token", &http::redact(&self.token))
            .finish()
    }
}

impl TelegramBot {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self, ContractError> {
        Ok(Self {
            http: http::client(NAME)?,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_options(opts: &TelegramOptions) -> Result<Self, ContractError> {
        Self::new(&opts.token, &opts.api_base)
    }

    /// Post `text` to `chat` (channel username or numeric id)
    pub async fn send_message(&self, chat: &str, text: &str) -> Result<(), ContractError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let endpoint = format!("{}/sendMessage", self.api_base);
        let resp = self
            .http
            .post(&url)
            .json(&SendMessage {
                chat_id: chat,
                text,
                disable_web_page_preview: false,
            })
            .send()
            .await
            .map_err(|e| http::transport(&endpoint, e.without_url()))?;
        let resp = http::expect_status(&endpoint, resp, StatusCode::OK).await?;

        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| ContractError::delivery(NAME, e.without_url().to_string()))?;
        if !body.ok {
            return Err(ContractError::delivery(
                NAME,
                body.description.unwrap_or_else(|| "not ok".to_string()),
            ));
        }
        Ok(())
    }
}

/// Publishes to one Telegram channel
pub struct TelegramPublisher {
    bot: TelegramBot,
    channel: String,
    renderer: Arc<dyn Render>,
}

impl TelegramPublisher {
    pub fn new(bot: TelegramBot, channel: impl Into<String>) -> Self {
        Self {
            bot,
            channel: channel.into(),
            renderer: Arc::new(PlainText),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderer = renderer;
        self
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    fn name(&self) -> &str {
        NAME
    }

    #[instrument(name = "telegram_publish", skip_all, fields(channel = %self.channel))]
    async fn publish(
        &self,
        ctx: &PublishContext,
        cols: &[Collect],
        _args: &[String],
    ) -> Result<(), ContractError> {
        if cols.is_empty() {
            return Err(ContractError::empty_collects(NAME));
        }
        record_publish(NAME, PublishStatus::Request);

        let reduxer = match extract(ctx, cols) {
            Ok((rdx, _)) => Some(rdx),
            Err(e) => {
                warn!(error = %e, "Publishing without bundle");
                None
            }
        };
        let text = self.renderer.render(NAME, cols, reduxer);
        if text.trim().is_empty() {
            record_publish(NAME, PublishStatus::Failure);
            return Err(ContractError::validation(NAME, "message is blank"));
        }

        match self.bot.send_message(&self.channel, &text).await {
            Ok(()) => {
                debug!("Telegram message sent");
                record_publish(NAME, PublishStatus::Success);
                Ok(())
            }
            Err(e) => {
                record_publish(NAME, PublishStatus::Failure);
                Err(e)
            }
        }
    }
}
