//! Mastodon status publisher

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use contracts::{Collect, ContractError, MastodonOptions};
use observability::{record_publish, PublishStatus};

use super::http;
use crate::context::PublishContext;
use crate::extract::extract;
use crate::publisher::Publisher;
use crate::render::{PlainText, Render};

const NAME: &str = "mastodon";

#[derive(Serialize)]
struct NewStatus<'a> {
    status: &'a str,
    visibility: &'a str,
}

/// Authenticated Mastodon account handle
#[derive(Clone)]
pub struct MastodonClient {
    http: Client,
    server: String,
    access_token: String,
}

impl fmt::Debug for MastodonClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MastodonClient")
            .field("server", &self.server)
            .field("access_token", &http::redact(&self.access_token))
            .finish()
    }
}

impl MastodonClient {
    pub fn new(
        server: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, ContractError> {
        Ok(Self {
            http: http::client(NAME)?,
            server: server.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    pub fn from_options(opts: &MastodonOptions) -> Result<Self, ContractError> {
        Self::new(&opts.server, &opts.access_token)
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// `POST /api/v1/statuses`
    pub async fn post_status(&self, text: &str, visibility: &str) -> Result<(), ContractError> {
        let endpoint = format!("{}/api/v1/statuses", self.server);
        let resp = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.access_token)
            .json(&NewStatus {
                status: text,
                visibility,
            })
            .send()
            .await
            .map_err(|e| http::transport(&endpoint, e))?;
        http::expect_status(&endpoint, resp, StatusCode::OK).await?;
        Ok(())
    }
}

/// Publishes a status on one Mastodon account
pub struct MastodonPublisher {
    client: MastodonClient,
    visibility: String,
    renderer: Arc<dyn Render>,
}

impl MastodonPublisher {
    pub fn new(client: MastodonClient, visibility: impl Into<String>) -> Self {
        Self {
            client,
            visibility: visibility.into(),
            renderer: Arc::new(PlainText),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderer = renderer;
        self
    }
}

#[async_trait]
impl Publisher for MastodonPublisher {
    fn name(&self) -> &str {
        NAME
    }

    #[instrument(name = "mastodon_publish", skip_all, fields(server = %self.client.server()))]
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
            return Err(ContractError::validation(NAME, "status is blank"));
        }

        let result = self.client.post_status(&text, &self.visibility).await;
        match &result {
            Ok(()) => {
                debug!("Mastodon status posted");
                record_publish(NAME, PublishStatus::Success);
            }
            Err(_) => record_publish(NAME, PublishStatus::Failure),
        }
        result
    }
}
