//! Nostr publisher: one signed note broadcast to every configured relay.
//!
//! Delivery is all-or-nothing across relays. A note that reached only some
//! relays counts as failed for the whole destination.

mod event;
mod keys;
mod relay;

pub use event::{Event, KIND_TEXT_NOTE};
pub use keys::SigningKey;
pub use relay::{PublishStatus, RelayConnection, RelayConnector, WsConnector};

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{Collect, ContractError, NostrOptions, PublishOptions};
use observability::{record_publish, record_relay_ack, PublishStatus as MetricStatus};

use crate::context::PublishContext;
use crate::extract::extract;
use crate::publisher::Publisher;
use crate::render::{PlainText, Render};

const NAME: &str = "nostr";

/// Per-relay connect timeout, independent of the ambient deadline
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Broadcasts text notes to a set of relays
pub struct NostrPublisher {
    enabled: bool,
    options: NostrOptions,
    connector: Arc<dyn RelayConnector>,
    renderer: Arc<dyn Render>,
    connect_timeout: Duration,
}

impl NostrPublisher {
    /// Snapshot the nostr section; a disabled destination refuses to broadcast
    pub fn new(opts: &PublishOptions) -> Self {
        Self {
            enabled: opts.publish_to_nostr(),
            options: opts.nostr.clone().unwrap_or_default(),
            connector: Arc::new(WsConnector::new()),
            renderer: Arc::new(PlainText),
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    pub fn with_connector(mut self, connector: Arc<dyn RelayConnector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sign `note` once and deliver it to every relay.
    ///
    /// All relays are attempted and awaited; the first failure in relay
    /// order is returned.
    #[instrument(name = "nostr_broadcast", skip_all, fields(relays = self.options.relay_urls.len()))]
    pub async fn broadcast(&self, ctx: &PublishContext, note: &str) -> Result<(), ContractError> {
        if !self.enabled {
            return Err(ContractError::validation(NAME, "publish to nostr abort"));
        }
        if note.trim().is_empty() {
            return Err(ContractError::validation(NAME, "note can't be blank"));
        }
        debug!(note = %note, "Send to nostr");

        let key = SigningKey::parse(&self.options.private_key)?;
        let event = Arc::new(Event::text_note(&key, note, Utc::now())?);

        let tasks: Vec<(String, JoinHandle<Result<(), ContractError>>)> = self
            .options
            .relay_urls
            .iter()
            .filter(|url| !url.trim().is_empty())
            .map(|url| {
                let relay = url.trim().to_string();
                let handle = tokio::spawn(send_to_relay(
                    ctx.clone(),
                    Arc::clone(&self.connector),
                    relay.clone(),
                    Arc::clone(&event),
                    self.connect_timeout,
                ));
                (relay, handle)
            })
            .collect();

        let mut first_err = None;
        for (relay, handle) in tasks {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    let message = panic_message(e.into_panic());
                    Err(ContractError::connection(
                        &relay,
                        format!("relay task panicked: {message}"),
                    ))
                }
                Err(e) => Err(ContractError::connection(&relay, e.to_string())),
            };
            if let Err(e) = result {
                error!(relay = %relay, error = %e, "Publish to relay failed");
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Publisher for NostrPublisher {
    fn name(&self) -> &str {
        NAME
    }

    async fn publish(
        &self,
        ctx: &PublishContext,
        cols: &[Collect],
        _args: &[String],
    ) -> Result<(), ContractError> {
        if cols.is_empty() {
            return Err(ContractError::empty_collects(NAME));
        }
        record_publish(NAME, MetricStatus::Request);

        let reduxer = match extract(ctx, cols) {
            Ok((rdx, _)) => Some(rdx),
            Err(e) => {
                warn!(error = %e, "Publishing without bundle");
                None
            }
        };
        let note = self.renderer.render(NAME, cols, reduxer);

        match self.broadcast(ctx, note.trim()).await {
            Ok(()) => {
                record_publish(NAME, MetricStatus::Success);
                Ok(())
            }
            Err(e) => {
                record_publish(NAME, MetricStatus::Failure);
                Err(e)
            }
        }
    }
}

async fn send_to_relay(
    ctx: PublishContext,
    connector: Arc<dyn RelayConnector>,
    relay: String,
    event: Arc<Event>,
    connect_timeout: Duration,
) -> Result<(), ContractError> {
    debug!(relay = %relay, "Publish note to relay");

    let connecting = tokio::time::timeout(connect_timeout, connector.connect(&relay));
    let mut conn = tokio::select! {
        biased;
        cause = ctx.done() => return Err(cause),
        connected = connecting => match connected {
            Ok(conn) => conn?,
            Err(_) => {
                return Err(ContractError::connection(
                    &relay,
                    format!("connect timed out after {}s", connect_timeout.as_secs()),
                ))
            }
        },
    };

    let status = tokio::select! {
        biased;
        cause = ctx.done() => Err(cause),
        status = conn.publish(&event) => status,
    };
    conn.close().await;
    let status = status?;

    record_relay_ack(&relay, status == PublishStatus::Succeeded);
    if status != PublishStatus::Succeeded {
        return Err(ContractError::Status {
            endpoint: relay,
            status: status.to_string(),
            expected: PublishStatus::Succeeded.to_string(),
        });
    }
    Ok(())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
