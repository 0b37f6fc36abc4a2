//! PublishContext - per-call inputs shared by every fan-out level
//!
//! Carries the cancellation signal, an optional deadline, live platform
//! handles and the optional reduxer bundle as explicit fields.

use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, Flag, Reduxer};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::publishers::{MastodonClient, TelegramBot};

/// Live, already authenticated platform handles.
///
/// Owned by the services that created them; publishers borrow them for
/// one call and never close them.
#[derive(Debug, Clone, Default)]
pub struct Connections {
    telegram: Option<TelegramBot>,
    mastodon: Option<MastodonClient>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_telegram(mut self, bot: TelegramBot) -> Self {
        self.telegram = Some(bot);
        self
    }

    pub fn with_mastodon(mut self, client: MastodonClient) -> Self {
        self.mastodon = Some(client);
        self
    }

    pub fn telegram(&self) -> Option<&TelegramBot> {
        self.telegram.as_ref()
    }

    pub fn mastodon(&self) -> Option<&MastodonClient> {
        self.mastodon.as_ref()
    }

    /// Only the handle keyed by `flag`; empty for `None` or a flag without
    /// a live service.
    pub fn scoped(&self, flag: Option<Flag>) -> Connections {
        match flag {
            Some(Flag::Telegram) => Connections {
                telegram: self.telegram.clone(),
                mastodon: None,
            },
            Some(Flag::Mastodon) => Connections {
                telegram: None,
                mastodon: self.mastodon.clone(),
            },
            _ => Connections::default(),
        }
    }
}

/// Context handed through orchestrator -> dispatcher -> publisher
#[derive(Debug, Clone, Default)]
pub struct PublishContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    connections: Connections,
    reduxer: Option<Arc<Reduxer>>,
}

impl PublishContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up after `timeout`; an earlier deadline is kept.
    ///
    /// A timeout past the clock's range means no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    pub fn with_connections(mut self, connections: Connections) -> Self {
        self.connections = connections;
        self
    }

    pub fn with_reduxer(mut self, reduxer: Arc<Reduxer>) -> Self {
        self.reduxer = Some(reduxer);
        self
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    pub fn reduxer(&self) -> Option<&Reduxer> {
        self.reduxer.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and every clone of it
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Non-blocking check: the cause if the context is already done
    pub fn err(&self) -> Option<ContractError> {
        if self.cancel.is_cancelled() {
            return Some(ContractError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContractError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes,
    /// yielding the cause.
    pub async fn done(&self) -> ContractError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.cancel.cancelled() => ContractError::Cancelled,
                _ = sleep_until(deadline) => ContractError::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                ContractError::Cancelled
            }
        }
    }
}
