//! Relay transport: connector/connection seam and the websocket implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use contracts::ContractError;

use super::event::Event;

const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(7);

/// Relay verdict on one submitted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    /// `["OK", id, true, ..]`
    Succeeded,
    /// `["OK", id, false, message]`
    Failed(String),
    /// Written, but no acknowledgment within the ack window
    Sent,
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed(msg) if msg.is_empty() => f.write_str("failed"),
            Self::Failed(msg) => write!(f, "failed ({msg})"),
            Self::Sent => f.write_str("sent"),
        }
    }
}

/// Opens relay connections
#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn RelayConnection>, ContractError>;
}

/// One open relay connection
#[async_trait]
pub trait RelayConnection: Send {
    /// Submit `event` and wait for the relay's verdict
    async fn publish(&mut self, event: &Event) -> Result<PublishStatus, ContractError>;

    async fn close(&mut self) {}
}

/// Websocket connector (`ws://` / `wss://`)
#[derive(Debug, Clone, Copy)]
pub struct WsConnector {
    ack_timeout: Duration,
}

impl WsConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self {
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        }
    }
}

#[async_trait]
impl RelayConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn RelayConnection>, ContractError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| ContractError::connection(url, e.to_string()))?;
        debug!(relay = %url, "Relay connected");
        Ok(Box::new(WsConnection {
            url: url.to_string(),
            stream,
            ack_timeout: self.ack_timeout,
        }))
    }
}

struct WsConnection {
    url: String,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    ack_timeout: Duration,
}

impl WsConnection {
    async fn await_ack(&mut self, id: &str) -> Result<PublishStatus, ContractError> {
        while let Some(frame) = self.stream.next().await {
            let frame = frame.map_err(|e| ContractError::connection(&self.url, e.to_string()))?;
            let text = match frame {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            trace!(relay = %self.url, frame = %text, "Relay frame");
            if let Some(status) = parse_ok(&text, id) {
                return Ok(status);
            }
        }
        Err(ContractError::connection(
            &self.url,
            "connection closed before acknowledgment",
        ))
    }
}

#[async_trait]
impl RelayConnection for WsConnection {
    async fn publish(&mut self, event: &Event) -> Result<PublishStatus, ContractError> {
        let frame = event.to_message()?;
        self.stream
            .send(Message::Text(frame))
            .await
            .map_err(|e| ContractError::connection(&self.url, e.to_string()))?;

        match tokio::time::timeout(self.ack_timeout, self.await_ack(&event.id)).await {
            Ok(status) => status,
            Err(_) => Ok(PublishStatus::Sent),
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(relay = %self.url, error = %e, "Relay close failed");
        }
    }
}

/// Match `["OK", <id>, <accepted>, <message>]` for our event id
fn parse_ok(text: &str, id: &str) -> Option<PublishStatus> {
    let frame: Value = serde_json::from_str(text).ok()?;
    let items = frame.as_array()?;
    if items.first()?.as_str()? != "OK" || items.get(1)?.as_str()? != id {
        return None;
    }
    let accepted = items.get(2)?.as_bool()?;
    if accepted {
        Some(PublishStatus::Succeeded)
    } else {
        let message = items.get(3).and_then(Value::as_str).unwrap_or_default();
        Some(PublishStatus::Failed(message.to_string()))
    }
}
