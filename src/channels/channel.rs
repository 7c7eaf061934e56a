//! Channel trait and message types shared by every transport.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::error::ChannelError;

/// Stream of inbound messages produced by a started channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A message received from a channel.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Name of the channel that produced this message.
    pub channel: String,
    /// Sender identifier (Telegram user id, "local-user" on the CLI).
    pub user_id: String,
    /// Human-readable sender name, if known.
    pub user_name: Option<String>,
    pub content: String,
    /// Channel-specific routing data (e.g. Telegram `chat_id`).
    pub metadata: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            user_name: None,
            content: content.to_string(),
            metadata: serde_json::json!({}),
            received_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_user_name(mut self, name: &str) -> Self {
        self.user_name = Some(name.to_string());
        self
    }
}

/// A reply to send back on the originating channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub content: String,
    /// Send with the channel's rich-text mode (Markdown on Telegram).
    pub formatted: bool,
    /// Delete the reply after this long, where the channel supports it.
    pub expire_after: Option<Duration>,
}

impl OutgoingResponse {
    /// Plain text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            formatted: false,
            expire_after: None,
        }
    }

    /// Reply rendered with the channel's markup.
    pub fn formatted(content: impl Into<String>) -> Self {
        Self {
            formatted: true,
            ..Self::text(content)
        }
    }

    pub fn expiring(mut self, after: Option<Duration>) -> Self {
        self.expire_after = after;
        self
    }
}

/// A message transport.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Begin receiving messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Reply to a message received on this channel.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incoming_message_defaults() {
        let msg = IncomingMessage::new("cli", "local-user", "hello");
        assert_eq!(msg.channel, "cli");
        assert_eq!(msg.content, "hello");
        assert!(msg.user_name.is_none());
        assert_eq!(msg.metadata, serde_json::json!({}));
    }

    #[test]
    fn outgoing_builders() {
        let plain = OutgoingResponse::text("hi");
        assert!(!plain.formatted);
        assert!(plain.expire_after.is_none());

        let rich = OutgoingResponse::formatted("*hi*").expiring(Some(Duration::from_secs(5)));
        assert!(rich.formatted);
        assert_eq!(rich.expire_after, Some(Duration::from_secs(5)));
    }
}
