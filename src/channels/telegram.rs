//! Telegram channel: long-polls the Bot API for updates.
//!
//! Edited messages are delivered like new ones, so a company that fixes a
//! typo in its parade state gets the corrected version stored.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::ChannelError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Long-poll timeout passed to getUpdates, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Back-off after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Telegram channel: connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: SecretString,
    allowed_users: Vec<String>,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        api_url(&self.bot_token, method)
    }

    /// The bot's own username, from `getMe`.
    pub async fn bot_username(&self) -> Result<String, ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            });
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ChannelError::Http(e.to_string()))?;
        get_me_username(&data).ok_or_else(|| ChannelError::StartupFailed {
            name: "telegram".into(),
            reason: "getMe reply has no username".into(),
        })
    }

    /// Send a text message, splitting at Telegram's length limit.
    /// Returns the id of the last chunk sent.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        formatted: bool,
    ) -> Result<Option<i64>, ChannelError> {
        let mut last_id = None;
        for chunk in split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH) {
            last_id = self.send_message_chunk(chat_id, &chunk, formatted).await?;
        }
        Ok(last_id)
    }

    /// Send one chunk. Formatted chunks try Markdown first and fall back to
    /// plain text, since names with `_` or `*` break Telegram's parser.
    async fn send_message_chunk(
        &self,
        chat_id: &str,
        text: &str,
        formatted: bool,
    ) -> Result<Option<i64>, ChannelError> {
        if formatted {
            let markdown_body = serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown"
            });

            let markdown_resp = self.post("sendMessage", &markdown_body).await?;
            if markdown_resp.status().is_success() {
                return Ok(message_id(markdown_resp).await);
            }

            let markdown_status = markdown_resp.status();
            tracing::warn!(
                status = ?markdown_status,
                "Telegram sendMessage with Markdown failed; retrying without parse_mode"
            );
        }

        let plain_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        let plain_resp = self.post("sendMessage", &plain_body).await?;

        if !plain_resp.status().is_success() {
            let status = plain_resp.status();
            let plain_err = plain_resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!("sendMessage failed ({status}): {plain_err}"),
            });
        }

        Ok(message_id(plain_resp).await)
    }

    async fn post(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ChannelError> {
        self.client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })
    }

    /// Delete a message after `delay` without blocking the caller.
    fn schedule_delete(&self, chat_id: &str, message_id: i64, delay: Duration) {
        let url = self.api_url("deleteMessage");
        let client = self.client.clone();
        let chat_id = chat_id.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let body = serde_json::json!({ "chat_id": chat_id, "message_id": message_id });
            match client.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(message_id, "Telegram acknowledgement deleted");
                }
                Ok(resp) => {
                    tracing::warn!(status = ?resp.status(), message_id, "Telegram deleteMessage rejected");
                }
                Err(e) => tracing::warn!(message_id, "Telegram deleteMessage failed: {e}"),
            }
        });
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let url = self.api_url("getUpdates");
        let allowed_users = self.allowed_users.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for messages...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message", "edited_message"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                let results = match poll_results(&data) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram getUpdates rejected: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64) {
                        offset = uid + 1;
                    }

                    let Some(incoming) = parse_update(update, &allowed_users) else {
                        continue;
                    };

                    if tx.send(incoming).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let chat_id = msg
            .metadata
            .get("chat_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: "No chat_id in message metadata".into(),
            })?;

        let sent = self
            .send_message(chat_id, &response.content, response.formatted)
            .await?;

        if let (Some(delay), Some(message_id)) = (response.expire_after, sent) {
            self.schedule_delete(chat_id, message_id, delay);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        self.bot_username().await.map(|_| ())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn api_url(token: &SecretString, method: &str) -> String {
    format!("https://api.telegram.org/bot{}/{method}", token.expose_secret())
}

/// The update list from a getUpdates reply.
///
/// Errors carry Telegram's `description` for replies with `"ok": false`
/// (bad token, another instance polling) or without a result array.
fn poll_results(data: &serde_json::Value) -> Result<&Vec<serde_json::Value>, String> {
    if data.get("ok").and_then(serde_json::Value::as_bool) != Some(true) {
        let code = data
            .get("error_code")
            .and_then(serde_json::Value::as_i64)
            .map_or_else(|| "?".to_string(), |c| c.to_string());
        let description = data
            .get("description")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("no description");
        return Err(format!("error {code}: {description}"));
    }
    data.get("result")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| "reply has no result array".to_string())
}

/// `result.username` from a getMe reply.
fn get_me_username(data: &serde_json::Value) -> Option<String> {
    data.get("result")?
        .get("username")?
        .as_str()
        .map(str::to_string)
}

/// `result.message_id` from a successful send, if present.
async fn message_id(resp: reqwest::Response) -> Option<i64> {
    let data: serde_json::Value = resp.json().await.ok()?;
    data.get("result")?.get("message_id")?.as_i64()
}

/// Turn one getUpdates entry into an `IncomingMessage`.
///
/// Returns `None` for non-text updates and for senders outside the allowlist.
fn parse_update(update: &serde_json::Value, allowed_users: &[String]) -> Option<IncomingMessage> {
    let message = update
        .get("message")
        .or_else(|| update.get("edited_message"))?;
    let text = message.get("text").and_then(serde_json::Value::as_str)?;

    let from = message.get("from");
    let username = from
        .and_then(|f| f.get("username"))
        .and_then(|u| u.as_str())
        .unwrap_or("unknown");
    let user_id_str = from
        .and_then(|f| f.get("id"))
        .and_then(serde_json::Value::as_i64)
        .map(|id| id.to_string());

    // Check allowlist against both username and numeric ID
    let mut identities = vec![username];
    if let Some(ref id) = user_id_str {
        identities.push(id.as_str());
    }
    if !check_user_allowed(allowed_users, identities.iter().copied()) {
        tracing::warn!(
            "Telegram: ignoring message from unauthorized user: \
             username={username}, user_id={}",
            user_id_str.as_deref().unwrap_or("unknown")
        );
        return None;
    }

    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)
        .map(|id| id.to_string())
        .unwrap_or_default();

    let first_name = from
        .and_then(|f| f.get("first_name"))
        .and_then(|n| n.as_str());

    let incoming = IncomingMessage::new(
        "telegram",
        user_id_str.as_deref().unwrap_or(username),
        text,
    )
    .with_metadata(serde_json::json!({
        "chat_id": chat_id,
        "username": username,
        "edited": update.get("edited_message").is_some(),
    }))
    .with_user_name(first_name.unwrap_or(username));

    Some(incoming)
}

/// Check if any identity in the iterator matches the allowed users list.
fn check_user_allowed<'a>(
    allowed_users: &[String],
    identities: impl IntoIterator<Item = &'a str>,
) -> bool {
    let ids: Vec<&str> = identities.into_iter().collect();
    allowed_users
        .iter()
        .any(|u| u == "*" || ids.contains(&u.as_str()))
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts on a char boundary.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut limit = max_len;
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }

        // Find a good split point
        let chunk = &remaining[..limit];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(limit);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { limit.max(1) } else { split_at };
        let split_at = if remaining.is_char_boundary(split_at) {
            split_at
        } else {
            limit
        };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────
