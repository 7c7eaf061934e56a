//! CLI channel: stdin/stdout REPL for local testing.
//!
//! Parade states span several lines, so input is buffered until a blank
//! line (or EOF). A `/command` typed on an empty buffer is sent at once.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::ChannelError;

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates stdin lines into whole messages.
#[derive(Debug, Default)]
struct LineBuffer {
    lines: Vec<String>,
}

impl LineBuffer {
    /// Feed one line; returns a finished message when one is complete.
    fn push(&mut self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return self.flush();
        }
        if self.lines.is_empty() && trimmed.starts_with('/') {
            return Some(trimmed.to_string());
        }
        self.lines.push(line.trim_end().to_string());
        None
    }

    fn flush(&mut self) -> Option<String> {
        if self.lines.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.lines).join("\n"))
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();
            let mut buffer = LineBuffer::default();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(text) = buffer.push(&line) {
                            let msg = IncomingMessage::new("cli", "local-user", &text);
                            if tx.send(msg).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        if let Some(text) = buffer.flush() {
                            let _ = tx.send(IncomingMessage::new("cli", "local-user", &text));
                        }
                        break;
                    }
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        println!("\n{}\n", response.content);
        eprint!("> ");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
