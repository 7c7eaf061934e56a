//! The parade bot: dispatches inbound messages against the parade store.

pub mod command;

pub use command::Command;

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate};
use futures::StreamExt;

use crate::channels::{ChannelManager, IncomingMessage, OutgoingResponse};
use crate::config::{BotConfig, ParadeConfig};
use crate::error::Result;
use crate::parade::{Group, Markup, ParadeParser, ParadeStore, ReportAggregator};

const CLEARED_REPLY: &str = "Data cleared for new day. 🧹";

/// Behaviour knobs for the bot, taken from `BotConfig`.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Delete save acknowledgements after this long.
    pub ack_ttl: Option<Duration>,
    /// Reply to messages that match no group.
    pub reply_unrecognized: bool,
    /// Offset used to decide which day a report belongs to.
    pub utc_offset: FixedOffset,
    /// This bot's username, for `/cmd@BotName` addressing.
    pub bot_username: Option<String>,
}

impl From<&BotConfig> for BotSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            ack_ttl: config.ack_ttl,
            reply_unrecognized: config.reply_unrecognized,
            utc_offset: config.utc_offset,
            bot_username: config.telegram_bot_username.clone(),
        }
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self::from(&BotConfig::default())
    }
}

pub struct ParadeBot {
    parser: ParadeParser,
    aggregator: ReportAggregator,
    store: Arc<ParadeStore>,
    settings: BotSettings,
}

impl ParadeBot {
    pub fn new(config: &ParadeConfig, settings: BotSettings, store: Arc<ParadeStore>) -> Self {
        Self {
            parser: ParadeParser::new(config),
            aggregator: ReportAggregator::new(config, Markup::Markdown),
            store,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<ParadeStore> {
        &self.store
    }

    /// Run until Ctrl+C or until every channel stream ends.
    pub async fn run(&self, channels: ChannelManager) -> Result<()> {
        let mut message_stream = channels.start_all().await?;

        tracing::info!(channels = ?channels.names(), "Parade bot ready and listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            if let Some(response) = self.handle_message(&message).await {
                if let Err(e) = channels.respond(&message, response).await {
                    tracing::error!(channel = %message.channel, "Failed to send reply: {}", e);
                }
            }
        }

        channels.shutdown_all().await?;
        Ok(())
    }

    /// Handle one message and return the reply, if any.
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Option<OutgoingResponse> {
        let command = Command::parse(&msg.content, self.settings.bot_username.as_deref());
        tracing::debug!(
            channel = %msg.channel,
            user = %msg.user_id,
            ?command,
            "Handling message"
        );

        match command {
            Command::Print => {
                let snapshot = self.store.snapshot().await;
                let date = self.local_date(msg);
                Some(OutgoingResponse::formatted(
                    self.aggregator.render(&snapshot, date),
                ))
            }
            Command::Status => {
                let submitted = self.store.submitted().await;
                Some(OutgoingResponse::formatted(
                    self.aggregator.render_status(&submitted),
                ))
            }
            Command::Clear => {
                self.store.reset().await;
                tracing::info!(user = %msg.user_id, "Parade state cleared by command");
                Some(OutgoingResponse::text(CLEARED_REPLY))
            }
            Command::Help => Some(OutgoingResponse::text(help_text())),
            Command::Unknown(name) => {
                tracing::debug!(command = %name, "Ignoring unknown command");
                None
            }
            Command::OtherBot(target) => {
                tracing::debug!(%target, "Ignoring command addressed to another bot");
                None
            }
            Command::ParadeState(text) => self.handle_parade_state(msg, &text).await,
        }
    }

    async fn handle_parade_state(
        &self,
        msg: &IncomingMessage,
        text: &str,
    ) -> Option<OutgoingResponse> {
        if text.trim().is_empty() {
            return None;
        }

        let Some((group, report)) = self.parser.parse(text) else {
            tracing::info!(user = %msg.user_id, "Message matched no group");
            return self
                .settings
                .reply_unrecognized
                .then(|| OutgoingResponse::text(unrecognized_text()));
        };

        let total = report.total();
        let present = report.present();
        let replaced = self.store.upsert(group, report).await;
        tracing::info!(
            %group,
            present,
            total,
            replaced,
            user = %msg.user_id,
            "Parade state saved"
        );

        Some(
            OutgoingResponse::text(format!("✅ {group} Parade State saved."))
                .expiring(self.settings.ack_ttl),
        )
    }

    /// The calendar day the message was received on, in the unit's time zone.
    fn local_date(&self, msg: &IncomingMessage) -> NaiveDate {
        msg.received_at
            .with_timezone(&self.settings.utc_offset)
            .date_naive()
    }
}

fn help_text() -> String {
    let mut text = String::from(
        "Send your company's parade state here and I will keep the latest one per company.\n\n\
         /print - consolidated parade state\n\
         /status - which companies have submitted\n\
         /clear - clear all data for a new day\n\
         /help - this message",
    );
    text.push_str("\n\nRecognised headers: ");
    text.push_str(&group_headers());
    text
}

fn unrecognized_text() -> String {
    format!(
        "Parade state not recognised, use one of: {}",
        group_headers()
    )
}

fn group_headers() -> String {
    Group::ALL
        .iter()
        .map(|g| format!("{g} Parade State"))
        .collect::<Vec<_>>()
        .join(", ")
}
