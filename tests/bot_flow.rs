//! End-to-end tests for the parade bot: messages in, replies out.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::stream;
use tokio::time::timeout;

use parade_bot::bot::{BotSettings, ParadeBot};
use parade_bot::channels::{
    Channel, ChannelManager, IncomingMessage, MessageStream, OutgoingResponse,
};
use parade_bot::config::ParadeConfig;
use parade_bot::error::ChannelError;
use parade_bot::parade::{Group, ParadeStore, Status};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const HQ_STATE: &str = "HQ Parade State\n\
    16 Oct 26\n\
    Kranji Camp II\n\
    \n\
    1. PTE Tan ✅\n\
    2. ME1 Goh ❌ (MC)\n\
    3. ME2 Lim ✅\n\
    \n\
    Attached Personnel\n\
    1. CPL Ong ✅\n";

const SUPPORT_STATE: &str = "Support Coy Parade State\n\
    16 Oct 26\n\
    1. ME1 Chua ✅\n\
    2. LCP Lee ❌ (MC)\n";

fn bot() -> ParadeBot {
    ParadeBot::new(
        &ParadeConfig::default(),
        BotSettings::default(),
        ParadeStore::new(),
    )
}

/// A message received at 09:00 on 16 Oct 2026, Singapore time.
fn message(text: &str) -> IncomingMessage {
    let mut msg = IncomingMessage::new("telegram", "42", text);
    msg.received_at = Utc.with_ymd_and_hms(2026, 10, 16, 1, 0, 0).unwrap();
    msg
}

async fn reply(bot: &ParadeBot, text: &str) -> OutgoingResponse {
    bot.handle_message(&message(text))
        .await
        .expect("expected a reply")
}

// ── Direct dispatch ─────────────────────────────────────────────────

#[tokio::test]
async fn submission_is_acknowledged_and_stored() {
    let bot = bot();

    let ack = reply(&bot, HQ_STATE).await;
    assert_eq!(ack.content, "✅ HQ Parade State saved.");
    assert_eq!(ack.expire_after, Some(Duration::from_secs(5)));

    let snapshot = bot.store().snapshot().await;
    let hq = snapshot.get(Group::Hq).unwrap();
    assert_eq!(hq.total(), 3);
    assert_eq!(hq.present(), 2);
    assert_eq!(hq.attached.len(), 1);
    assert_eq!(hq.personnel[1].status(), Status::Absent);
}

#[tokio::test]
async fn print_renders_consolidated_report() {
    let bot = bot();
    reply(&bot, HQ_STATE).await;
    reply(&bot, SUPPORT_STATE).await;

    let report = reply(&bot, "/print").await;
    assert!(report.formatted);

    let text = report.content;
    assert!(text.starts_with("MBTC 2 Strength CAA 16 october 2026\n"));
    assert!(text.contains("Total Strength - 5 (3 Regulars / 2 NSFs)"));
    assert!(text.contains("HQ - 2/1\n"));
    assert!(text.contains("SP - 1/1\n"));
    assert!(text.contains("Alpha - 0/0\n"));
    assert!(text.contains("*HQ Parade State for 16 october 2026*"));
    assert!(text.contains("*Support Parade State for 16 october 2026*"));
    assert!(text.contains("2. Lee ❌ (MC)\n"));
    assert!(text.contains("Attached Personnel\n1. CPL Ong ✅\n"));
}

#[tokio::test]
async fn report_alias_and_bot_suffix() {
    let bot = bot();
    let a = reply(&bot, "/report").await;
    let b = reply(&bot, "/print@ParadeStateBot").await;
    assert_eq!(a.content, b.content);
}

#[tokio::test]
async fn status_tracks_submissions() {
    let bot = bot();
    reply(&bot, SUPPORT_STATE).await;

    let status = reply(&bot, "/status").await;
    assert_eq!(
        status.content,
        "📊 *Submission Status:*\n❌ HQ\n❌ Alpha\n❌ Bravo\n❌ Charlie\n❌ MSC\n✅ Support\n"
    );
}

#[tokio::test]
async fn clear_resets_every_group() {
    let bot = bot();
    reply(&bot, HQ_STATE).await;
    reply(&bot, SUPPORT_STATE).await;

    let cleared = reply(&bot, "/clear").await;
    assert_eq!(cleared.content, "Data cleared for new day. 🧹");
    assert_eq!(bot.store().snapshot().await.submitted().count(), 0);

    reply(&bot, HQ_STATE).await;
    reply(&bot, "/reset").await;
    assert_eq!(bot.store().snapshot().await.submitted().count(), 0);
}

#[tokio::test]
async fn unrecognised_message_leaves_store_untouched() {
    let bot = bot();
    reply(&bot, HQ_STATE).await;
    let before = bot.store().snapshot().await;

    let hint = reply(&bot, "Good morning all\n1. PTE Tan ✅").await;
    assert!(hint.content.starts_with("Parade state not recognised"));
    assert!(hint.content.contains("MSC Parade State"));

    assert_eq!(bot.store().snapshot().await, before);
}

#[tokio::test]
async fn resubmission_replaces_previous_state() {
    let bot = bot();
    reply(&bot, HQ_STATE).await;
    reply(&bot, "HQ Parade State\n1. PTE Tan ❌ (RSO)").await;

    let snapshot = bot.store().snapshot().await;
    let hq = snapshot.get(Group::Hq).unwrap();
    assert_eq!(hq.total(), 1);
    assert_eq!(hq.present(), 0);
    assert!(hq.attached.is_empty());
}

#[tokio::test]
async fn identical_resubmission_is_idempotent() {
    let bot = bot();
    reply(&bot, HQ_STATE).await;
    let first = bot.store().snapshot().await;
    reply(&bot, HQ_STATE).await;
    assert_eq!(bot.store().snapshot().await, first);
}

#[tokio::test]
async fn ack_ttl_can_be_disabled() {
    let settings = BotSettings {
        ack_ttl: None,
        ..BotSettings::default()
    };
    let bot = ParadeBot::new(&ParadeConfig::default(), settings, ParadeStore::new());
    let ack = reply(&bot, HQ_STATE).await;
    assert!(ack.expire_after.is_none());
}

// ── Full run loop ───────────────────────────────────────────────────

/// Emits a fixed conversation, then ends; records every reply.
struct ScriptedChannel {
    inbox: Vec<&'static str>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Channel for ScriptedChannel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let msgs: Vec<IncomingMessage> = self
            .inbox
            .iter()
            .map(|text| IncomingMessage::new("scripted", "tester", text))
            .collect();
        Ok(Box::pin(stream::iter(msgs)))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(response.content);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

#[tokio::test]
async fn run_loop_replies_in_order_and_stops_when_streams_end() {
    timeout(TEST_TIMEOUT, async {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut channels = ChannelManager::new();
        channels.add(Box::new(ScriptedChannel {
            inbox: vec![HQ_STATE, "/status", "hello there", "/clear", "/status"],
            sent: Arc::clone(&sent),
        }));

        let bot = bot();
        bot.run(channels).await.unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 5);
        assert_eq!(sent[0], "✅ HQ Parade State saved.");
        assert!(sent[1].contains("✅ HQ\n"));
        assert!(sent[2].starts_with("Parade state not recognised"));
        assert_eq!(sent[3], "Data cleared for new day. 🧹");
        assert!(sent[4].contains("❌ HQ\n"));
    })
    .await
    .expect("test timed out");
}
