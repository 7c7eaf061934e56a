use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use parade_bot::bot::{BotSettings, ParadeBot};
use parade_bot::channels::{ChannelManager, CliChannel, TelegramChannel};
use parade_bot::config::BotConfig;
use parade_bot::health::spawn_health_server;
use parade_bot::parade::ParadeStore;
use parade_bot::scheduler::{parse_schedule, spawn_daily_reset};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BotConfig::from_env().context("reading environment")?;

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_tracing(config.log_dir.as_deref())?;

    let parade_config = config.parade_config().context("loading parade rules")?;

    eprintln!("🪖 Parade State Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Unit: {}", parade_config.unit_name);
    eprintln!("   Health: http://0.0.0.0:{}/", config.health_port);
    if let Some(ref path) = config.rules_file {
        eprintln!("   Rules: {}", path.display());
    }

    // ── Health ──────────────────────────────────────────────────────────
    let _health_handle = spawn_health_server(config.health_port).await?;

    // ── Store + daily reset ─────────────────────────────────────────────
    let store = ParadeStore::new();

    match config.reset_cron {
        Some(ref expr) => {
            let schedule = parse_schedule(expr)?;
            let _reset_handle = spawn_daily_reset(store.clone(), schedule, config.utc_offset);
            eprintln!("   Auto reset: {} (UTC{})", expr, config.utc_offset);
        }
        None => eprintln!("   Auto reset: disabled (use /clear)"),
    }

    let mut settings = BotSettings::from(&config);

    // ── Channels ────────────────────────────────────────────────────────
    let mut channels = ChannelManager::new();
    channels.add(Box::new(CliChannel::new()));

    if let Some(ref token) = config.telegram_token {
        let allowed_users = &config.telegram_allowed_users;
        eprintln!(
            "   Telegram: enabled (allowed: {})",
            if allowed_users.iter().any(|u| u == "*") {
                "everyone".to_string()
            } else {
                allowed_users.join(", ")
            }
        );
        let telegram = TelegramChannel::new(token.clone(), allowed_users.clone());
        match telegram.bot_username().await {
            Ok(username) => {
                eprintln!("   Telegram bot: @{username}");
                settings.bot_username.get_or_insert(username);
            }
            Err(e) => tracing::warn!("Telegram getMe failed, polling anyway: {}", e),
        }
        channels.add(Box::new(telegram));
    } else {
        eprintln!("   Telegram: disabled (TELEGRAM_BOT_TOKEN not set)");
    }

    eprintln!("   Channels: {}\n", channels.names().join(", "));
    eprintln!("   Paste a parade state, end it with a blank line. /help for commands.\n");

    let bot = ParadeBot::new(&parade_config, settings, store);
    bot.run(channels).await?;

    Ok(())
}

/// Console logging filtered by `RUST_LOG` (default `info`), plus a daily
/// rolling file when `log_dir` is set.
fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log dir {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("parade-bot")
                .filename_suffix("log")
                .build(dir)
                .context("creating log file appender")?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(guard)
}
