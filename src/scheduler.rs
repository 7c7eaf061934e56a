//! Automatic daily reset of the parade store.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use cron::Schedule;

use crate::error::ConfigError;
use crate::parade::ParadeStore;

/// Parse a cron expression (six or seven fields, seconds first).
pub fn parse_schedule(expr: &str) -> Result<Schedule, ConfigError> {
    Schedule::from_str(expr).map_err(|e| ConfigError::InvalidValue {
        key: "PARADE_RESET_CRON".to_string(),
        message: format!("invalid cron: {e}"),
    })
}

/// The first fire time strictly after `after`, in that time's offset.
pub fn next_reset_after(
    schedule: &Schedule,
    after: DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    schedule.after(&after).next()
}

/// Spawn a task that resets `store` every time `schedule` fires.
///
/// The schedule is evaluated in `offset`, so `0 0 0 * * *` means local
/// midnight. The task ends if the schedule has no further fire times.
pub fn spawn_daily_reset(
    store: Arc<ParadeStore>,
    schedule: Schedule,
    offset: FixedOffset,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now().with_timezone(&offset);
            let Some(next) = next_reset_after(&schedule, now) else {
                tracing::warn!("Reset schedule has no upcoming fire time; stopping");
                return;
            };

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tracing::info!(next = %next, "Next automatic parade reset scheduled");
            tokio::time::sleep(wait).await;

            store.reset().await;
            tracing::info!("Automatic parade reset done");
        }
    })
}
