//! Configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::parade::classify::{ClassifierRule, MatchMode};
use crate::parade::group::Group;

/// Parsing and reporting rules.
///
/// Every field has a default so a rules file only needs to list what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParadeConfig {
    /// Unit name printed in the consolidated report header.
    pub unit_name: String,
    /// Lines containing any of these (case-insensitive) are dropped.
    pub site_markers: Vec<String>,
    /// How many raw lines the classifier inspects.
    pub classifier_depth: usize,
    /// Ordered marker table; first match wins.
    pub classifier_rules: Vec<ClassifierRule>,
    /// Whole-word rank tokens that set the category flag.
    pub rank_tokens: Vec<String>,
    /// Name substrings that force the category flag off.
    pub flag_overrides: Vec<String>,
    pub present_glyph: String,
    pub absent_glyph: String,
    /// Label for flagged personnel in report totals.
    pub flagged_label: String,
    /// Label for unflagged personnel in report totals.
    pub unflagged_label: String,
    /// Groups rendered with the name/glyph/remark policy.
    pub remark_groups: Vec<Group>,
}

impl Default for ParadeConfig {
    fn default() -> Self {
        let rule = |marker: &str, group| ClassifierRule {
            marker: marker.to_string(),
            group,
            mode: MatchMode::Contains,
        };

        Self {
            unit_name: "MBTC 2".to_string(),
            site_markers: vec!["kranji camp".to_string()],
            classifier_depth: 3,
            classifier_rules: vec![
                rule("hq parade", Group::Hq),
                rule("alpha parade", Group::Alpha),
                rule("a coy", Group::Alpha),
                rule("bravo parade", Group::Bravo),
                rule("b coy", Group::Bravo),
                rule("charlie parade", Group::Charlie),
                // "msc coy" contains "c coy", so MSC must be tried first.
                rule("msc parade", Group::Msc),
                rule("msc coy", Group::Msc),
                rule("c coy", Group::Charlie),
                rule("support coy", Group::Support),
                rule("support parade", Group::Support),
                rule("sp coy", Group::Support),
            ],
            rank_tokens: ["2LT", "3SG", "2SG", "1SG", "CFC", "CPL", "LCP", "PTE", "REC"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            flag_overrides: vec!["yong yuan".to_string()],
            present_glyph: "✅".to_string(),
            absent_glyph: "❌".to_string(),
            flagged_label: "NSFs".to_string(),
            unflagged_label: "Regulars".to_string(),
            remark_groups: vec![Group::Support],
        }
    }
}

impl ParadeConfig {
    /// Load rules from a JSON file, filling gaps with defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier_depth == 0 {
            return Err(invalid("classifier_depth", "must be at least 1"));
        }
        if self.present_glyph.is_empty() || self.absent_glyph.is_empty() {
            return Err(invalid("present_glyph/absent_glyph", "glyphs must not be empty"));
        }
        if self.present_glyph == self.absent_glyph {
            return Err(invalid("present_glyph/absent_glyph", "glyphs must differ"));
        }
        if let Some(rule) = self.classifier_rules.iter().find(|r| r.marker.trim().is_empty()) {
            return Err(invalid(
                "classifier_rules",
                &format!("empty marker for group {}", rule.group),
            ));
        }
        if self.site_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(invalid("site_markers", "markers must not be empty"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Singapore time (UTC+8).
const DEFAULT_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Process-level settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token. `None` runs the bot on the CLI only.
    pub telegram_token: Option<SecretString>,
    pub telegram_allowed_users: Vec<String>,
    /// The bot's own username; commands addressed to other bots are ignored.
    pub telegram_bot_username: Option<String>,
    /// Port for the liveness probe.
    pub health_port: u16,
    /// How long acknowledgements stay visible; `None` keeps them.
    pub ack_ttl: Option<Duration>,
    /// Six-field cron expression for the automatic daily reset.
    pub reset_cron: Option<String>,
    /// Local time offset used for report dates and the reset schedule.
    pub utc_offset: FixedOffset,
    /// Whether unrecognised messages get a hint reply.
    pub reply_unrecognized: bool,
    pub rules_file: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            telegram_allowed_users: vec!["*".to_string()],
            telegram_bot_username: None,
            health_port: 8000,
            ack_ttl: Some(Duration::from_secs(5)),
            reset_cron: None,
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or(Utc.fix()),
            reply_unrecognized: true,
            rules_file: None,
            log_dir: None,
        }
    }
}

impl BotConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let telegram_token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        let telegram_allowed_users: Vec<String> = lookup("TELEGRAM_ALLOWED_USERS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let telegram_bot_username = lookup("TELEGRAM_BOT_USERNAME")
            .map(|u| u.trim().trim_start_matches('@').to_string())
            .filter(|u| !u.is_empty());

        let health_port = match lookup("PARADE_HEALTH_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => parse_value("PARADE_HEALTH_PORT", &raw)?,
            None => defaults.health_port,
        };

        let ack_ttl = match lookup("PARADE_ACK_TTL_SECS") {
            Some(raw) => {
                let secs: u64 = parse_value("PARADE_ACK_TTL_SECS", &raw)?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => defaults.ack_ttl,
        };

        let reset_cron = lookup("PARADE_RESET_CRON").filter(|s| !s.trim().is_empty());

        let utc_offset = match lookup("PARADE_UTC_OFFSET_HOURS") {
            Some(raw) => {
                let hours: i32 = parse_value("PARADE_UTC_OFFSET_HOURS", &raw)?;
                hours
                    .checked_mul(3600)
                    .and_then(FixedOffset::east_opt)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: "PARADE_UTC_OFFSET_HOURS".to_string(),
                        message: format!("offset out of range: {hours}"),
                    })?
            }
            None => defaults.utc_offset,
        };

        let reply_unrecognized = match lookup("PARADE_REPLY_UNRECOGNIZED") {
            Some(raw) => parse_bool("PARADE_REPLY_UNRECOGNIZED", &raw)?,
            None => defaults.reply_unrecognized,
        };

        Ok(Self {
            telegram_token,
            telegram_allowed_users,
            telegram_bot_username,
            health_port,
            ack_ttl,
            reset_cron,
            utc_offset,
            reply_unrecognized,
            rules_file: lookup("PARADE_RULES_FILE").map(PathBuf::from),
            log_dir: lookup("PARADE_LOG_DIR").map(PathBuf::from),
        })
    }

    /// Rules from `rules_file`, or the built-in defaults.
    pub fn parade_config(&self) -> Result<ParadeConfig, ConfigError> {
        match self.rules_file {
            Some(ref path) => ParadeConfig::load(path),
            None => Ok(ParadeConfig::default()),
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
