// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Plantcare watering bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Plantcare configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlantcareConfig {
    /// Telegram bot settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// SQLite database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log level and destination.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Reminder scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Per-owner count limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Screen images and the default plant photo.
    #[serde(default)]
    pub assets: AssetsConfig,
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Telegram Bot API token. Required by `serve`.
    #[serde(default)]
    pub token: Option<String>,

    /// Long-poll timeout in seconds.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Deadline for handling a single inbound event, in seconds.
    #[serde(default = "default_intent_timeout_secs")]
    pub intent_timeout_secs: u64,

    /// How long shutdown waits for in-flight events, in seconds.
    #[serde(default = "default_shutdown_drain_secs")]
    pub shutdown_drain_secs: u64,

    /// Telegram user IDs or usernames allowed to use the bot. Empty allows everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            poll_timeout_secs: default_poll_timeout_secs(),
            intent_timeout_secs: default_intent_timeout_secs(),
            shutdown_drain_secs: default_shutdown_drain_secs(),
            allowed_users: Vec::new(),
        }
    }
}

fn default_poll_timeout_secs() -> u64 {
    10
}

fn default_intent_timeout_secs() -> u64 {
    30
}

fn default_shutdown_drain_secs() -> u64 {
    10
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long a statement waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("plantcare").join("plantcare.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "plantcare.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Reminder scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Tick period in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Page size of due groups handled per tick.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Rows skipped at the start of each page.
    #[serde(default)]
    pub offset: u32,

    /// Local hour (0-23) before which no reminders are sent.
    #[serde(default = "default_send_hour")]
    pub send_hour: u32,

    /// Offset of the owners' local time from UTC, in hours. Sets both the
    /// send-hour gate and the calendar day used for watering dates.
    #[serde(default)]
    pub utc_offset_hours: i32,

    /// Deadline for delivering a single reminder, in seconds.
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,

    /// Delivery attempts per reminder before giving up until the next tick.
    #[serde(default = "default_send_attempts")]
    pub send_attempts: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            limit: default_limit(),
            offset: 0,
            send_hour: default_send_hour(),
            utc_offset_hours: 0,
            dispatch_timeout_secs: default_dispatch_timeout_secs(),
            send_attempts: default_send_attempts(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_limit() -> u32 {
    10
}

fn default_send_hour() -> u32 {
    12
}

fn default_dispatch_timeout_secs() -> u64 {
    15
}

fn default_send_attempts() -> u32 {
    3
}

/// Per-owner count limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum watering scenarios per user.
    #[serde(default = "default_groups_per_user")]
    pub groups_per_user: u32,

    /// Maximum plants per watering scenario.
    #[serde(default = "default_plants_per_group")]
    pub plants_per_group: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            groups_per_user: default_groups_per_user(),
            plants_per_group: default_plants_per_group(),
        }
    }
}

fn default_groups_per_user() -> u32 {
    10
}

fn default_plants_per_group() -> u32 {
    50
}

/// Image assets.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssetsConfig {
    /// Directory with one `<screen>.jpg` per screen. Missing images fall back
    /// to caption-only messages.
    #[serde(default)]
    pub dir: Option<String>,

    /// Image shown for plants without a photo.
    #[serde(default)]
    pub default_plant_photo: Option<String>,
}
