// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Range checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::PlantcareConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &PlantcareConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.database.path.trim().is_empty() {
        errors.push(ConfigError::validation("database.path must not be empty"));
    }

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if let Some(token) = &config.bot.token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "bot.token must not be empty when set",
        ));
    }

    if config.bot.intent_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "bot.intent_timeout_secs must be at least 1",
        ));
    }

    let scheduler = &config.scheduler;
    if scheduler.interval_secs == 0 {
        errors.push(ConfigError::validation(
            "scheduler.interval_secs must be at least 1",
        ));
    }
    if scheduler.limit == 0 {
        errors.push(ConfigError::validation("scheduler.limit must be at least 1"));
    }
    if scheduler.send_hour > 23 {
        errors.push(ConfigError::validation(format!(
            "scheduler.send_hour must be within 0..=23, got {}",
            scheduler.send_hour
        )));
    }
    if !(-12..=14).contains(&scheduler.utc_offset_hours) {
        errors.push(ConfigError::validation(format!(
            "scheduler.utc_offset_hours must be within -12..=14, got {}",
            scheduler.utc_offset_hours
        )));
    }
    if scheduler.dispatch_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "scheduler.dispatch_timeout_secs must be at least 1",
        ));
    }
    if scheduler.send_attempts == 0 {
        errors.push(ConfigError::validation(
            "scheduler.send_attempts must be at least 1",
        ));
    }

    if config.limits.groups_per_user == 0 {
        errors.push(ConfigError::validation(
            "limits.groups_per_user must be at least 1",
        ));
    }
    if config.limits.plants_per_group == 0 {
        errors.push(ConfigError::validation(
            "limits.plants_per_group must be at least 1",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &PlantcareConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&PlantcareConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = PlantcareConfig::default();
        config.database.path = "  ".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("database.path")));
    }

    #[test]
    fn send_hour_out_of_range() {
        let mut config = PlantcareConfig::default();
        config.scheduler.send_hour = 24;
        assert!(messages(&config).iter().any(|m| m.contains("send_hour")));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut config = PlantcareConfig::default();
        config.limits.groups_per_user = 0;
        config.limits.plants_per_group = 0;
        config.scheduler.limit = 0;
        let msgs = messages(&config);
        assert_eq!(msgs.len(), 3);
    }

    #[test]
    fn unknown_log_level() {
        let mut config = PlantcareConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("logging.level")));
    }

    #[test]
    fn utc_offset_bounds() {
        let mut config = PlantcareConfig::default();
        config.scheduler.utc_offset_hours = 14;
        assert!(validate_config(&config).is_ok());
        config.scheduler.utc_offset_hours = -13;
        assert!(messages(&config).iter().any(|m| m.contains("utc_offset_hours")));
    }
}
