// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./plantcare.toml` > `~/.config/plantcare/plantcare.toml` > `/etc/plantcare/plantcare.toml`
//! with environment variable overrides via `PLANTCARE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PlantcareConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plantcare/plantcare.toml` (system-wide)
/// 3. `~/.config/plantcare/plantcare.toml` (user XDG config)
/// 4. `./plantcare.toml` (local directory)
/// 5. `PLANTCARE_*` environment variables
pub fn load_config() -> Result<PlantcareConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PlantcareConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlantcareConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PlantcareConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlantcareConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PlantcareConfig::default()))
        .merge(Toml::file("/etc/plantcare/plantcare.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("plantcare/plantcare.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("plantcare.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PLANTCARE_SCHEDULER_SEND_HOUR` must map to
/// `scheduler.send_hour`, not `scheduler.send.hour`.
fn env_provider() -> Env {
    Env::prefixed("PLANTCARE_").map(|key| {
        let key_str = key.as_str();
        let mapped = ["bot", "database", "logging", "scheduler", "limits", "assets"]
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or_else(|| key_str.to_string());
        mapped.into()
    })
}
