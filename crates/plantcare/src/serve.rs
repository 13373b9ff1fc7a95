// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plantcare serve` command implementation.
//!
//! Opens SQLite storage, connects the Telegram adapter, and runs the intent
//! loop alongside the reminder scheduler until SIGTERM or Ctrl+C. Shutdown
//! stops intake, drains in-flight intents, stops the scheduler after its
//! current tick, and checkpoints the database.

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use plantcare_agent::{AgentLoop, Dispatcher, UseCases, shutdown};
use plantcare_config::PlantcareConfig;
use plantcare_config::model::LoggingConfig;
use plantcare_core::{
    ChannelAdapter, Clock, HealthStatus, PlantcareError, PluginAdapter, StorageAdapter,
    SystemClock,
};
use plantcare_cron::NotificationScheduler;
use plantcare_storage::SqliteStorage;
use plantcare_telegram::TelegramChannel;
use tracing::{info, warn};

/// Runs the `plantcare serve` command.
pub async fn run_serve(config: PlantcareConfig) -> Result<(), PlantcareError> {
    init_tracing(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting plantcare serve");

    plantcare_agent::recording::register_metrics();
    plantcare_cron::recording::register_metrics();

    // Initialize storage.
    let storage = {
        let storage = SqliteStorage::new(config.database.clone());
        storage.initialize().await?;
        match storage.health_check().await? {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded(reason) => warn!(%reason, "storage degraded"),
            HealthStatus::Unhealthy(reason) => {
                return Err(PlantcareError::Internal(format!("storage unhealthy: {reason}")));
            }
        }
        info!(path = %config.database.path, "storage ready");
        Arc::new(storage)
    };

    // Connect the transport.
    let channel = {
        let mut channel = TelegramChannel::new(config.bot.clone(), &config.assets)?;
        channel.connect().await?;
        Arc::new(channel)
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::with_utc_offset_hours(
        config.scheduler.utc_offset_hours,
    ));
    let usecases = UseCases::new(storage.clone(), clock.clone(), config.limits.clone());
    let dispatcher = Arc::new(Dispatcher::new(
        channel.clone(),
        usecases,
        Duration::from_secs(config.bot.intent_timeout_secs),
    ));

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    // Spawn the reminder scheduler.
    let scheduler = Arc::new(NotificationScheduler::new(
        storage.clone(),
        channel.clone(),
        clock,
        config.scheduler.clone(),
    ));
    let scheduler_task = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run().await })
    };

    let agent_loop = AgentLoop::new(
        channel.clone(),
        dispatcher,
        Duration::from_secs(config.bot.shutdown_drain_secs),
    );
    let result = agent_loop.run(cancel.clone()).await;
    cancel.cancel();

    scheduler.stop();
    if let Err(e) = scheduler_task.await {
        warn!(error = %e, "scheduler task ended abnormally");
    }
    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "channel shutdown failed");
    }
    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage close failed");
    }

    info!("plantcare serve shutdown complete");
    result
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level`. With `logging.file_path` set, events
/// are appended to that file without ANSI colors.
fn init_tracing(logging: &LoggingConfig) -> Result<(), PlantcareError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&logging.level)));

    match &logging.file_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| PlantcareError::Config(format!("cannot open log file {path}: {e}")))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_names(false)
                .init();
        }
    }
    Ok(())
}

fn default_directives(level: &str) -> String {
    format!("plantcare={level},warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_scope_level_to_plantcare() {
        assert_eq!(default_directives("debug"), "plantcare=debug,warn");
    }

    #[test]
    fn unwritable_log_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let logging = LoggingConfig {
            level: "info".into(),
            file_path: Some(dir.path().join("missing").join("plantcare.log").display().to_string()),
        };
        let err = init_tracing(&logging).unwrap_err();
        assert!(matches!(err, PlantcareError::Config(_)));
    }
}
