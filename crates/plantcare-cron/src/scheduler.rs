// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic reminder dispatch.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Timelike};
use futures::FutureExt;
use plantcare_agent::render::{Screen, render};
use plantcare_config::model::SchedulerConfig;
use plantcare_core::types::{Group, MessageRef, NewNotification, NotifyCursor, OutboundMessage};
use plantcare_core::{ChannelAdapter, Clock, PlantcareError, StorageAdapter};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::recording;

/// Pause before the second delivery attempt; later attempts wait linearly longer.
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The local send hour has not been reached yet.
    TooEarly,
    Ran(TickReport),
}

/// Counters for one processed page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
    /// Already reminded today; caught by the delivery-record check.
    pub skipped: usize,
}

enum Delivery {
    Sent(MessageRef),
    AlreadySent,
}

/// Progress through one day's due set.
///
/// The cursor moves past every group a tick handles, delivered or not, so
/// groups that keep failing cannot hold the front of the queue. When the
/// cursor runs off the end, the sweep wraps and retries what is still due.
#[derive(Debug, Default)]
struct Sweep {
    day: Option<NaiveDate>,
    after: Option<NotifyCursor>,
}

/// Sends watering reminders for due scenarios on a fixed period.
pub struct NotificationScheduler {
    storage: Arc<dyn StorageAdapter>,
    channel: Arc<dyn ChannelAdapter>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    retry_backoff: Duration,
    sweep: Mutex<Sweep>,
    stop: CancellationToken,
}

impl NotificationScheduler {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        channel: Arc<dyn ChannelAdapter>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            storage,
            channel,
            clock,
            config,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            sweep: Mutex::new(Sweep::default()),
            stop: CancellationToken::new(),
        }
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Ticks every `interval_secs` until [`stop`](Self::stop) is called.
    ///
    /// The first tick fires immediately. A failed tick is logged and the loop
    /// carries on; a tick in progress always runs to completion.
    pub async fn run(&self) {
        let period = Duration::from_secs(self.config.interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = period.as_secs(),
            limit = self.config.limit,
            send_hour = self.config.send_hour,
            utc_offset = %self.clock.utc_offset(),
            "notification scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(TickOutcome::TooEarly) => {}
                        Ok(TickOutcome::Ran(report)) if report.due > 0 => {
                            info!(
                                due = report.due,
                                sent = report.sent,
                                failed = report.failed,
                                skipped = report.skipped,
                                "reminder tick finished"
                            );
                        }
                        Ok(TickOutcome::Ran(_)) => debug!("no scenarios due"),
                        Err(e) => error!(error = %e, "reminder tick failed, will retry next tick"),
                    }
                }
            }
        }

        info!("notification scheduler stopped");
    }

    /// Requests the loop to exit after the current tick. Safe to call twice.
    pub fn stop(&self) {
        if !self.stop.is_cancelled() {
            debug!("stopping notification scheduler");
        }
        self.stop.cancel();
    }

    /// Token cancelled by [`stop`](Self::stop).
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Processes one page of due scenarios.
    ///
    /// Per-scenario failures are counted and logged without aborting the page.
    /// A panic anywhere in the page is caught and returned as
    /// [`PlantcareError::Panic`].
    ///
    /// The send hour and the reminder day are both read from the clock's
    /// local time.
    pub async fn tick(&self) -> Result<TickOutcome, PlantcareError> {
        let now = self.clock.local_now();
        if now.hour() < self.config.send_hour {
            debug!(%now, send_hour = self.config.send_hour, "before send hour, skipping tick");
            return Ok(TickOutcome::TooEarly);
        }

        let today = now.date_naive();
        AssertUnwindSafe(self.process_page(today))
            .catch_unwind()
            .await
            .map_err(|payload| PlantcareError::Panic(panic_message(payload.as_ref())))?
            .map(TickOutcome::Ran)
    }

    async fn process_page(&self, today: NaiveDate) -> Result<TickReport, PlantcareError> {
        let mut sweep = self.sweep.lock().await;
        if sweep.day != Some(today) {
            *sweep = Sweep {
                day: Some(today),
                after: None,
            };
        }

        let mut groups = self.due_groups(today, sweep.after).await?;
        if groups.is_empty() && sweep.after.is_some() {
            debug!(%today, "reached the end of the due set, wrapping");
            sweep.after = None;
            groups = self.due_groups(today, None).await?;
        }

        let mut report = TickReport {
            due: groups.len(),
            ..TickReport::default()
        };

        for group in &groups {
            sweep.after = Some(NotifyCursor::from(group));
            match self.notify(group, today).await {
                Ok(Delivery::Sent(sent)) => {
                    report.sent += 1;
                    recording::record_notification_sent();
                    info!(
                        group_id = group.id,
                        chat_id = sent.chat_id,
                        message_id = sent.message_id,
                        "watering reminder sent"
                    );
                }
                Ok(Delivery::AlreadySent) => {
                    report.skipped += 1;
                    debug!(group_id = group.id, "reminder already recorded today");
                }
                Err(e) => {
                    report.failed += 1;
                    recording::record_notification_failed(failure_reason(&e));
                    warn!(group_id = group.id, error = %e, "failed to deliver watering reminder");
                }
            }
        }

        Ok(report)
    }

    async fn due_groups(
        &self,
        today: NaiveDate,
        after: Option<NotifyCursor>,
    ) -> Result<Vec<Group>, PlantcareError> {
        self.storage
            .get_groups_for_notify(today, after, self.config.limit, self.config.offset)
            .await
    }

    async fn notify(&self, group: &Group, today: NaiveDate) -> Result<Delivery, PlantcareError> {
        if self.storage.notification_sent_on(group.id, today).await? {
            return Ok(Delivery::AlreadySent);
        }

        let owner = self
            .storage
            .get_user_by_id(group.user_id)
            .await?
            .ok_or_else(|| PlantcareError::not_found("user", group.user_id))?;
        let plants = self.storage.get_group_plants(group.id).await?;

        let message = render(
            &Screen::Reminder {
                group: group.clone(),
                plants,
            },
            owner.telegram_id,
            None,
        );
        let text = message.caption.clone();
        let sent = self.send_with_retry(message).await?;

        self.storage
            .save_notification(&NewNotification {
                group_id: group.id,
                message_id: sent.message_id,
                text,
                sent_at: self.clock.now(),
                sent_on: today,
            })
            .await?;

        Ok(Delivery::Sent(sent))
    }

    async fn send_with_retry(&self, message: OutboundMessage) -> Result<MessageRef, PlantcareError> {
        let attempts = self.config.send_attempts.max(1);
        let deadline = Duration::from_secs(self.config.dispatch_timeout_secs);
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(deadline, self.channel.send(message.clone())).await {
                Ok(result) => result,
                Err(_) => Err(PlantcareError::Timeout { duration: deadline }),
            };

            match result {
                Ok(sent) => return Ok(sent),
                Err(e) if attempt < attempts => {
                    warn!(
                        chat_id = message.chat_id,
                        attempt,
                        attempts,
                        error = %e,
                        "reminder delivery failed, retrying"
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn failure_reason(e: &PlantcareError) -> &'static str {
    match e {
        PlantcareError::Channel { .. } => "channel",
        PlantcareError::Timeout { .. } => "timeout",
        PlantcareError::Storage { .. } => "storage",
        PlantcareError::NotFound { .. } => "not_found",
        _ => "other",
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
