// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end conversation testing.
//!
//! `TestHarness` assembles the dispatcher and the reminder scheduler over a
//! mock channel, a fixed clock and a temp SQLite database. Tests talk to it
//! the way a chat user would: send text or photos, press buttons, and read
//! back the last screen.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use plantcare_agent::{Dispatcher, UseCases};
use plantcare_config::model::{DatabaseConfig, LimitsConfig, SchedulerConfig};
use plantcare_core::types::{
    InboundEvent, Intent, MessageRef, OutboundMessage, Temporary, User, UserProfile,
};
use plantcare_core::{PlantcareError, StorageAdapter};
use plantcare_cron::{NotificationScheduler, TickOutcome};
use plantcare_storage::SqliteStorage;

use crate::clock::FixedClock;
use crate::mock_channel::MockChannel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    limits: LimitsConfig,
    scheduler: SchedulerConfig,
    now: DateTime<Utc>,
    date: Option<NaiveDate>,
    intent_timeout: Duration,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            limits: LimitsConfig::default(),
            scheduler: SchedulerConfig::default(),
            now: Utc::now(),
            date: None,
            intent_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn starting_at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self.date = None;
        self
    }

    /// Starts the clock at local noon on `date`.
    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_intent_timeout(mut self, timeout: Duration) -> Self {
        self.intent_timeout = timeout;
        self
    }

    /// Build the harness, creating a fresh database.
    pub async fn build(self) -> Result<TestHarness, PlantcareError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| PlantcareError::Storage { source: e.into() })?;
        let storage = SqliteStorage::new(DatabaseConfig {
            path: temp_dir.path().join("test.db").display().to_string(),
            ..DatabaseConfig::default()
        });
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let channel = Arc::new(MockChannel::new());
        let clock = Arc::new(
            FixedClock::at(self.now).with_utc_offset_hours(self.scheduler.utc_offset_hours),
        );
        if let Some(date) = self.date {
            clock.set_date(date);
        }

        let usecases = UseCases::new(storage.clone(), clock.clone(), self.limits);
        let dispatcher = Dispatcher::new(channel.clone(), usecases, self.intent_timeout);
        let scheduler =
            NotificationScheduler::new(storage.clone(), channel.clone(), clock.clone(), self.scheduler)
                .with_retry_backoff(Duration::ZERO);

        Ok(TestHarness {
            channel,
            storage,
            clock,
            dispatcher,
            scheduler,
            sequence: AtomicU64::new(0),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete bot with mock transport and temp storage.
pub struct TestHarness {
    /// The mock transport; inspect it for screens, deletions and popups.
    pub channel: Arc<MockChannel>,
    /// SQLite storage (temp DB, removed on drop).
    pub storage: Arc<SqliteStorage>,
    pub clock: Arc<FixedClock>,
    pub dispatcher: Dispatcher,
    pub scheduler: NotificationScheduler,
    sequence: AtomicU64,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Private-chat profile; the chat ID equals the Telegram ID.
    pub fn profile(telegram_id: i64) -> UserProfile {
        UserProfile {
            telegram_id,
            first_name: format!("User{telegram_id}"),
            last_name: None,
            username: Some(format!("user{telegram_id}")),
            is_bot: false,
        }
    }

    /// Sends a text message (including `/start` and `/help`).
    pub async fn send_text(&self, telegram_id: i64, text: &str) {
        self.dispatch(telegram_id, Intent::Text(text.to_string())).await;
    }

    pub async fn send_photo(&self, telegram_id: i64, bytes: Vec<u8>) {
        self.dispatch(telegram_id, Intent::Photo(bytes)).await;
    }

    /// Presses a button on the user's current screen and returns the popup
    /// text the callback was answered with. Fails if the screen does not
    /// offer `callback_data`.
    pub async fn press(
        &self,
        telegram_id: i64,
        callback_data: &str,
    ) -> Result<Option<String>, PlantcareError> {
        let screen = self.screen_ref(telegram_id).await.ok_or_else(|| {
            PlantcareError::Internal(format!("chat {telegram_id} has no screen to press on"))
        })?;
        self.press_on(telegram_id, screen.message_id, callback_data)
            .await
    }

    /// Presses a button on a specific message, e.g. an old reminder. The
    /// message's current keyboard must carry the button.
    pub async fn press_on(
        &self,
        telegram_id: i64,
        message_id: i32,
        callback_data: &str,
    ) -> Result<Option<String>, PlantcareError> {
        let target = MessageRef {
            chat_id: telegram_id,
            message_id,
        };
        let offered = self
            .channel
            .current_keyboard(target)
            .await
            .is_some_and(|keyboard| keyboard.buttons().any(|b| b.callback_data() == callback_data));
        if !offered {
            return Err(PlantcareError::Internal(format!(
                "message {message_id} in chat {telegram_id} has no {callback_data} button"
            )));
        }
        self.deliver_callback(telegram_id, Some(message_id), callback_data)
            .await
    }

    /// Delivers a callback the current screen does not offer, as a stale or
    /// forged button would.
    pub async fn press_unlisted(
        &self,
        telegram_id: i64,
        callback_data: &str,
    ) -> Result<Option<String>, PlantcareError> {
        let message_id = self
            .screen_ref(telegram_id)
            .await
            .map(|target| target.message_id);
        self.deliver_callback(telegram_id, message_id, callback_data)
            .await
    }

    /// The screen most recently sent to the user.
    pub async fn screen(&self, telegram_id: i64) -> Option<OutboundMessage> {
        self.channel
            .last_sent_to(telegram_id)
            .await
            .map(|(_, message)| message)
    }

    pub async fn screen_ref(&self, telegram_id: i64) -> Option<MessageRef> {
        self.channel
            .last_sent_to(telegram_id)
            .await
            .map(|(target, _)| target)
    }

    pub async fn user(&self, telegram_id: i64) -> Result<User, PlantcareError> {
        self.storage
            .get_user_by_telegram_id(telegram_id)
            .await?
            .ok_or_else(|| PlantcareError::not_found("user", telegram_id))
    }

    pub async fn temporary(&self, telegram_id: i64) -> Result<Temporary, PlantcareError> {
        let user = self.user(telegram_id).await?;
        self.storage
            .get_temporary_by_user_id(user.id)
            .await?
            .ok_or_else(|| PlantcareError::not_found("temporary", user.id))
    }

    /// Runs one scheduler tick at the current clock time.
    pub async fn tick(&self) -> Result<TickOutcome, PlantcareError> {
        self.scheduler.tick().await
    }

    async fn deliver_callback(
        &self,
        telegram_id: i64,
        message_id: Option<i32>,
        callback_data: &str,
    ) -> Result<Option<String>, PlantcareError> {
        let intent = Intent::from_callback_data(callback_data).ok_or_else(|| {
            PlantcareError::Internal(format!("malformed callback data: {callback_data}"))
        })?;
        let callback_id = format!("cb-{}", self.sequence.fetch_add(1, Ordering::SeqCst));

        self.dispatcher
            .dispatch(InboundEvent {
                sender: Self::profile(telegram_id),
                chat_id: telegram_id,
                message_id,
                callback_id: Some(callback_id.clone()),
                intent,
            })
            .await;

        self.channel
            .answer_for(&callback_id)
            .await
            .ok_or_else(|| PlantcareError::Internal(format!("callback {callback_id} was not answered")))
    }

    async fn dispatch(&self, telegram_id: i64, intent: Intent) {
        let message_id = Some(self.next_inbound_id());
        self.dispatcher
            .dispatch(InboundEvent {
                sender: Self::profile(telegram_id),
                chat_id: telegram_id,
                message_id,
                callback_id: None,
                intent,
            })
            .await;
    }

    fn next_inbound_id(&self) -> i32 {
        // Inbound user messages live below the mock channel's outbound IDs.
        (self.sequence.fetch_add(1, Ordering::SeqCst) % 900) as i32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantcare_core::{Clock, Step};

    #[tokio::test]
    async fn start_shows_menu_and_resets_wizard() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.send_text(7, "/start").await;

        let screen = harness.screen(7).await.expect("menu should be sent");
        assert!(!screen.keyboard.is_empty());
        assert_eq!(harness.temporary(7).await.unwrap().step, Step::Idle);
    }

    #[tokio::test]
    async fn harnesses_do_not_share_storage() {
        let h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();
        h1.send_text(7, "/start").await;

        assert!(h1.user(7).await.is_ok());
        assert!(h2.user(7).await.is_err());
    }

    #[tokio::test]
    async fn press_needs_a_screen() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert!(harness.press(7, "create_group").await.is_err());
    }

    #[tokio::test]
    async fn press_rejects_buttons_missing_from_the_screen() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.send_text(7, "/start").await;

        // The first menu only offers scenario creation.
        assert!(harness.press(7, "create_plant").await.is_err());
        assert!(harness.channel.answers().await.is_empty());

        let popup = harness.press_unlisted(7, "create_plant").await.unwrap();
        assert!(popup.is_some());
    }

    #[tokio::test]
    async fn press_unlisted_rejects_malformed_data() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.send_text(7, "/start").await;
        assert!(harness.press_unlisted(7, "no_such_button").await.is_err());
    }

    #[tokio::test]
    async fn on_date_starts_at_local_noon() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let harness = TestHarness::builder()
            .with_scheduler(SchedulerConfig {
                utc_offset_hours: -5,
                ..SchedulerConfig::default()
            })
            .on_date(date)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.clock.today(), date);
        assert_eq!(harness.clock.now().to_rfc3339(), "2024-06-10T17:00:00+00:00");
    }
}
