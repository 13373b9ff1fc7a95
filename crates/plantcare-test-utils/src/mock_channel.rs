// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events
//! and records every outbound call for assertion in tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use plantcare_core::types::{
    AdapterType, HealthStatus, InboundEvent, Keyboard, MessageRef, OutboundMessage,
};
use plantcare_core::{ChannelAdapter, PlantcareError, PluginAdapter};

/// First message ID handed out by [`MockChannel::send`].
const FIRST_MESSAGE_ID: i32 = 1000;

/// A mock chat transport for testing.
///
/// - **inbound**: events injected via `inject_event()` are returned by `receive()`
/// - **sent / edits / deleted / answers**: every outbound call is captured
///
/// Sends can be made to fail (`fail_next_sends`, `block_chat`) or panic
/// (`panic_on_send`).
pub struct MockChannel {
    inbound: Mutex<VecDeque<InboundEvent>>,
    notify: Notify,
    sent: Mutex<Vec<(MessageRef, OutboundMessage)>>,
    edits: Mutex<Vec<(MessageRef, Keyboard)>>,
    deleted: Mutex<Vec<MessageRef>>,
    answers: Mutex<Vec<(String, Option<String>)>>,
    next_message_id: AtomicI32,
    failing_sends: AtomicU32,
    blocked_chats: Mutex<HashSet<i64>>,
    panic_on_send: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            inbound: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            sent: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            answers: Mutex::new(Vec::new()),
            next_message_id: AtomicI32::new(FIRST_MESSAGE_ID),
            failing_sends: AtomicU32::new(0),
            blocked_chats: Mutex::new(HashSet::new()),
            panic_on_send: AtomicBool::new(false),
        }
    }

    /// Queues an event for the next `receive()`.
    pub async fn inject_event(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// The next `n` calls to `send()` fail with a channel error.
    pub fn fail_next_sends(&self, n: u32) {
        self.failing_sends.store(n, Ordering::SeqCst);
    }

    /// Every send to `chat_id` fails, as when the user has blocked the bot.
    pub async fn block_chat(&self, chat_id: i64) {
        self.blocked_chats.lock().await.insert(chat_id);
    }

    pub fn panic_on_send(&self, enabled: bool) {
        self.panic_on_send.store(enabled, Ordering::SeqCst);
    }

    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.iter().map(|(_, m)| m.clone()).collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Last message sent to `chat_id`, with the handle it was delivered under.
    pub async fn last_sent_to(&self, chat_id: i64) -> Option<(MessageRef, OutboundMessage)> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|(target, _)| target.chat_id == chat_id)
            .cloned()
    }

    /// Keyboard currently attached to `target`: the latest markup edit, or
    /// the keyboard it was sent with. `None` for messages this channel never
    /// sent.
    pub async fn current_keyboard(&self, target: MessageRef) -> Option<Keyboard> {
        let edited = self
            .edits
            .lock()
            .await
            .iter()
            .rev()
            .find(|(edited, _)| *edited == target)
            .map(|(_, keyboard)| keyboard.clone());
        if edited.is_some() {
            return edited;
        }
        self.sent
            .lock()
            .await
            .iter()
            .find(|(sent, _)| *sent == target)
            .map(|(_, msg)| msg.keyboard.clone())
    }

    pub async fn edits(&self) -> Vec<(MessageRef, Keyboard)> {
        self.edits.lock().await.clone()
    }

    pub async fn deleted(&self) -> Vec<MessageRef> {
        self.deleted.lock().await.clone()
    }

    pub async fn was_deleted(&self, target: MessageRef) -> bool {
        self.deleted.lock().await.contains(&target)
    }

    /// Callback answers as `(callback_id, popup_text)`.
    pub async fn answers(&self) -> Vec<(String, Option<String>)> {
        self.answers.lock().await.clone()
    }

    pub async fn answer_for(&self, callback_id: &str) -> Option<Option<String>> {
        self.answers
            .lock()
            .await
            .iter()
            .find(|(id, _)| id == callback_id)
            .map(|(_, text)| text.clone())
    }

    /// Forgets all recorded outbound calls.
    pub async fn clear(&self) {
        self.sent.lock().await.clear();
        self.edits.lock().await.clear();
        self.deleted.lock().await.clear();
        self.answers.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, PlantcareError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PlantcareError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), PlantcareError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, PlantcareError> {
        if self.panic_on_send.load(Ordering::SeqCst) {
            panic!("mock channel send panicked");
        }
        let failing = self
            .failing_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(PlantcareError::Channel {
                message: "injected send failure".into(),
                source: None,
            });
        }
        if self.blocked_chats.lock().await.contains(&msg.chat_id) {
            return Err(PlantcareError::Channel {
                message: format!("bot was blocked by chat {}", msg.chat_id),
                source: None,
            });
        }

        let target = MessageRef {
            chat_id: msg.chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
        };
        self.sent.lock().await.push((target, msg));
        Ok(target)
    }

    async fn edit_reply_markup(
        &self,
        target: MessageRef,
        keyboard: Keyboard,
    ) -> Result<MessageRef, PlantcareError> {
        self.edits.lock().await.push((target, keyboard));
        Ok(target)
    }

    async fn delete(&self, target: MessageRef) -> Result<(), PlantcareError> {
        self.deleted.lock().await.push(target);
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), PlantcareError> {
        self.answers
            .lock()
            .await
            .push((callback_id.to_string(), text.map(str::to_string)));
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, PlantcareError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use plantcare_core::types::{Button, ButtonKind, Intent, Media, UserProfile};

    fn event(text: &str) -> InboundEvent {
        InboundEvent {
            sender: UserProfile {
                telegram_id: 7,
                first_name: "Test".into(),
                last_name: None,
                username: None,
                is_bot: false,
            },
            chat_id: 7,
            message_id: Some(1),
            callback_id: None,
            intent: Intent::Text(text.into()),
        }
    }

    fn outbound(chat_id: i64, caption: &str) -> OutboundMessage {
        OutboundMessage {
            chat_id,
            media: Media::None,
            caption: caption.into(),
            keyboard: Keyboard::new(),
        }
    }

    #[tokio::test]
    async fn receive_returns_injected_events_in_order() {
        let channel = MockChannel::new();
        channel.inject_event(event("first")).await;
        channel.inject_event(event("second")).await;

        assert_eq!(channel.receive().await.unwrap().intent, Intent::Text("first".into()));
        assert_eq!(channel.receive().await.unwrap().intent, Intent::Text("second".into()));
    }

    #[tokio::test]
    async fn receive_waits_for_injection() {
        let channel = Arc::new(MockChannel::new());
        let injector = channel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            injector.inject_event(event("delayed")).await;
        });

        let received = tokio::time::timeout(Duration::from_secs(2), channel.receive())
            .await
            .expect("receive timed out")
            .unwrap();
        assert_eq!(received.intent, Intent::Text("delayed".into()));
    }

    #[tokio::test]
    async fn send_assigns_increasing_ids() {
        let channel = MockChannel::new();
        let a = channel.send(outbound(1, "a")).await.unwrap();
        let b = channel.send(outbound(2, "b")).await.unwrap();
        assert!(b.message_id > a.message_id);

        let (target, msg) = channel.last_sent_to(1).await.unwrap();
        assert_eq!(target, a);
        assert_eq!(msg.caption, "a");
        assert_eq!(channel.sent_count().await, 2);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let channel = MockChannel::new();
        channel.fail_next_sends(1);
        assert!(channel.send(outbound(1, "x")).await.is_err());
        assert!(channel.send(outbound(1, "x")).await.is_ok());
        assert_eq!(channel.sent_count().await, 1);
    }

    #[tokio::test]
    async fn blocked_chat_rejects_every_send() {
        let channel = MockChannel::new();
        channel.block_chat(1).await;
        assert!(channel.send(outbound(1, "x")).await.is_err());
        assert!(channel.send(outbound(1, "y")).await.is_err());
        assert!(channel.send(outbound(2, "z")).await.is_ok());
        assert_eq!(channel.sent_count().await, 1);
    }

    #[tokio::test]
    async fn current_keyboard_follows_markup_edits() {
        let channel = MockChannel::new();
        let mut msg = outbound(1, "reminder");
        msg.keyboard = Keyboard::new().row(vec![Button::with_data("ok", ButtonKind::Watered, 3)]);
        let target = channel.send(msg).await.unwrap();
        assert!(channel.current_keyboard(target).await.unwrap().find(ButtonKind::Watered).is_some());

        channel.edit_reply_markup(target, Keyboard::new()).await.unwrap();
        assert!(channel.current_keyboard(target).await.unwrap().is_empty());

        let unknown = MessageRef {
            chat_id: 1,
            message_id: 1,
        };
        assert!(channel.current_keyboard(unknown).await.is_none());
    }

    #[tokio::test]
    async fn edits_deletes_and_answers_are_recorded() {
        let channel = MockChannel::new();
        let target = MessageRef {
            chat_id: 1,
            message_id: 5,
        };
        channel.edit_reply_markup(target, Keyboard::new()).await.unwrap();
        channel.delete(target).await.unwrap();
        channel.answer_callback("cb", Some("done")).await.unwrap();

        assert_eq!(channel.edits().await.len(), 1);
        assert!(channel.was_deleted(target).await);
        assert_eq!(channel.answer_for("cb").await, Some(Some("done".into())));

        channel.clear().await;
        assert!(channel.deleted().await.is_empty());
        assert!(channel.answers().await.is_empty());
    }
}
