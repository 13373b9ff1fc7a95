// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the chat transport (Telegram).

use async_trait::async_trait;

use crate::error::PlantcareError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundEvent, Keyboard, MessageRef, OutboundMessage};

/// Adapter for the chat transport the bot talks through.
///
/// The core never sees transport types: it consumes classified
/// [`InboundEvent`]s and emits rendered [`OutboundMessage`]s.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Starts receiving updates.
    async fn connect(&mut self) -> Result<(), PlantcareError>;

    /// Sends a message and returns its handle.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, PlantcareError>;

    /// Replaces the inline keyboard of a delivered message. An empty keyboard removes it.
    async fn edit_reply_markup(
        &self,
        target: MessageRef,
        keyboard: Keyboard,
    ) -> Result<MessageRef, PlantcareError>;

    /// Deletes a delivered message.
    async fn delete(&self, target: MessageRef) -> Result<(), PlantcareError>;

    /// Answers a button press. With `text`, shows it as a popup.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), PlantcareError>;

    /// Receives the next inbound event.
    async fn receive(&self) -> Result<InboundEvent, PlantcareError>;
}
