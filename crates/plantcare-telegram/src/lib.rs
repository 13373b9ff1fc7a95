// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for the Plantcare watering bot.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for messages and button presses, screen delivery as photo
//! plus caption plus inline keyboard, and the small set of follow-up calls
//! the wizard needs (edit keyboard, delete, answer callback).

pub mod handler;
pub mod keyboard;
pub mod media;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use plantcare_config::model::{AssetsConfig, BotConfig};
use plantcare_core::error::PlantcareError;
use plantcare_core::traits::{ChannelAdapter, PluginAdapter};
use plantcare_core::types::{
    AdapterType, HealthStatus, InboundEvent, Keyboard, MessageRef, OutboundMessage,
};
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, MessageId};
use teloxide::update_listeners::Polling;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::media::AssetCatalog;

fn channel_err(context: &'static str) -> impl FnOnce(teloxide::RequestError) -> PlantcareError {
    move |e| PlantcareError::Channel {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    config: BotConfig,
    assets: AssetCatalog,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `bot.token` to be set.
    pub fn new(config: BotConfig, assets: &AssetsConfig) -> Result<Self, PlantcareError> {
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| PlantcareError::Config("bot.token is required to serve".into()))?;

        if token.trim().is_empty() {
            return Err(PlantcareError::Config("bot.token cannot be empty".into()));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            config,
            assets: AssetCatalog::new(assets),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, PlantcareError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), PlantcareError> {
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        debug!("Telegram channel shut down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), PlantcareError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let allowed: Arc<Vec<String>> = Arc::new(self.config.allowed_users.clone());
        let poll_timeout = Duration::from_secs(self.config.poll_timeout_secs);

        let message_tx = self.inbound_tx.clone();
        let message_allowed = allowed.clone();
        let on_message = move |bot: Bot, msg: Message| {
            let tx = message_tx.clone();
            let allowed = message_allowed.clone();
            async move {
                if !handler::is_dm(&msg) {
                    debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                    return respond(());
                }
                if !handler::is_authorized(msg.from.as_ref(), &allowed) {
                    debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
                    return respond(());
                }

                match handler::message_intent(&bot, &msg).await {
                    Ok(Some(intent)) => {
                        if let Some(event) = handler::message_event(&msg, intent)
                            && tx.send(event).await.is_err()
                        {
                            warn!("inbound channel closed, dropping message");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => error!(error = %e, "failed to read message content"),
                }
                respond(())
            }
        };

        let callback_tx = self.inbound_tx.clone();
        let on_callback = move |bot: Bot, query: CallbackQuery| {
            let tx = callback_tx.clone();
            let allowed = allowed.clone();
            async move {
                if !handler::is_authorized(Some(&query.from), &allowed) {
                    debug!(user_id = query.from.id.0, "ignoring unauthorized button press");
                    return respond(());
                }
                match handler::callback_event(&query) {
                    Some(event) => {
                        if tx.send(event).await.is_err() {
                            warn!("inbound channel closed, dropping button press");
                        }
                    }
                    None => {
                        debug!(data = ?query.data, "ignoring unroutable button press");
                        // Stop the client-side spinner even for stale buttons.
                        if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
                            debug!(error = %e, "failed to answer stale callback");
                        }
                    }
                }
                respond(())
            }
        };

        info!(timeout_secs = poll_timeout.as_secs(), "starting Telegram long polling");
        if let Some(dir) = self.assets.dir() {
            debug!(dir = %dir.display(), "serving screen images");
        }

        let handle = tokio::spawn(async move {
            let handler = dptree::entry()
                .branch(Update::filter_message().endpoint(on_message))
                .branch(Update::filter_callback_query().endpoint(on_callback));

            let listener = Polling::builder(bot.clone()).timeout(poll_timeout).build();

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("Telegram update listener error"),
                )
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, PlantcareError> {
        let chat_id = ChatId(msg.chat_id);
        let markup = keyboard::to_inline_markup(&msg.keyboard);
        let with_keyboard = !msg.keyboard.is_empty();

        let sent = match self.assets.resolve(&msg.media) {
            Some(photo) => {
                let mut request = self.bot.send_photo(chat_id, photo).caption(msg.caption);
                if with_keyboard {
                    request = request.reply_markup(markup);
                }
                request.await.map_err(channel_err("failed to send photo"))?
            }
            None => {
                let mut request = self.bot.send_message(chat_id, msg.caption);
                if with_keyboard {
                    request = request.reply_markup(markup);
                }
                request.await.map_err(channel_err("failed to send message"))?
            }
        };

        Ok(MessageRef {
            chat_id: sent.chat.id.0,
            message_id: sent.id.0,
        })
    }

    async fn edit_reply_markup(
        &self,
        target: MessageRef,
        keyboard: Keyboard,
    ) -> Result<MessageRef, PlantcareError> {
        let mut request = self
            .bot
            .edit_message_reply_markup(ChatId(target.chat_id), MessageId(target.message_id));
        if !keyboard.is_empty() {
            request = request.reply_markup(keyboard::to_inline_markup(&keyboard));
        }

        match request.await {
            Ok(_) => Ok(target),
            Err(e) if e.to_string().contains("message is not modified") => Ok(target),
            Err(e) => Err(channel_err("failed to edit keyboard")(e)),
        }
    }

    async fn delete(&self, target: MessageRef) -> Result<(), PlantcareError> {
        self.bot
            .delete_message(ChatId(target.chat_id), MessageId(target.message_id))
            .await
            .map_err(channel_err("failed to delete message"))?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), PlantcareError> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(text) = text {
            request = request.text(text).show_alert(true);
        }
        request
            .await
            .map_err(channel_err("failed to answer callback"))?;
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, PlantcareError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| PlantcareError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }
}
