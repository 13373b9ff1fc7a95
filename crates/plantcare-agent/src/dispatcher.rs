// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent dispatcher.
//!
//! Resolves an inbound event in a fixed order: commands (`/start`, `/help`),
//! then fixed buttons (menu, back, watered), then the wizard table for the
//! user's current step. Unmatched intents delete the offending message.
//!
//! A transition sends the next screen first and then persists the step
//! together with the new message ID. If persisting fails the screen is
//! deleted again, so the chat never shows a screen the backend does not
//! know about.

use std::sync::Arc;
use std::time::{Duration, Instant};

use plantcare_core::types::{
    ButtonKind, InboundEvent, Intent, Keyboard, MessageRef, OutboundMessage, Staged, Step,
    Temporary, User,
};
use plantcare_core::{ChannelAdapter, PlantcareError};
use tracing::{debug, error, warn};

use crate::flows::{self, Outcome, Transition, staged_group, staged_plant};
use crate::locks::UserLocks;
use crate::recording;
use crate::render::{Screen, format_date, render};
use crate::usecases::UseCases;
use crate::wizard::{self, View};

/// Fixed chat commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

impl Command {
    /// Parses `/start`, `/start@my_bot` or `/start payload`.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            _ => None,
        }
    }
}

/// Routes inbound events through the wizard and answers on the channel.
pub struct Dispatcher {
    channel: Arc<dyn ChannelAdapter>,
    usecases: UseCases,
    locks: UserLocks,
    intent_timeout: Duration,
}

impl Dispatcher {
    pub fn new(channel: Arc<dyn ChannelAdapter>, usecases: UseCases, intent_timeout: Duration) -> Self {
        Self {
            channel,
            usecases,
            locks: UserLocks::new(),
            intent_timeout,
        }
    }

    pub fn usecases(&self) -> &UseCases {
        &self.usecases
    }

    /// Handles one inbound event end to end.
    ///
    /// Never fails: user-facing errors are shown in chat, everything else is
    /// logged. Events of one user are handled one at a time.
    pub async fn dispatch(&self, event: InboundEvent) {
        let started = Instant::now();
        let kind: &'static str = event.intent.kind().into();
        let telegram_id = event.sender.telegram_id;

        let guard = self.locks.acquire(telegram_id).await;
        let result = match tokio::time::timeout(self.intent_timeout, self.process(&event)).await {
            Ok(result) => result,
            Err(_) => Err(PlantcareError::Timeout {
                duration: self.intent_timeout,
            }),
        };
        let (outcome, popup) = match result {
            Ok(popup) => ("ok", popup),
            Err(e) => self.surface(&event, e).await,
        };

        if let Some(callback_id) = &event.callback_id
            && let Err(e) = self
                .channel
                .answer_callback(callback_id, popup.as_deref())
                .await
        {
            debug!(error = %e, telegram_id, "failed to answer callback");
        }
        drop(guard);
        self.locks.release_idle(telegram_id);

        recording::record_intent(kind, outcome);
        recording::record_intent_duration(started.elapsed().as_secs_f64());
    }

    /// Returns popup text for the button press, if any.
    async fn process(&self, event: &InboundEvent) -> Result<Option<String>, PlantcareError> {
        let user = self.usecases.save_user(&event.sender).await?;

        if let Intent::Text(text) = &event.intent
            && let Some(command) = Command::parse(text)
        {
            self.command(event, &user, command).await?;
            return Ok(None);
        }

        if let Intent::Button {
            kind: ButtonKind::Watered,
            data,
        } = &event.intent
        {
            return self.watered(event, &user, data.as_deref()).await;
        }

        let temp = self.usecases.temporary(user.id).await?;

        if let Intent::Button { kind, .. } = &event.intent {
            match kind {
                ButtonKind::Menu => {
                    self.show(event, &temp, Transition::idle(View::Menu)).await?;
                    return Ok(None);
                }
                ButtonKind::Back => {
                    let target = wizard::back(temp.step, &temp.staged);
                    let transition = Transition {
                        step: target.step,
                        staged: target.staged,
                        view: target.view,
                        notice: None,
                    };
                    self.show(event, &temp, transition).await?;
                    return Ok(None);
                }
                _ => {}
            }
        }

        let Some(action) = wizard::route(temp.step, &event.intent) else {
            debug!(
                step = %temp.step,
                intent = %event.intent.kind(),
                "intent not accepted in this step"
            );
            self.delete_inbound(event).await;
            return Ok(None);
        };

        match flows::apply(&self.usecases, &user, &temp, action).await? {
            Outcome::Transition(transition) => {
                self.show(event, &temp, transition).await?;
                Ok(None)
            }
            Outcome::Popup(text) => Ok(Some(text)),
        }
    }

    async fn command(
        &self,
        event: &InboundEvent,
        user: &User,
        command: Command,
    ) -> Result<(), PlantcareError> {
        let previous = self
            .usecases
            .storage()
            .get_temporary_by_user_id(user.id)
            .await?;
        let fresh = self.usecases.reset_temporary(user.id).await?;
        let shown = Temporary {
            pending_message_id: previous.and_then(|t| t.pending_message_id),
            ..fresh
        };
        debug!(telegram_id = user.telegram_id, ?command, "command");

        match command {
            Command::Start => self.show(event, &shown, Transition::idle(View::Menu)).await,
            Command::Help => {
                let msg = render(&Screen::Help, event.chat_id, None);
                self.deliver(event, &shown, Transition::idle(View::Menu), msg)
                    .await
            }
        }
    }

    /// Confirms watering from a reminder. Works in any step.
    async fn watered(
        &self,
        event: &InboundEvent,
        user: &User,
        data: Option<&str>,
    ) -> Result<Option<String>, PlantcareError> {
        let Some(group_id) = data.and_then(|d| d.parse::<i64>().ok()) else {
            debug!(?data, "malformed watered button");
            return Ok(None);
        };
        let group = self.usecases.confirm_watering(user.id, group_id).await?;

        if let Some(message_id) = event.message_id {
            let reminder = MessageRef {
                chat_id: event.chat_id,
                message_id,
            };
            if let Err(e) = self.channel.edit_reply_markup(reminder, Keyboard::new()).await {
                debug!(error = %e, group_id, "failed to strip reminder keyboard");
            }
        }

        Ok(Some(format!(
            "💧 Полив отмечен! Следующий полив: {}.",
            format_date(group.next_watering_date)
        )))
    }

    /// Renders and delivers the screen for `transition`.
    async fn show(
        &self,
        event: &InboundEvent,
        current: &Temporary,
        transition: Transition,
    ) -> Result<(), PlantcareError> {
        let screen = self
            .screen_for(current.user_id, transition.step, &transition.staged, transition.view)
            .await?;
        let msg = render(&screen, event.chat_id, transition.notice.as_deref());
        self.deliver(event, current, transition, msg).await
    }

    /// Sends `msg`, then persists the transition with the new message ID.
    async fn deliver(
        &self,
        event: &InboundEvent,
        current: &Temporary,
        transition: Transition,
        msg: OutboundMessage,
    ) -> Result<(), PlantcareError> {
        let sent = self.channel.send(msg).await?;

        let next = Temporary {
            user_id: current.user_id,
            step: transition.step,
            staged: transition.staged,
            pending_message_id: Some(sent.message_id),
        };
        if let Err(e) = self.usecases.save_temporary(&next).await {
            warn!(
                error = %e,
                user_id = current.user_id,
                step = %next.step,
                "failed to persist wizard step, retracting screen"
            );
            if let Err(del) = self.channel.delete(sent).await {
                warn!(error = %del, "failed to retract screen");
            }
            return Err(e);
        }
        debug!(user_id = current.user_id, from = %current.step, to = %next.step, "transition");

        // Tidy up: the previous screen and the message that triggered this one.
        let mut stale = Vec::with_capacity(2);
        stale.extend(current.pending_message_id);
        stale.extend(event.message_id);
        stale.dedup();
        for message_id in stale {
            if message_id != sent.message_id {
                self.delete_quietly(event.chat_id, message_id).await;
            }
        }
        Ok(())
    }

    async fn delete_inbound(&self, event: &InboundEvent) {
        if let Some(message_id) = event.message_id {
            self.delete_quietly(event.chat_id, message_id).await;
        }
    }

    async fn delete_quietly(&self, chat_id: i64, message_id: i32) {
        let target = MessageRef {
            chat_id,
            message_id,
        };
        if let Err(e) = self.channel.delete(target).await {
            debug!(error = %e, chat_id, message_id, "failed to delete message");
        }
    }

    /// Loads what the screen for `step` needs.
    async fn screen_for(
        &self,
        user_id: i64,
        step: Step,
        staged: &Staged,
        view: View,
    ) -> Result<Screen, PlantcareError> {
        let uc = &self.usecases;
        match view {
            View::Menu => return self.menu(user_id).await,
            View::Groups => {
                return Ok(Screen::Groups {
                    groups: uc.user_groups(user_id).await?,
                });
            }
            View::Step => {}
        }

        let screen = match step {
            Step::Idle => return self.menu(user_id).await,

            Step::AddGroupTitle => Screen::GroupTitle { current: None },
            Step::ChangeGroupTitle => Screen::GroupTitle {
                current: staged_group(staged)?.title.clone(),
            },
            Step::AddGroupDescription => Screen::GroupDescription { current: None },
            Step::ChangeGroupDescription => Screen::GroupDescription {
                current: staged_group(staged)?.description.clone(),
            },
            Step::AddGroupLastWatering | Step::ChangeGroupLastWatering => Screen::LastWatering {
                today: uc.today(),
            },
            Step::AddGroupInterval => Screen::Interval { current: None },
            Step::ChangeGroupInterval => Screen::Interval {
                current: staged_group(staged)?.watering_interval,
            },
            Step::AddGroupConfirm => Screen::GroupSummary {
                group: staged_group(staged)?.clone(),
            },
            Step::ManageGroupAction => Screen::GroupCard {
                group: staged_group(staged)?.clone(),
            },
            Step::ManageGroupChange => Screen::GroupChange {
                group: staged_group(staged)?.clone(),
            },
            Step::ManageGroupRemoval => {
                let group = staged_group(staged)?.clone();
                let plant_count = match group.id {
                    Some(id) => uc.count_group_plants(id).await?,
                    None => 0,
                };
                Screen::GroupRemoval { group, plant_count }
            }
            Step::ManageGroupSeePlants => {
                let group = staged_group(staged)?.clone();
                let id = group
                    .id
                    .ok_or_else(|| PlantcareError::not_found("group", "staged"))?;
                Screen::GroupPlants {
                    plants: uc.group_plants(user_id, id).await?,
                    group,
                }
            }

            Step::AddPlantTitle => Screen::PlantTitle { current: None },
            Step::ChangePlantTitle => Screen::PlantTitle {
                current: staged_plant(staged)?.title.clone(),
            },
            Step::AddPlantDescription => Screen::PlantDescription { current: None },
            Step::ChangePlantDescription => Screen::PlantDescription {
                current: staged_plant(staged)?.description.clone(),
            },
            Step::AddPlantGroup => Screen::PlantGroup {
                groups: uc.user_groups(user_id).await?,
            },
            Step::ChangePlantGroup => {
                let current = staged_plant(staged)?.group_id;
                let groups = uc
                    .user_groups(user_id)
                    .await?
                    .into_iter()
                    .filter(|g| Some(g.id) != current)
                    .collect();
                Screen::PlantGroup { groups }
            }
            Step::AddPlantPhotoQuestion => Screen::PhotoQuestion,
            Step::AddPlantPhoto | Step::ChangePlantPhoto => Screen::PlantPhoto,
            Step::AddPlantConfirm => {
                let plant = staged_plant(staged)?.clone();
                let group_title = self.group_title(user_id, plant.group_id).await?;
                Screen::PlantSummary { plant, group_title }
            }
            Step::ManagePlantChooseGroup => match staged_plant(staged)?.group_id {
                Some(group_id) => Screen::PlantList {
                    plants: uc.group_plants(user_id, group_id).await?,
                    group: uc.owned_group(user_id, group_id).await?,
                },
                None => Screen::PlantGroups {
                    groups: uc.user_groups(user_id).await?,
                },
            },
            Step::ManagePlantAction => {
                let plant = staged_plant(staged)?.clone();
                let group_title = self.group_title(user_id, plant.group_id).await?;
                Screen::PlantCard { plant, group_title }
            }
            Step::ManagePlantChange => Screen::PlantChange {
                plant: staged_plant(staged)?.clone(),
            },
            Step::ManagePlantRemoval => Screen::PlantRemoval {
                plant: staged_plant(staged)?.clone(),
            },
        };
        Ok(screen)
    }

    async fn menu(&self, user_id: i64) -> Result<Screen, PlantcareError> {
        Ok(Screen::Menu {
            has_groups: self.usecases.count_user_groups(user_id).await? > 0,
            has_plants: self.usecases.count_user_plants(user_id).await? > 0,
        })
    }

    async fn group_title(&self, user_id: i64, group_id: Option<i64>) -> Result<String, PlantcareError> {
        let id = group_id.ok_or_else(|| PlantcareError::not_found("group", "staged"))?;
        Ok(self.usecases.owned_group(user_id, id).await?.title)
    }

    /// Turns a failed intent into chat feedback. Returns the metric outcome
    /// and popup text for the button press.
    async fn surface(
        &self,
        event: &InboundEvent,
        err: PlantcareError,
    ) -> (&'static str, Option<String>) {
        let telegram_id = event.sender.telegram_id;

        match &err {
            PlantcareError::LimitExceeded(_) if event.callback_id.is_some() => {
                debug!(telegram_id, error = %err, "limit reached");
                ("rejected", err.user_message())
            }
            e if e.is_user_facing() => {
                debug!(telegram_id, error = %e, "input rejected");
                if let Err(rerender) = self.rerender(event, e.user_message()).await {
                    error!(telegram_id, error = %rerender, "failed to show validation notice");
                }
                ("rejected", None)
            }
            PlantcareError::NotFound { entity, key } => {
                debug!(telegram_id, entity = *entity, key = %key, "unknown session, asking for /start");
                self.delete_inbound(event).await;
                let msg = render(&Screen::SessionExpired, event.chat_id, None);
                if let Err(e) = self.channel.send(msg).await {
                    warn!(telegram_id, error = %e, "failed to send /start prompt");
                }
                ("expired", None)
            }
            _ => {
                error!(
                    telegram_id,
                    intent = %event.intent.kind(),
                    error = %err,
                    "failed to handle intent"
                );
                ("failed", None)
            }
        }
    }

    /// Shows the current step again with `notice` on top. The step is unchanged.
    async fn rerender(
        &self,
        event: &InboundEvent,
        notice: Option<String>,
    ) -> Result<(), PlantcareError> {
        let user = self
            .usecases
            .storage()
            .get_user_by_telegram_id(event.sender.telegram_id)
            .await?
            .ok_or_else(|| PlantcareError::not_found("user", event.sender.telegram_id))?;
        let temp = self.usecases.temporary(user.id).await?;
        let transition = Transition {
            step: temp.step,
            staged: temp.staged.clone(),
            view: View::Step,
            notice,
        };
        self.show(event, &temp, transition).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/start@plant_bot"), Some(Command::Start));
        assert_eq!(Command::parse("  /help me"), Some(Command::Help));
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse("/stop"), None);
        assert_eq!(Command::parse(""), None);
    }
}
