// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update filtering and classification.
//!
//! Decides whether an incoming Telegram update should be processed, then
//! turns it into a transport-neutral [`InboundEvent`].

use plantcare_core::error::PlantcareError;
use plantcare_core::types::{InboundEvent, Intent, UserProfile};
use teloxide::prelude::*;
use teloxide::types::{ChatKind, User};
use tracing::debug;

use crate::media;

/// Checks whether the sender may use the bot.
///
/// An empty `allowed_users` list admits everyone. Otherwise the sender's
/// numeric ID or username (with or without `@`) must be listed.
pub fn is_authorized(user: Option<&User>, allowed_users: &[String]) -> bool {
    let Some(user) = user else {
        return false;
    };
    if allowed_users.is_empty() {
        return true;
    }

    let user_id = user.id.0.to_string();
    allowed_users.iter().any(|allowed| {
        *allowed == user_id
            || user.username.as_deref().is_some_and(|username| {
                username.eq_ignore_ascii_case(allowed.strip_prefix('@').unwrap_or(allowed))
            })
    })
}

/// Checks whether the message is from a private (DM) chat.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

pub fn profile(user: &User) -> UserProfile {
    UserProfile {
        telegram_id: user.id.0 as i64,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
        is_bot: user.is_bot,
    }
}

/// Text becomes [`Intent::Text`], a photo is downloaded into
/// [`Intent::Photo`]. Anything else is `None`.
pub async fn message_intent(bot: &Bot, msg: &Message) -> Result<Option<Intent>, PlantcareError> {
    if let Some(text) = msg.text() {
        return Ok(Some(Intent::Text(text.to_string())));
    }

    if let Some(photos) = msg.photo() {
        let bytes = media::download_largest_photo(bot, photos).await?;
        return Ok(Some(Intent::Photo(bytes)));
    }

    debug!(msg_id = msg.id.0, "ignoring unsupported message type");
    Ok(None)
}

pub fn message_event(msg: &Message, intent: Intent) -> Option<InboundEvent> {
    let sender = msg.from.as_ref()?;
    Some(InboundEvent {
        sender: profile(sender),
        chat_id: msg.chat.id.0,
        message_id: Some(msg.id.0),
        callback_id: None,
        intent,
    })
}

/// Classifies a button press. Presses on inaccessible messages, from
/// non-private chats or with unknown data are dropped.
pub fn callback_event(query: &CallbackQuery) -> Option<InboundEvent> {
    let message = query.message.as_ref()?;
    if !message.chat().is_private() {
        return None;
    }
    let intent = Intent::from_callback_data(query.data.as_deref()?)?;
    Some(InboundEvent {
        sender: profile(&query.from),
        chat_id: message.chat().id.0,
        message_id: Some(message.id().0),
        callback_id: Some(query.id.0.clone()),
        intent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use plantcare_core::types::ButtonKind;

    fn user_json(user_id: u64, username: Option<&str>) -> serde_json::Value {
        let mut user = serde_json::json!({
            "id": user_id,
            "is_bot": false,
            "first_name": "Test",
        });
        if let Some(name) = username {
            user["username"] = serde_json::Value::from(name);
        }
        user
    }

    fn private_message_json(user_id: u64, username: Option<&str>, text: &str) -> serde_json::Value {
        serde_json::json!({
            "message_id": 7,
            "date": 1700000000i64,
            "chat": {
                "id": user_id as i64,
                "type": "private",
                "first_name": "Test",
            },
            "from": user_json(user_id, username),
            "text": text,
        })
    }

    fn private_message(user_id: u64, username: Option<&str>, text: &str) -> Message {
        serde_json::from_value(private_message_json(user_id, username, text))
            .expect("failed to deserialize mock message")
    }

    fn group_message(user_id: u64, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": -100123i64,
                "type": "supergroup",
                "title": "Test Group",
            },
            "from": user_json(user_id, None),
            "text": text,
        });
        serde_json::from_value(json).expect("failed to deserialize mock group message")
    }

    fn callback(data: &str) -> CallbackQuery {
        let json = serde_json::json!({
            "id": "cb-1",
            "from": user_json(42, Some("anna")),
            "chat_instance": "ci",
            "data": data,
            "message": private_message_json(42, Some("anna"), "screen"),
        });
        serde_json::from_value(json).expect("failed to deserialize mock callback")
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        let msg = private_message(42, None, "hi");
        assert!(is_authorized(msg.from.as_ref(), &[]));
        assert!(!is_authorized(None, &[]));
    }

    #[test]
    fn allow_list_matches_id_or_username() {
        let msg = private_message(42, Some("Anna"), "hi");
        assert!(is_authorized(msg.from.as_ref(), &["42".into()]));
        assert!(is_authorized(msg.from.as_ref(), &["@anna".into()]));
        assert!(!is_authorized(msg.from.as_ref(), &["43".into(), "bob".into()]));
    }

    #[test]
    fn only_private_chats_are_dms() {
        assert!(is_dm(&private_message(1, None, "hi")));
        assert!(!is_dm(&group_message(1, "hi")));
    }

    #[test]
    fn message_event_carries_sender_and_ids() {
        let msg = private_message(42, Some("anna"), "Kitchen");
        let event = message_event(&msg, Intent::Text("Kitchen".into())).unwrap();
        assert_eq!(event.sender.telegram_id, 42);
        assert_eq!(event.sender.username.as_deref(), Some("anna"));
        assert_eq!(event.chat_id, 42);
        assert_eq!(event.message_id, Some(7));
        assert!(event.callback_id.is_none());
    }

    #[test]
    fn callback_with_button_data() {
        let event = callback_event(&callback("choose_group:5")).unwrap();
        assert_eq!(event.callback_id.as_deref(), Some("cb-1"));
        assert_eq!(event.message_id, Some(7));
        assert_eq!(
            event.intent,
            Intent::Button {
                kind: ButtonKind::ChooseGroup,
                data: Some("5".into())
            }
        );
    }

    #[test]
    fn callback_with_date_data() {
        let event = callback_event(&callback("date:2024-06-01")).unwrap();
        assert_eq!(
            event.intent,
            Intent::Date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
        );
    }

    #[test]
    fn unknown_callback_data_is_dropped() {
        assert!(callback_event(&callback("nonsense")).is_none());
    }
}
