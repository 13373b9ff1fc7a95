// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite and the domain types.
//!
//! The canonical types live in `plantcare-core::types`; this module re-exports
//! them and owns the column lists and text encodings used by the queries.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

pub use plantcare_core::types::{
    Group, NewGroup, NewNotification, NewPlant, Notification, Plant, Staged, Temporary, User,
    UserProfile,
};

pub(crate) const USER_COLUMNS: &str =
    "id, telegram_id, first_name, last_name, username, is_bot, created_at";

pub(crate) const GROUP_COLUMNS: &str = "id, user_id, title, description, last_watering_date, \
     watering_interval, next_watering_date";

pub(crate) const PLANT_COLUMNS: &str = "id, user_id, group_id, title, description, photo";

pub(crate) const NOTIFICATION_COLUMNS: &str = "id, group_id, message_id, text, sent_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn encode_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        telegram_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        username: row.get(4)?,
        is_bot: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub(crate) fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        last_watering_date: date_column(row, 4)?,
        watering_interval: row.get(5)?,
        next_watering_date: date_column(row, 6)?,
    })
}

pub(crate) fn plant_from_row(row: &Row<'_>) -> rusqlite::Result<Plant> {
    Ok(Plant {
        id: row.get(0)?,
        user_id: row.get(1)?,
        group_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        photo: row.get(5)?,
    })
}

pub(crate) fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        group_id: row.get(1)?,
        message_id: row.get(2)?,
        text: row.get(3)?,
        sent_at: timestamp_column(row, 4)?,
    })
}

/// Reads `user_id, step, staged, pending_message_id`.
pub(crate) fn temporary_from_row(row: &Row<'_>) -> rusqlite::Result<Temporary> {
    let step: String = row.get(1)?;
    let staged: String = row.get(2)?;
    Ok(Temporary {
        user_id: row.get(0)?,
        step: step.parse().map_err(|e| conversion_error(1, e))?,
        staged: serde_json::from_str::<Staged>(&staged).map_err(|e| conversion_error(2, e))?,
        pending_message_id: row.get(3)?,
    })
}
