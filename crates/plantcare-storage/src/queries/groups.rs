// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Watering scenario operations.
//!
//! `next_watering_date` is always derived here from the last watering date and
//! the interval; callers never supply it.

use chrono::NaiveDate;
use plantcare_core::PlantcareError;
use plantcare_core::domain::compute_next_watering;
use plantcare_core::types::NotifyCursor;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, is_unique_violation};
use crate::models::{GROUP_COLUMNS, Group, NewGroup, encode_date, group_from_row};

pub async fn create_group(db: &Database, group: &NewGroup) -> Result<Group, PlantcareError> {
    let group = group.clone();
    db.connection()
        .call(move |conn| {
            let next = compute_next_watering(group.last_watering_date, group.watering_interval);
            let result = conn.execute(
                "INSERT INTO watering_groups
                    (user_id, title, description, last_watering_date, watering_interval, next_watering_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    group.user_id,
                    group.title,
                    group.description,
                    encode_date(group.last_watering_date),
                    group.watering_interval,
                    encode_date(next),
                ],
            );
            match result {
                Ok(_) => Ok(Ok(Group {
                    id: conn.last_insert_rowid(),
                    user_id: group.user_id,
                    title: group.title,
                    description: group.description,
                    last_watering_date: group.last_watering_date,
                    watering_interval: group.watering_interval,
                    next_watering_date: next,
                })),
                Err(e) if is_unique_violation(&e) => {
                    Ok(Err(PlantcareError::GroupAlreadyExists { title: group.title }))
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?
}

/// Writes title, description, last watering date and interval, and
/// recomputes the next watering date.
pub async fn update_group(db: &Database, group: &Group) -> Result<Group, PlantcareError> {
    let mut group = group.clone();
    group.next_watering_date = compute_next_watering(group.last_watering_date, group.watering_interval);
    db.connection()
        .call(move |conn| {
            let result = conn.execute(
                "UPDATE watering_groups
                 SET title = ?1, description = ?2, last_watering_date = ?3,
                     watering_interval = ?4, next_watering_date = ?5
                 WHERE id = ?6",
                params![
                    group.title,
                    group.description,
                    encode_date(group.last_watering_date),
                    group.watering_interval,
                    encode_date(group.next_watering_date),
                    group.id,
                ],
            );
            match result {
                Ok(0) => Ok(Err(PlantcareError::not_found("group", group.id))),
                Ok(_) => Ok(Ok(group)),
                Err(e) if is_unique_violation(&e) => {
                    Ok(Err(PlantcareError::GroupAlreadyExists { title: group.title }))
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?
}

pub async fn group_exists(db: &Database, user_id: i64, title: &str) -> Result<bool, PlantcareError> {
    let title = title.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM watering_groups WHERE user_id = ?1 AND title = ?2)",
                params![user_id, title],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deletes the group with its plants and reminders in one transaction.
pub async fn delete_group(db: &Database, id: i64) -> Result<(), PlantcareError> {
    let deleted = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM plants WHERE group_id = ?1", params![id])?;
            tx.execute("DELETE FROM notifications WHERE group_id = ?1", params![id])?;
            let deleted = tx.execute("DELETE FROM watering_groups WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(deleted)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if deleted == 0 {
        return Err(PlantcareError::not_found("group", id));
    }
    Ok(())
}

pub async fn get_user_groups(db: &Database, user_id: i64) -> Result<Vec<Group>, PlantcareError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GROUP_COLUMNS} FROM watering_groups WHERE user_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![user_id], group_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn count_user_groups(db: &Database, user_id: i64) -> Result<u32, PlantcareError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM watering_groups WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_group(db: &Database, id: i64) -> Result<Option<Group>, PlantcareError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM watering_groups WHERE id = ?1"),
                params![id],
                group_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// One page of groups due on or before `today` with no reminder recorded for
/// `today`, ordered by `(next_watering_date, id)`.
///
/// With `after` set, only groups strictly past that keyset position are
/// returned, so a sweep moves on even when earlier groups stay unnotified.
pub async fn get_groups_for_notify(
    db: &Database,
    today: NaiveDate,
    after: Option<NotifyCursor>,
    limit: u32,
    offset: u32,
) -> Result<Vec<Group>, PlantcareError> {
    let today = encode_date(today);
    let after_date = after.map(|c| encode_date(c.next_watering_date));
    let after_id = after.map(|c| c.group_id);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT g.id, g.user_id, g.title, g.description, g.last_watering_date,
                        g.watering_interval, g.next_watering_date
                 FROM watering_groups g
                 WHERE g.next_watering_date <= ?1
                   AND (?4 IS NULL
                        OR g.next_watering_date > ?4
                        OR (g.next_watering_date = ?4 AND g.id > ?5))
                   AND NOT EXISTS (
                       SELECT 1 FROM notifications n
                       WHERE n.group_id = g.id AND n.sent_on = ?1
                   )
                 ORDER BY g.next_watering_date, g.id
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt.query_map(
                params![today, limit, offset, after_date, after_id],
                group_from_row,
            )?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
