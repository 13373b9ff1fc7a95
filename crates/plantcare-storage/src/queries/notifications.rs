// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivered reminder records.

use chrono::NaiveDate;
use plantcare_core::PlantcareError;
use rusqlite::params;

use crate::database::{Database, is_unique_violation};
use crate::models::{
    NOTIFICATION_COLUMNS, NewNotification, Notification, encode_date, encode_timestamp,
    notification_from_row,
};

/// Appends a reminder record. A second record for the same group on the same
/// `sent_on` day is rejected.
pub async fn save_notification(
    db: &Database,
    notification: &NewNotification,
) -> Result<Notification, PlantcareError> {
    let n = notification.clone();
    let sent_on = encode_date(n.sent_on);
    db.connection()
        .call(move |conn| {
            let result = conn.execute(
                "INSERT INTO notifications (group_id, message_id, text, sent_at, sent_on)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![n.group_id, n.message_id, n.text, encode_timestamp(n.sent_at), sent_on],
            );
            match result {
                Ok(_) => Ok(Ok(Notification {
                    id: conn.last_insert_rowid(),
                    group_id: n.group_id,
                    message_id: n.message_id,
                    text: n.text,
                    sent_at: n.sent_at,
                })),
                Err(e) if is_unique_violation(&e) => Ok(Err(PlantcareError::Storage {
                    source: format!(
                        "notification for group {} already recorded on {sent_on}",
                        n.group_id
                    )
                    .into(),
                })),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?
}

pub async fn notification_sent_on(
    db: &Database,
    group_id: i64,
    date: NaiveDate,
) -> Result<bool, PlantcareError> {
    let date = encode_date(date);
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM notifications WHERE group_id = ?1 AND sent_on = ?2)",
                params![group_id, date],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_group_notifications(
    db: &Database,
    group_id: i64,
) -> Result<Vec<Notification>, PlantcareError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE group_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![group_id], notification_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{open_temp, seed_group, seed_user};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn at_most_one_per_group_and_day() {
        let (db, _dir) = open_temp().await;
        let user = seed_user(&db, 42).await;
        let day = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        let group = seed_group(&db, user.id, "Kitchen", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 7).await;

        let first = NewNotification {
            group_id: group.id,
            message_id: 10,
            text: "Пора полить".into(),
            sent_at: Utc.with_ymd_and_hms(2024, 6, 8, 12, 0, 0).unwrap(),
            sent_on: day,
        };
        let saved = save_notification(&db, &first).await.unwrap();
        assert_eq!(saved.sent_at, first.sent_at);
        assert!(notification_sent_on(&db, group.id, day).await.unwrap());
        assert!(!notification_sent_on(&db, group.id, day.succ_opt().unwrap()).await.unwrap());

        let again = NewNotification {
            message_id: 11,
            sent_at: Utc.with_ymd_and_hms(2024, 6, 8, 18, 30, 0).unwrap(),
            ..first.clone()
        };
        assert!(matches!(
            save_notification(&db, &again).await,
            Err(PlantcareError::Storage { .. })
        ));

        let next_day = NewNotification {
            message_id: 12,
            sent_at: Utc.with_ymd_and_hms(2024, 6, 9, 12, 0, 0).unwrap(),
            sent_on: day.succ_opt().unwrap(),
            ..first
        };
        save_notification(&db, &next_day).await.unwrap();

        let all = get_group_notifications(&db, group.id).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], saved);
        assert_eq!(all[1].message_id, 12);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn record_counts_against_the_given_day_not_the_send_instant() {
        let (db, _dir) = open_temp().await;
        let user = seed_user(&db, 42).await;
        let day = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        let group = seed_group(&db, user.id, "Kitchen", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 7).await;

        // Delivered just after midnight by a tick that started on the 8th.
        save_notification(
            &db,
            &NewNotification {
                group_id: group.id,
                message_id: 10,
                text: "Пора полить".into(),
                sent_at: Utc.with_ymd_and_hms(2024, 6, 9, 0, 0, 2).unwrap(),
                sent_on: day,
            },
        )
        .await
        .unwrap();

        assert!(notification_sent_on(&db, group.id, day).await.unwrap());
        assert!(!notification_sent_on(&db, group.id, day.succ_opt().unwrap()).await.unwrap());
        db.close().await.unwrap();
    }
}
