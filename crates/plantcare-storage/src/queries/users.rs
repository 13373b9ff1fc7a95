// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User operations.

use plantcare_core::PlantcareError;
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::{USER_COLUMNS, User, UserProfile, user_from_row};

/// Inserts the user or refreshes the profile fields of an existing one.
pub async fn save_user(db: &Database, profile: &UserProfile) -> Result<User, PlantcareError> {
    let profile = profile.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (telegram_id, first_name, last_name, username, is_bot)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(telegram_id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    username = excluded.username,
                    is_bot = excluded.is_bot",
                params![
                    profile.telegram_id,
                    profile.first_name,
                    profile.last_name,
                    profile.username,
                    profile.is_bot,
                ],
            )?;
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_id = ?1"),
                params![profile.telegram_id],
                user_from_row,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_user_by_id(db: &Database, id: i64) -> Result<Option<User>, PlantcareError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_user_by_telegram_id(
    db: &Database,
    telegram_id: i64,
) -> Result<Option<User>, PlantcareError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_id = ?1"),
                params![telegram_id],
                user_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::open_temp;

    fn profile(telegram_id: i64, first_name: &str) -> UserProfile {
        UserProfile {
            telegram_id,
            first_name: first_name.to_string(),
            last_name: None,
            username: Some("gardener".to_string()),
            is_bot: false,
        }
    }

    #[tokio::test]
    async fn save_user_is_idempotent_and_refreshes_profile() {
        let (db, _dir) = open_temp().await;

        let first = save_user(&db, &profile(42, "Anna")).await.unwrap();
        let second = save_user(&db, &profile(42, "Anya")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.first_name, "Anya");
        assert_eq!(second.telegram_id, 42);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn lookups_by_both_keys() {
        let (db, _dir) = open_temp().await;
        let user = save_user(&db, &profile(7, "Ivan")).await.unwrap();

        let by_id = get_user_by_id(&db, user.id).await.unwrap().unwrap();
        let by_tg = get_user_by_telegram_id(&db, 7).await.unwrap().unwrap();
        assert_eq!(by_id, by_tg);
        assert!(get_user_by_telegram_id(&db, 8).await.unwrap().is_none());
        assert!(get_user_by_id(&db, user.id + 100).await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
