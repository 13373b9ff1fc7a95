// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wizard buffer operations. At most one row per user.

use plantcare_core::PlantcareError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, is_foreign_key_violation};
use crate::models::{Staged, Temporary, temporary_from_row};

fn encode_staged(staged: &Staged) -> Result<String, PlantcareError> {
    Ok(serde_json::to_string(staged)?)
}

/// Resets the user's buffer to `Idle`, creating it if missing.
pub async fn create_temporary(db: &Database, user_id: i64) -> Result<Temporary, PlantcareError> {
    let temporary = Temporary::idle(user_id);
    let step = temporary.step.to_string();
    let staged = encode_staged(&temporary.staged)?;
    let inserted = db
        .connection()
        .call(move |conn| {
            let result = conn.execute(
                "INSERT INTO temporaries (user_id, step, staged, pending_message_id)
                 VALUES (?1, ?2, ?3, NULL)
                 ON CONFLICT(user_id) DO UPDATE SET
                    step = excluded.step,
                    staged = excluded.staged,
                    pending_message_id = NULL,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![user_id, step, staged],
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_foreign_key_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if !inserted {
        return Err(PlantcareError::not_found("user", user_id));
    }
    Ok(temporary)
}

/// Overwrites the step, staged payload and pending message handle.
pub async fn update_temporary(db: &Database, temporary: &Temporary) -> Result<(), PlantcareError> {
    let user_id = temporary.user_id;
    let step = temporary.step.to_string();
    let staged = encode_staged(&temporary.staged)?;
    let pending = temporary.pending_message_id;
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE temporaries
                 SET step = ?1, staged = ?2, pending_message_id = ?3,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE user_id = ?4",
                params![step, staged, pending, user_id],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if updated == 0 {
        return Err(PlantcareError::not_found("temporary", user_id));
    }
    Ok(())
}

pub async fn get_temporary_by_user_id(
    db: &Database,
    user_id: i64,
) -> Result<Option<Temporary>, PlantcareError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT user_id, step, staged, pending_message_id
                 FROM temporaries WHERE user_id = ?1",
                params![user_id],
                temporary_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{open_temp, seed_user};
    use chrono::NaiveDate;
    use plantcare_core::Step;
    use plantcare_core::types::{StagedGroup, StagedPlant};

    #[tokio::test]
    async fn create_then_get_returns_idle() {
        let (db, _dir) = open_temp().await;
        let user = seed_user(&db, 42).await;

        let created = create_temporary(&db, user.id).await.unwrap();
        let fetched = get_temporary_by_user_id(&db, user.id).await.unwrap().unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.step, Step::Idle);
        assert_eq!(fetched.staged, Staged::None);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_round_trips_staged_payloads() {
        let (db, _dir) = open_temp().await;
        let user = seed_user(&db, 42).await;
        create_temporary(&db, user.id).await.unwrap();

        let group = Temporary {
            user_id: user.id,
            step: Step::AddGroupInterval,
            staged: Staged::Group(StagedGroup {
                title: Some("Kitchen".into()),
                description: Some("➖".into()),
                last_watering_date: NaiveDate::from_ymd_opt(2024, 6, 1),
                ..StagedGroup::default()
            }),
            pending_message_id: Some(17),
        };
        update_temporary(&db, &group).await.unwrap();
        assert_eq!(
            get_temporary_by_user_id(&db, user.id).await.unwrap().unwrap(),
            group
        );

        let plant = Temporary {
            user_id: user.id,
            step: Step::AddPlantConfirm,
            staged: Staged::Plant(StagedPlant {
                group_id: Some(3),
                title: Some("Ficus".into()),
                photo: Some(vec![0xff, 0xd8, 0x00, 0x10]),
                ..StagedPlant::default()
            }),
            pending_message_id: None,
        };
        update_temporary(&db, &plant).await.unwrap();
        assert_eq!(
            get_temporary_by_user_id(&db, user.id).await.unwrap().unwrap(),
            plant
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn create_resets_existing_buffer() {
        let (db, _dir) = open_temp().await;
        let user = seed_user(&db, 42).await;
        create_temporary(&db, user.id).await.unwrap();
        let mut t = Temporary::idle(user.id);
        t.step = Step::AddGroupTitle;
        t.pending_message_id = Some(5);
        update_temporary(&db, &t).await.unwrap();

        create_temporary(&db, user.id).await.unwrap();
        let fetched = get_temporary_by_user_id(&db, user.id).await.unwrap().unwrap();
        assert_eq!(fetched, Temporary::idle(user.id));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let (db, _dir) = open_temp().await;
        assert!(get_temporary_by_user_id(&db, 1).await.unwrap().is_none());
        assert!(matches!(
            update_temporary(&db, &Temporary::idle(1)).await,
            Err(PlantcareError::NotFound { entity: "temporary", .. })
        ));
        assert!(matches!(
            create_temporary(&db, 999).await,
            Err(PlantcareError::NotFound { entity: "user", .. })
        ));
        db.close().await.unwrap();
    }
}
