// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plant operations.

use plantcare_core::PlantcareError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, is_foreign_key_violation, is_unique_violation};
use crate::models::{NewPlant, PLANT_COLUMNS, Plant, plant_from_row};

pub async fn create_plant(db: &Database, plant: &NewPlant) -> Result<Plant, PlantcareError> {
    let plant = plant.clone();
    db.connection()
        .call(move |conn| {
            let result = conn.execute(
                "INSERT INTO plants (user_id, group_id, title, description, photo)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    plant.user_id,
                    plant.group_id,
                    plant.title,
                    plant.description,
                    plant.photo,
                ],
            );
            match result {
                Ok(_) => Ok(Ok(Plant {
                    id: conn.last_insert_rowid(),
                    user_id: plant.user_id,
                    group_id: plant.group_id,
                    title: plant.title,
                    description: plant.description,
                    photo: plant.photo,
                })),
                Err(e) if is_unique_violation(&e) => {
                    Ok(Err(PlantcareError::PlantAlreadyExists { title: plant.title }))
                }
                Err(e) if is_foreign_key_violation(&e) => {
                    Ok(Err(PlantcareError::not_found("group", plant.group_id)))
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?
}

/// Writes title, description, photo and group. Moving a plant into a group
/// that already has its title fails with `PlantAlreadyExists`.
pub async fn update_plant(db: &Database, plant: &Plant) -> Result<Plant, PlantcareError> {
    let plant = plant.clone();
    db.connection()
        .call(move |conn| {
            let result = conn.execute(
                "UPDATE plants
                 SET group_id = ?1, title = ?2, description = ?3, photo = ?4
                 WHERE id = ?5",
                params![
                    plant.group_id,
                    plant.title,
                    plant.description,
                    plant.photo,
                    plant.id,
                ],
            );
            match result {
                Ok(0) => Ok(Err(PlantcareError::not_found("plant", plant.id))),
                Ok(_) => Ok(Ok(plant)),
                Err(e) if is_unique_violation(&e) => {
                    Ok(Err(PlantcareError::PlantAlreadyExists { title: plant.title }))
                }
                Err(e) if is_foreign_key_violation(&e) => {
                    Ok(Err(PlantcareError::not_found("group", plant.group_id)))
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?
}

pub async fn plant_exists(db: &Database, group_id: i64, title: &str) -> Result<bool, PlantcareError> {
    let title = title.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM plants WHERE group_id = ?1 AND title = ?2)",
                params![group_id, title],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn delete_plant(db: &Database, id: i64) -> Result<(), PlantcareError> {
    let deleted = db
        .connection()
        .call(move |conn| conn.execute("DELETE FROM plants WHERE id = ?1", params![id]))
        .await
        .map_err(crate::database::map_tr_err)?;
    if deleted == 0 {
        return Err(PlantcareError::not_found("plant", id));
    }
    Ok(())
}

async fn list_plants(
    db: &Database,
    column: &'static str,
    key: i64,
) -> Result<Vec<Plant>, PlantcareError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PLANT_COLUMNS} FROM plants WHERE {column} = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![key], plant_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

async fn count_plants(db: &Database, column: &'static str, key: i64) -> Result<u32, PlantcareError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM plants WHERE {column} = ?1"),
                params![key],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_user_plants(db: &Database, user_id: i64) -> Result<Vec<Plant>, PlantcareError> {
    list_plants(db, "user_id", user_id).await
}

pub async fn get_group_plants(db: &Database, group_id: i64) -> Result<Vec<Plant>, PlantcareError> {
    list_plants(db, "group_id", group_id).await
}

pub async fn count_user_plants(db: &Database, user_id: i64) -> Result<u32, PlantcareError> {
    count_plants(db, "user_id", user_id).await
}

pub async fn count_group_plants(db: &Database, group_id: i64) -> Result<u32, PlantcareError> {
    count_plants(db, "group_id", group_id).await
}

pub async fn get_plant(db: &Database, id: i64) -> Result<Option<Plant>, PlantcareError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {PLANT_COLUMNS} FROM plants WHERE id = ?1"),
                params![id],
                plant_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
