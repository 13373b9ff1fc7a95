// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::PlantcareError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Group, NewGroup, NewNotification, NewPlant, Notification, NotifyCursor, Plant, Temporary, User,
    UserProfile,
};

/// Adapter for storage and persistence backends.
///
/// Every operation is independently atomic and safe to call concurrently.
/// Multi-row consistency (deleting a group together with its plants) is the
/// implementation's obligation. List queries return rows in ascending `id`
/// order unless stated otherwise.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), PlantcareError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), PlantcareError>;

    // --- Users ---

    /// Inserts or refreshes the user keyed by `telegram_id`. Idempotent.
    async fn save_user(&self, profile: &UserProfile) -> Result<User, PlantcareError>;

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, PlantcareError>;

    async fn get_user_by_telegram_id(&self, telegram_id: i64)
    -> Result<Option<User>, PlantcareError>;

    // --- Temporary ---

    /// Creates the user's wizard buffer in the `Idle` step, replacing any existing one.
    async fn create_temporary(&self, user_id: i64) -> Result<Temporary, PlantcareError>;

    /// Overwrites step, staged payload and pending message of an existing buffer.
    async fn update_temporary(&self, temporary: &Temporary) -> Result<(), PlantcareError>;

    async fn get_temporary_by_user_id(
        &self,
        user_id: i64,
    ) -> Result<Option<Temporary>, PlantcareError>;

    // --- Groups ---

    /// Fails with `GroupAlreadyExists` on a `(user_id, title)` conflict.
    async fn create_group(&self, group: &NewGroup) -> Result<Group, PlantcareError>;

    /// Writes all mutable fields and recomputes the next watering date.
    async fn update_group(&self, group: &Group) -> Result<Group, PlantcareError>;

    async fn group_exists(&self, user_id: i64, title: &str) -> Result<bool, PlantcareError>;

    /// Deletes the group and every plant in it, in one transaction.
    async fn delete_group(&self, id: i64) -> Result<(), PlantcareError>;

    async fn get_user_groups(&self, user_id: i64) -> Result<Vec<Group>, PlantcareError>;

    async fn count_user_groups(&self, user_id: i64) -> Result<u32, PlantcareError>;

    async fn get_group(&self, id: i64) -> Result<Option<Group>, PlantcareError>;

    /// Groups due on or before `today` that have no notification recorded for
    /// `today`, ordered by `(next_watering_date, id)` and starting strictly
    /// after `after` when given.
    async fn get_groups_for_notify(
        &self,
        today: NaiveDate,
        after: Option<NotifyCursor>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Group>, PlantcareError>;

    // --- Plants ---

    /// Fails with `PlantAlreadyExists` on a `(group_id, title)` conflict.
    async fn create_plant(&self, plant: &NewPlant) -> Result<Plant, PlantcareError>;

    /// Writes all mutable fields, including a move to another group.
    async fn update_plant(&self, plant: &Plant) -> Result<Plant, PlantcareError>;

    async fn plant_exists(&self, group_id: i64, title: &str) -> Result<bool, PlantcareError>;

    async fn delete_plant(&self, id: i64) -> Result<(), PlantcareError>;

    async fn get_user_plants(&self, user_id: i64) -> Result<Vec<Plant>, PlantcareError>;

    async fn count_user_plants(&self, user_id: i64) -> Result<u32, PlantcareError>;

    async fn count_group_plants(&self, group_id: i64) -> Result<u32, PlantcareError>;

    async fn get_plant(&self, id: i64) -> Result<Option<Plant>, PlantcareError>;

    async fn get_group_plants(&self, group_id: i64) -> Result<Vec<Plant>, PlantcareError>;

    // --- Notifications ---

    /// Appends a delivery record. At most one per group and `sent_on` day.
    async fn save_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, PlantcareError>;

    async fn notification_sent_on(
        &self,
        group_id: i64,
        date: NaiveDate,
    ) -> Result<bool, PlantcareError>;

    async fn get_group_notifications(
        &self,
        group_id: i64,
    ) -> Result<Vec<Notification>, PlantcareError>;
}
