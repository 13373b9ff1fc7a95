// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tracing::debug;

use plantcare_config::model::DatabaseConfig;
use plantcare_core::types::{
    Group, NewGroup, NewNotification, NewPlant, Notification, NotifyCursor, Plant, Temporary, User,
    UserProfile,
};
use plantcare_core::{AdapterType, HealthStatus, PlantcareError, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// operation fails with a storage error until then.
pub struct SqliteStorage {
    config: DatabaseConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, PlantcareError> {
        self.db.get().ok_or_else(|| PlantcareError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PlantcareError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get::<_, i64>(0))?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PlantcareError> {
        if let Some(db) = self.db.get() {
            crate::database::checkpoint(db.connection()).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PlantcareError> {
        let db = Database::open(&self.config).await?;
        self.db.set(db).map_err(|_| PlantcareError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), PlantcareError> {
        crate::database::checkpoint(self.db()?.connection()).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Users ---

    async fn save_user(&self, profile: &UserProfile) -> Result<User, PlantcareError> {
        queries::users::save_user(self.db()?, profile).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, PlantcareError> {
        queries::users::get_user_by_id(self.db()?, id).await
    }

    async fn get_user_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> Result<Option<User>, PlantcareError> {
        queries::users::get_user_by_telegram_id(self.db()?, telegram_id).await
    }

    // --- Temporary ---

    async fn create_temporary(&self, user_id: i64) -> Result<Temporary, PlantcareError> {
        queries::temporary::create_temporary(self.db()?, user_id).await
    }

    async fn update_temporary(&self, temporary: &Temporary) -> Result<(), PlantcareError> {
        queries::temporary::update_temporary(self.db()?, temporary).await
    }

    async fn get_temporary_by_user_id(
        &self,
        user_id: i64,
    ) -> Result<Option<Temporary>, PlantcareError> {
        queries::temporary::get_temporary_by_user_id(self.db()?, user_id).await
    }

    // --- Groups ---

    async fn create_group(&self, group: &NewGroup) -> Result<Group, PlantcareError> {
        queries::groups::create_group(self.db()?, group).await
    }

    async fn update_group(&self, group: &Group) -> Result<Group, PlantcareError> {
        queries::groups::update_group(self.db()?, group).await
    }

    async fn group_exists(&self, user_id: i64, title: &str) -> Result<bool, PlantcareError> {
        queries::groups::group_exists(self.db()?, user_id, title).await
    }

    async fn delete_group(&self, id: i64) -> Result<(), PlantcareError> {
        queries::groups::delete_group(self.db()?, id).await
    }

    async fn get_user_groups(&self, user_id: i64) -> Result<Vec<Group>, PlantcareError> {
        queries::groups::get_user_groups(self.db()?, user_id).await
    }

    async fn count_user_groups(&self, user_id: i64) -> Result<u32, PlantcareError> {
        queries::groups::count_user_groups(self.db()?, user_id).await
    }

    async fn get_group(&self, id: i64) -> Result<Option<Group>, PlantcareError> {
        queries::groups::get_group(self.db()?, id).await
    }

    async fn get_groups_for_notify(
        &self,
        today: NaiveDate,
        after: Option<NotifyCursor>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Group>, PlantcareError> {
        queries::groups::get_groups_for_notify(self.db()?, today, after, limit, offset).await
    }

    // --- Plants ---

    async fn create_plant(&self, plant: &NewPlant) -> Result<Plant, PlantcareError> {
        queries::plants::create_plant(self.db()?, plant).await
    }

    async fn update_plant(&self, plant: &Plant) -> Result<Plant, PlantcareError> {
        queries::plants::update_plant(self.db()?, plant).await
    }

    async fn plant_exists(&self, group_id: i64, title: &str) -> Result<bool, PlantcareError> {
        queries::plants::plant_exists(self.db()?, group_id, title).await
    }

    async fn delete_plant(&self, id: i64) -> Result<(), PlantcareError> {
        queries::plants::delete_plant(self.db()?, id).await
    }

    async fn get_user_plants(&self, user_id: i64) -> Result<Vec<Plant>, PlantcareError> {
        queries::plants::get_user_plants(self.db()?, user_id).await
    }

    async fn count_user_plants(&self, user_id: i64) -> Result<u32, PlantcareError> {
        queries::plants::count_user_plants(self.db()?, user_id).await
    }

    async fn count_group_plants(&self, group_id: i64) -> Result<u32, PlantcareError> {
        queries::plants::count_group_plants(self.db()?, group_id).await
    }

    async fn get_plant(&self, id: i64) -> Result<Option<Plant>, PlantcareError> {
        queries::plants::get_plant(self.db()?, id).await
    }

    async fn get_group_plants(&self, group_id: i64) -> Result<Vec<Plant>, PlantcareError> {
        queries::plants::get_group_plants(self.db()?, group_id).await
    }

    // --- Notifications ---

    async fn save_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, PlantcareError> {
        queries::notifications::save_notification(self.db()?, notification).await
    }

    async fn notification_sent_on(
        &self,
        group_id: i64,
        date: NaiveDate,
    ) -> Result<bool, PlantcareError> {
        queries::notifications::notification_sent_on(self.db()?, group_id, date).await
    }

    async fn get_group_notifications(
        &self,
        group_id: i64,
    ) -> Result<Vec<Notification>, PlantcareError> {
        queries::notifications::get_group_notifications(self.db()?, group_id).await
    }
}
