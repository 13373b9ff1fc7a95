// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Use-case layer.
//!
//! Thin orchestrators between the wizard and storage. Each one checks
//! ownership, runs the domain validators, writes, and returns the snapshot
//! the renderer needs. Staging operations validate without writing; the
//! entity is only created on confirm.

use std::sync::Arc;

use chrono::NaiveDate;
use plantcare_config::model::LimitsConfig;
use plantcare_core::domain::{
    parse_user_date, validate_description, validate_group_title, validate_interval,
    validate_last_watering, validate_plant_title,
};
use plantcare_core::types::{
    Group, NewGroup, NewPlant, Plant, StagedGroup, StagedPlant, Temporary, User, UserProfile,
};
use plantcare_core::{Clock, Limit, PlantcareError, StorageAdapter, ValidationError};
use tracing::{debug, info};

use crate::wizard::DateInput;

fn required<T: Clone>(value: &Option<T>, field: &'static str) -> Result<T, PlantcareError> {
    value
        .clone()
        .ok_or(PlantcareError::Validation(ValidationError::Incomplete(field)))
}

/// Use cases over one storage backend.
#[derive(Clone)]
pub struct UseCases {
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
    limits: LimitsConfig,
}

impl UseCases {
    pub fn new(storage: Arc<dyn StorageAdapter>, clock: Arc<dyn Clock>, limits: LimitsConfig) -> Self {
        Self {
            storage,
            clock,
            limits,
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // --- Users and the wizard buffer ---

    /// Upserts the user by Telegram ID. Idempotent.
    pub async fn save_user(&self, profile: &UserProfile) -> Result<User, PlantcareError> {
        self.storage.save_user(profile).await
    }

    /// The user's wizard buffer. `NotFound` when the user never sent `/start`.
    pub async fn temporary(&self, user_id: i64) -> Result<Temporary, PlantcareError> {
        self.storage
            .get_temporary_by_user_id(user_id)
            .await?
            .ok_or_else(|| PlantcareError::not_found("temporary", user_id))
    }

    /// Replaces the buffer with a fresh `Idle` one.
    pub async fn reset_temporary(&self, user_id: i64) -> Result<Temporary, PlantcareError> {
        self.storage.create_temporary(user_id).await
    }

    pub async fn save_temporary(&self, temporary: &Temporary) -> Result<(), PlantcareError> {
        self.storage.update_temporary(temporary).await
    }

    // --- Groups ---

    pub async fn user_groups(&self, user_id: i64) -> Result<Vec<Group>, PlantcareError> {
        self.storage.get_user_groups(user_id).await
    }

    pub async fn count_user_groups(&self, user_id: i64) -> Result<u32, PlantcareError> {
        self.storage.count_user_groups(user_id).await
    }

    pub async fn count_user_plants(&self, user_id: i64) -> Result<u32, PlantcareError> {
        self.storage.count_user_plants(user_id).await
    }

    /// Fails with `LimitExceeded` when the user already owns the maximum number of groups.
    pub async fn ensure_group_capacity(&self, user_id: i64) -> Result<(), PlantcareError> {
        let max = self.limits.groups_per_user;
        if self.storage.count_user_groups(user_id).await? >= max {
            return Err(PlantcareError::LimitExceeded(Limit::GroupsPerUser(max)));
        }
        Ok(())
    }

    /// The group if `user_id` owns it.
    pub async fn owned_group(&self, user_id: i64, group_id: i64) -> Result<Group, PlantcareError> {
        match self.storage.get_group(group_id).await? {
            Some(group) if group.user_id == user_id => Ok(group),
            _ => Err(PlantcareError::not_found("group", group_id)),
        }
    }

    /// Snapshot of the group a user opened for management.
    pub async fn manage_group(&self, user_id: i64, group_id: i64) -> Result<Group, PlantcareError> {
        let group = self.owned_group(user_id, group_id).await?;
        debug!(user_id, group_id, "managing group");
        Ok(group)
    }

    /// Validates a group title and checks it is free for this user.
    /// `editing` is the group being renamed, whose own title does not conflict.
    pub async fn stage_group_title(
        &self,
        user_id: i64,
        editing: Option<&Group>,
        input: &str,
    ) -> Result<String, PlantcareError> {
        let title = validate_group_title(input)?;
        let unchanged = editing.is_some_and(|g| g.title == title);
        if !unchanged && self.storage.group_exists(user_id, &title).await? {
            return Err(PlantcareError::GroupAlreadyExists { title });
        }
        Ok(title)
    }

    /// Resolves and validates a last-watering date against today.
    pub fn stage_last_watering(&self, input: &DateInput) -> Result<NaiveDate, PlantcareError> {
        let date = match input {
            DateInput::Picked(date) => *date,
            DateInput::Typed(text) => parse_user_date(text)?,
        };
        Ok(validate_last_watering(date, self.today())?)
    }

    /// Creates the staged group once every field is present and valid.
    pub async fn confirm_add_group(
        &self,
        user_id: i64,
        staged: &StagedGroup,
    ) -> Result<Group, PlantcareError> {
        let new = NewGroup {
            user_id,
            title: validate_group_title(&required(&staged.title, "title")?)?,
            description: validate_description(
                staged.description.as_deref().unwrap_or_default(),
            )?,
            last_watering_date: validate_last_watering(
                required(&staged.last_watering_date, "last_watering_date")?,
                self.today(),
            )?,
            watering_interval: validate_interval(required(
                &staged.watering_interval,
                "watering_interval",
            )?)?,
        };
        self.ensure_group_capacity(user_id).await?;

        let group = self.storage.create_group(&new).await?;
        info!(
            user_id,
            group_id = group.id,
            next = %group.next_watering_date,
            "group created"
        );
        Ok(group)
    }

    pub async fn update_group_title(
        &self,
        user_id: i64,
        group_id: i64,
        input: &str,
    ) -> Result<Group, PlantcareError> {
        let mut group = self.owned_group(user_id, group_id).await?;
        group.title = self.stage_group_title(user_id, Some(&group), input).await?;
        self.storage.update_group(&group).await
    }

    pub async fn update_group_description(
        &self,
        user_id: i64,
        group_id: i64,
        input: Option<&str>,
    ) -> Result<Group, PlantcareError> {
        let mut group = self.owned_group(user_id, group_id).await?;
        group.description = validate_description(input.unwrap_or_default())?;
        self.storage.update_group(&group).await
    }

    /// Storage recomputes the next watering date.
    pub async fn update_group_last_watering(
        &self,
        user_id: i64,
        group_id: i64,
        input: &DateInput,
    ) -> Result<Group, PlantcareError> {
        let date = self.stage_last_watering(input)?;
        let mut group = self.owned_group(user_id, group_id).await?;
        group.last_watering_date = date;
        self.storage.update_group(&group).await
    }

    pub async fn update_group_interval(
        &self,
        user_id: i64,
        group_id: i64,
        interval: u32,
    ) -> Result<Group, PlantcareError> {
        let interval = validate_interval(interval)?;
        let mut group = self.owned_group(user_id, group_id).await?;
        group.watering_interval = interval;
        self.storage.update_group(&group).await
    }

    /// Deletes the group with its plants. Returns the deleted snapshot.
    pub async fn delete_group(&self, user_id: i64, group_id: i64) -> Result<Group, PlantcareError> {
        let group = self.owned_group(user_id, group_id).await?;
        self.storage.delete_group(group_id).await?;
        info!(user_id, group_id, "group deleted");
        Ok(group)
    }

    /// Marks the group watered today and moves the next watering date forward.
    pub async fn confirm_watering(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<Group, PlantcareError> {
        let mut group = self.owned_group(user_id, group_id).await?;
        group.last_watering_date = self.today();
        let group = self.storage.update_group(&group).await?;
        info!(
            user_id,
            group_id,
            next = %group.next_watering_date,
            "watering confirmed"
        );
        Ok(group)
    }

    // --- Plants ---

    pub async fn group_plants(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<Vec<Plant>, PlantcareError> {
        self.owned_group(user_id, group_id).await?;
        self.storage.get_group_plants(group_id).await
    }

    pub async fn count_group_plants(&self, group_id: i64) -> Result<u32, PlantcareError> {
        self.storage.count_group_plants(group_id).await
    }

    /// The plant if `user_id` owns it.
    pub async fn owned_plant(&self, user_id: i64, plant_id: i64) -> Result<Plant, PlantcareError> {
        match self.storage.get_plant(plant_id).await? {
            Some(plant) if plant.user_id == user_id => Ok(plant),
            _ => Err(PlantcareError::not_found("plant", plant_id)),
        }
    }

    /// Snapshot of the plant a user opened for management.
    pub async fn manage_plant(&self, user_id: i64, plant_id: i64) -> Result<Plant, PlantcareError> {
        let plant = self.owned_plant(user_id, plant_id).await?;
        debug!(user_id, plant_id, "managing plant");
        Ok(plant)
    }

    /// Checks that `group_id` belongs to the user, has room for one more
    /// plant and has no plant titled `title` yet.
    pub async fn stage_plant_group(
        &self,
        user_id: i64,
        group_id: i64,
        title: Option<&str>,
    ) -> Result<Group, PlantcareError> {
        let group = self.owned_group(user_id, group_id).await?;
        let max = self.limits.plants_per_group;
        if self.storage.count_group_plants(group_id).await? >= max {
            return Err(PlantcareError::LimitExceeded(Limit::PlantsPerGroup(max)));
        }
        if let Some(title) = title
            && self.storage.plant_exists(group_id, title).await?
        {
            return Err(PlantcareError::PlantAlreadyExists {
                title: title.to_string(),
            });
        }
        Ok(group)
    }

    pub async fn confirm_add_plant(
        &self,
        user_id: i64,
        staged: &StagedPlant,
    ) -> Result<Plant, PlantcareError> {
        let title = validate_plant_title(&required(&staged.title, "title")?)?;
        let group_id = required(&staged.group_id, "group_id")?;
        self.stage_plant_group(user_id, group_id, Some(&title)).await?;

        let plant = self
            .storage
            .create_plant(&NewPlant {
                user_id,
                group_id,
                title,
                description: validate_description(
                    staged.description.as_deref().unwrap_or_default(),
                )?,
                photo: staged.photo.clone(),
            })
            .await?;
        info!(user_id, plant_id = plant.id, group_id, "plant created");
        Ok(plant)
    }

    pub async fn update_plant_title(
        &self,
        user_id: i64,
        plant_id: i64,
        input: &str,
    ) -> Result<Plant, PlantcareError> {
        let mut plant = self.owned_plant(user_id, plant_id).await?;
        let title = validate_plant_title(input)?;
        if title != plant.title && self.storage.plant_exists(plant.group_id, &title).await? {
            return Err(PlantcareError::PlantAlreadyExists { title });
        }
        plant.title = title;
        self.storage.update_plant(&plant).await
    }

    pub async fn update_plant_description(
        &self,
        user_id: i64,
        plant_id: i64,
        input: Option<&str>,
    ) -> Result<Plant, PlantcareError> {
        let mut plant = self.owned_plant(user_id, plant_id).await?;
        plant.description = validate_description(input.unwrap_or_default())?;
        self.storage.update_plant(&plant).await
    }

    pub async fn update_plant_photo(
        &self,
        user_id: i64,
        plant_id: i64,
        photo: Vec<u8>,
    ) -> Result<Plant, PlantcareError> {
        let mut plant = self.owned_plant(user_id, plant_id).await?;
        plant.photo = Some(photo);
        self.storage.update_plant(&plant).await
    }

    /// Moves a plant to another of the user's groups.
    pub async fn move_plant(
        &self,
        user_id: i64,
        plant_id: i64,
        group_id: i64,
    ) -> Result<Plant, PlantcareError> {
        let mut plant = self.owned_plant(user_id, plant_id).await?;
        if plant.group_id == group_id {
            return Ok(plant);
        }
        self.stage_plant_group(user_id, group_id, Some(&plant.title))
            .await?;
        let from = plant.group_id;
        plant.group_id = group_id;
        let plant = self.storage.update_plant(&plant).await?;
        info!(user_id, plant_id, from, to = group_id, "plant moved");
        Ok(plant)
    }

    /// Deletes the plant. Returns the deleted snapshot.
    pub async fn delete_plant(&self, user_id: i64, plant_id: i64) -> Result<Plant, PlantcareError> {
        let plant = self.owned_plant(user_id, plant_id).await?;
        self.storage.delete_plant(plant_id).await?;
        info!(user_id, plant_id, "plant deleted");
        Ok(plant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantcare_config::model::DatabaseConfig;
    use plantcare_storage::SqliteStorage;
    use plantcare_test_utils::FixedClock;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup(limits: LimitsConfig) -> (UseCases, User, TempDir) {
        setup_with_clock(limits, FixedClock::at_date(ymd(2024, 6, 10))).await
    }

    async fn setup_with_clock(limits: LimitsConfig, clock: FixedClock) -> (UseCases, User, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(DatabaseConfig {
            path: dir.path().join("usecases.db").display().to_string(),
            ..DatabaseConfig::default()
        });
        storage.initialize().await.unwrap();
        let usecases = UseCases::new(Arc::new(storage), Arc::new(clock), limits);
        let user = usecases
            .save_user(&UserProfile {
                telegram_id: 42,
                first_name: "Anna".into(),
                last_name: None,
                username: None,
                is_bot: false,
            })
            .await
            .unwrap();
        (usecases, user, dir)
    }

    fn kitchen() -> StagedGroup {
        StagedGroup {
            id: None,
            title: Some("Kitchen".into()),
            description: None,
            last_watering_date: Some(ymd(2024, 6, 1)),
            watering_interval: Some(7),
        }
    }

    #[tokio::test]
    async fn confirm_add_group_derives_next_watering() {
        let (uc, user, _dir) = setup(LimitsConfig::default()).await;
        let group = uc.confirm_add_group(user.id, &kitchen()).await.unwrap();
        assert_eq!(group.description, "➖");
        assert_eq!(group.next_watering_date, ymd(2024, 6, 8));
    }

    #[tokio::test]
    async fn incomplete_staged_group_is_rejected() {
        let (uc, user, _dir) = setup(LimitsConfig::default()).await;
        let staged = StagedGroup {
            watering_interval: None,
            ..kitchen()
        };
        let err = uc.confirm_add_group(user.id, &staged).await.unwrap_err();
        assert!(matches!(
            err,
            PlantcareError::Validation(ValidationError::Incomplete("watering_interval"))
        ));
        assert_eq!(uc.count_user_groups(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_title_is_caught_while_staging() {
        let (uc, user, _dir) = setup(LimitsConfig::default()).await;
        uc.confirm_add_group(user.id, &kitchen()).await.unwrap();
        let err = uc
            .stage_group_title(user.id, None, " Kitchen ")
            .await
            .unwrap_err();
        assert!(matches!(err, PlantcareError::GroupAlreadyExists { .. }));

        // Renaming a group to its own title is not a conflict.
        let group = uc.user_groups(user.id).await.unwrap().remove(0);
        assert_eq!(
            uc.stage_group_title(user.id, Some(&group), "Kitchen")
                .await
                .unwrap(),
            "Kitchen"
        );
    }

    #[tokio::test]
    async fn group_limit_is_enforced() {
        let limits = LimitsConfig {
            groups_per_user: 1,
            ..LimitsConfig::default()
        };
        let (uc, user, _dir) = setup(limits).await;
        uc.confirm_add_group(user.id, &kitchen()).await.unwrap();
        assert!(matches!(
            uc.ensure_group_capacity(user.id).await,
            Err(PlantcareError::LimitExceeded(Limit::GroupsPerUser(1)))
        ));
        let second = StagedGroup {
            title: Some("Balcony".into()),
            ..kitchen()
        };
        assert!(uc.confirm_add_group(user.id, &second).await.is_err());
        assert_eq!(uc.count_user_groups(user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn last_watering_in_future_leaves_group_unchanged() {
        let (uc, user, _dir) = setup(LimitsConfig::default()).await;
        let group = uc.confirm_add_group(user.id, &kitchen()).await.unwrap();
        let err = uc
            .update_group_last_watering(user.id, group.id, &DateInput::Picked(ymd(2024, 6, 11)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlantcareError::Validation(ValidationError::LastWateringInFuture { .. })
        ));
        assert_eq!(uc.owned_group(user.id, group.id).await.unwrap(), group);

        let typed = uc
            .update_group_last_watering(user.id, group.id, &DateInput::Typed("05.06.2024".into()))
            .await
            .unwrap();
        assert_eq!(typed.next_watering_date, ymd(2024, 6, 12));
    }

    #[tokio::test]
    async fn confirm_watering_moves_schedule_to_today() {
        let (uc, user, _dir) = setup(LimitsConfig::default()).await;
        let group = uc.confirm_add_group(user.id, &kitchen()).await.unwrap();
        let watered = uc.confirm_watering(user.id, group.id).await.unwrap();
        assert_eq!(watered.last_watering_date, ymd(2024, 6, 10));
        assert_eq!(watered.next_watering_date, ymd(2024, 6, 17));
    }

    #[tokio::test]
    async fn confirm_watering_uses_the_local_day() {
        // 03:00 UTC on the 11th is still the evening of the 10th at UTC-5.
        let clock = FixedClock::at(ymd(2024, 6, 11).and_hms_opt(3, 0, 0).unwrap().and_utc())
            .with_utc_offset_hours(-5);
        let (uc, user, _dir) = setup_with_clock(LimitsConfig::default(), clock).await;
        let group = uc.confirm_add_group(user.id, &kitchen()).await.unwrap();
        let watered = uc.confirm_watering(user.id, group.id).await.unwrap();
        assert_eq!(watered.last_watering_date, ymd(2024, 6, 10));
    }

    #[tokio::test]
    async fn foreign_groups_are_not_found() {
        let (uc, user, _dir) = setup(LimitsConfig::default()).await;
        let group = uc.confirm_add_group(user.id, &kitchen()).await.unwrap();
        let other = uc
            .save_user(&UserProfile {
                telegram_id: 7,
                first_name: "Bob".into(),
                last_name: None,
                username: None,
                is_bot: false,
            })
            .await
            .unwrap();
        assert!(matches!(
            uc.delete_group(other.id, group.id).await,
            Err(PlantcareError::NotFound { entity: "group", .. })
        ));
        assert!(uc.confirm_watering(other.id, group.id).await.is_err());
    }

    #[tokio::test]
    async fn plant_lifecycle_and_move() {
        let limits = LimitsConfig {
            plants_per_group: 1,
            ..LimitsConfig::default()
        };
        let (uc, user, _dir) = setup(limits).await;
        let a = uc.confirm_add_group(user.id, &kitchen()).await.unwrap();
        let b = uc
            .confirm_add_group(
                user.id,
                &StagedGroup {
                    title: Some("Balcony".into()),
                    ..kitchen()
                },
            )
            .await
            .unwrap();

        let rose = uc
            .confirm_add_plant(
                user.id,
                &StagedPlant {
                    group_id: Some(a.id),
                    title: Some("Rose".into()),
                    ..StagedPlant::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(rose.description, "➖");

        // Group A is full now.
        assert!(matches!(
            uc.stage_plant_group(user.id, a.id, Some("Fern")).await,
            Err(PlantcareError::LimitExceeded(Limit::PlantsPerGroup(1)))
        ));

        let moved = uc.move_plant(user.id, rose.id, b.id).await.unwrap();
        assert_eq!(moved.group_id, b.id);
        assert_eq!(uc.count_group_plants(a.id).await.unwrap(), 0);
        assert_eq!(uc.count_group_plants(b.id).await.unwrap(), 1);

        let renamed = uc.update_plant_title(user.id, rose.id, "Tea rose").await.unwrap();
        assert_eq!(renamed.title, "Tea rose");
        let photo = uc.update_plant_photo(user.id, rose.id, vec![1, 2, 3]).await.unwrap();
        assert_eq!(photo.photo, Some(vec![1, 2, 3]));

        uc.delete_plant(user.id, rose.id).await.unwrap();
        assert_eq!(uc.count_user_plants(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn temporary_requires_start() {
        let (uc, user, _dir) = setup(LimitsConfig::default()).await;
        assert!(matches!(
            uc.temporary(user.id).await,
            Err(PlantcareError::NotFound {
                entity: "temporary",
                ..
            })
        ));
        uc.reset_temporary(user.id).await.unwrap();
        assert_eq!(uc.temporary(user.id).await.unwrap(), Temporary::idle(user.id));
    }
}
