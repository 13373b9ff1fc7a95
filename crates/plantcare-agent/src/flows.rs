// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Step semantics of wizard actions.
//!
//! [`apply`] runs the use case an [`Action`] stands for in the current step
//! and says where the wizard goes next. It never talks to the transport.

use plantcare_core::domain::{validate_description, validate_interval, validate_plant_title};
use plantcare_core::types::{
    Group, Plant, Staged, StagedGroup, StagedPlant, Step, Temporary, User,
};
use plantcare_core::PlantcareError;

use crate::render::format_date;
use crate::usecases::UseCases;
use crate::wizard::{Action, View, group_field_step, plant_field_step};

const SAVED: &str = "✅ Изменения сохранены.";
const NO_GROUPS: &str = "Сначала создайте сценарий полива.";

/// Where the wizard goes after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub step: Step,
    pub staged: Staged,
    pub view: View,
    /// Shown above the next screen's caption.
    pub notice: Option<String>,
}

impl Transition {
    pub fn to(step: Step, staged: Staged) -> Self {
        Self {
            step,
            staged,
            view: View::Step,
            notice: None,
        }
    }

    /// Back to `Idle`, showing `view`.
    pub fn idle(view: View) -> Self {
        Self {
            step: Step::Idle,
            staged: Staged::None,
            view,
            notice: None,
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

/// Result of applying an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Transition(Transition),
    /// Answer the button press with a popup and change nothing.
    Popup(String),
}

pub(crate) fn staged_group(staged: &Staged) -> Result<&StagedGroup, PlantcareError> {
    staged
        .group()
        .ok_or_else(|| PlantcareError::not_found("staged group", "temporary"))
}

pub(crate) fn staged_plant(staged: &Staged) -> Result<&StagedPlant, PlantcareError> {
    staged
        .plant()
        .ok_or_else(|| PlantcareError::not_found("staged plant", "temporary"))
}

fn group_id(staged: &Staged) -> Result<i64, PlantcareError> {
    staged_group(staged)?
        .id
        .ok_or_else(|| PlantcareError::not_found("group", "staged"))
}

fn plant_id(staged: &Staged) -> Result<i64, PlantcareError> {
    staged_plant(staged)?
        .id
        .ok_or_else(|| PlantcareError::not_found("plant", "staged"))
}

fn unexpected(step: Step, action: &Action) -> PlantcareError {
    PlantcareError::Internal(format!("{action:?} is not valid in step {step}"))
}

fn saved_group(group: &Group) -> Transition {
    Transition::to(Step::ManageGroupAction, Staged::Group(group.into())).with_notice(SAVED)
}

fn saved_plant(plant: &Plant) -> Transition {
    Transition::to(Step::ManagePlantAction, Staged::Plant(plant.into())).with_notice(SAVED)
}

/// Applies `action` for `user` whose wizard buffer is `temp`.
pub async fn apply(
    uc: &UseCases,
    user: &User,
    temp: &Temporary,
    action: Action,
) -> Result<Outcome, PlantcareError> {
    let user_id = user.id;
    let step = temp.step;
    let staged = &temp.staged;

    let transition = match action {
        Action::BeginAddGroup => {
            uc.ensure_group_capacity(user_id).await?;
            Transition::to(Step::AddGroupTitle, Staged::Group(StagedGroup::default()))
        }
        Action::ListGroups => Transition::idle(View::Groups),
        Action::BeginAddPlant => {
            if uc.count_user_groups(user_id).await? == 0 {
                return Ok(Outcome::Popup(NO_GROUPS.to_string()));
            }
            Transition::to(Step::AddPlantTitle, Staged::Plant(StagedPlant::default()))
        }
        Action::ListPlantGroups => {
            Transition::to(Step::ManagePlantChooseGroup, Staged::Plant(StagedPlant::default()))
        }
        Action::OpenGroup(id) => {
            let group = uc.manage_group(user_id, id).await?;
            Transition::to(Step::ManageGroupAction, Staged::Group((&group).into()))
        }
        Action::OpenPlant(id) => {
            let plant = uc.manage_plant(user_id, id).await?;
            Transition::to(Step::ManagePlantAction, Staged::Plant((&plant).into()))
        }
        Action::ListPlants(id) => {
            uc.owned_group(user_id, id).await?;
            Transition::to(
                Step::ManagePlantChooseGroup,
                Staged::Plant(StagedPlant {
                    group_id: Some(id),
                    ..StagedPlant::default()
                }),
            )
        }

        Action::ChooseGroup(id) => match step {
            Step::AddPlantGroup => {
                let mut plant = staged_plant(staged)?.clone();
                uc.stage_plant_group(user_id, id, plant.title.as_deref())
                    .await?;
                plant.group_id = Some(id);
                Transition::to(Step::AddPlantPhotoQuestion, Staged::Plant(plant))
            }
            Step::ChangePlantGroup => {
                saved_plant(&uc.move_plant(user_id, plant_id(staged)?, id).await?)
            }
            _ => return Err(unexpected(step, &Action::ChooseGroup(id))),
        },

        Action::Title(text) => match step {
            Step::AddGroupTitle => {
                let mut group = staged_group(staged)?.clone();
                group.title = Some(uc.stage_group_title(user_id, None, &text).await?);
                Transition::to(Step::AddGroupDescription, Staged::Group(group))
            }
            Step::ChangeGroupTitle => {
                saved_group(&uc.update_group_title(user_id, group_id(staged)?, &text).await?)
            }
            Step::AddPlantTitle => {
                let mut plant = staged_plant(staged)?.clone();
                plant.title = Some(validate_plant_title(&text)?);
                Transition::to(Step::AddPlantDescription, Staged::Plant(plant))
            }
            Step::ChangePlantTitle => {
                saved_plant(&uc.update_plant_title(user_id, plant_id(staged)?, &text).await?)
            }
            _ => return Err(unexpected(step, &Action::Title(text))),
        },

        Action::Description(text) => match step {
            Step::AddGroupDescription => {
                let mut group = staged_group(staged)?.clone();
                group.description =
                    Some(validate_description(text.as_deref().unwrap_or_default())?);
                Transition::to(Step::AddGroupLastWatering, Staged::Group(group))
            }
            Step::ChangeGroupDescription => saved_group(
                &uc.update_group_description(user_id, group_id(staged)?, text.as_deref())
                    .await?,
            ),
            Step::AddPlantDescription => {
                let mut plant = staged_plant(staged)?.clone();
                plant.description =
                    Some(validate_description(text.as_deref().unwrap_or_default())?);
                Transition::to(Step::AddPlantGroup, Staged::Plant(plant))
            }
            Step::ChangePlantDescription => saved_plant(
                &uc.update_plant_description(user_id, plant_id(staged)?, text.as_deref())
                    .await?,
            ),
            _ => return Err(unexpected(step, &Action::Description(text))),
        },

        Action::LastWatering(input) => match step {
            Step::AddGroupLastWatering => {
                let mut group = staged_group(staged)?.clone();
                group.last_watering_date = Some(uc.stage_last_watering(&input)?);
                Transition::to(Step::AddGroupInterval, Staged::Group(group))
            }
            Step::ChangeGroupLastWatering => saved_group(
                &uc.update_group_last_watering(user_id, group_id(staged)?, &input)
                    .await?,
            ),
            _ => return Err(unexpected(step, &Action::LastWatering(input))),
        },

        Action::Interval(interval) => match step {
            Step::AddGroupInterval => {
                let mut group = staged_group(staged)?.clone();
                group.watering_interval = Some(validate_interval(interval)?);
                Transition::to(Step::AddGroupConfirm, Staged::Group(group))
            }
            Step::ChangeGroupInterval => saved_group(
                &uc.update_group_interval(user_id, group_id(staged)?, interval)
                    .await?,
            ),
            _ => return Err(unexpected(step, &Action::Interval(interval))),
        },

        Action::AskPhoto => Transition::to(Step::AddPlantPhoto, staged.clone()),
        Action::SkipPhoto => {
            let mut plant = staged_plant(staged)?.clone();
            plant.photo = None;
            Transition::to(Step::AddPlantConfirm, Staged::Plant(plant))
        }
        Action::Photo(bytes) => match step {
            Step::AddPlantPhotoQuestion | Step::AddPlantPhoto => {
                let mut plant = staged_plant(staged)?.clone();
                plant.photo = Some(bytes);
                Transition::to(Step::AddPlantConfirm, Staged::Plant(plant))
            }
            Step::ChangePlantPhoto => {
                saved_plant(&uc.update_plant_photo(user_id, plant_id(staged)?, bytes).await?)
            }
            _ => return Err(unexpected(step, &Action::Photo(bytes))),
        },

        Action::Confirm => match step {
            Step::AddGroupConfirm => {
                let group = uc.confirm_add_group(user_id, staged_group(staged)?).await?;
                Transition::idle(View::Menu).with_notice(format!(
                    "✅ Сценарий «{}» создан. Следующий полив: {}.",
                    group.title,
                    format_date(group.next_watering_date)
                ))
            }
            Step::AddPlantConfirm => {
                let plant = uc.confirm_add_plant(user_id, staged_plant(staged)?).await?;
                Transition::idle(View::Menu)
                    .with_notice(format!("✅ Растение «{}» добавлено.", plant.title))
            }
            _ => return Err(unexpected(step, &Action::Confirm)),
        },

        Action::ShowGroupChange => Transition::to(Step::ManageGroupChange, staged.clone()),
        Action::ShowGroupPlants => Transition::to(Step::ManageGroupSeePlants, staged.clone()),
        Action::ShowPlantChange => Transition::to(Step::ManagePlantChange, staged.clone()),
        Action::EditGroup(field) => Transition::to(group_field_step(field), staged.clone()),
        Action::EditPlant(field) => Transition::to(plant_field_step(field), staged.clone()),

        Action::AskRemoval => match step {
            Step::ManageGroupAction => Transition::to(Step::ManageGroupRemoval, staged.clone()),
            Step::ManagePlantAction => Transition::to(Step::ManagePlantRemoval, staged.clone()),
            _ => return Err(unexpected(step, &Action::AskRemoval)),
        },
        Action::ConfirmRemoval => match step {
            Step::ManageGroupRemoval => {
                let group = uc.delete_group(user_id, group_id(staged)?).await?;
                Transition::idle(View::Menu)
                    .with_notice(format!("🗑 Сценарий «{}» удалён.", group.title))
            }
            Step::ManagePlantRemoval => {
                let plant = uc.delete_plant(user_id, plant_id(staged)?).await?;
                Transition::idle(View::Menu)
                    .with_notice(format!("🗑 Растение «{}» удалено.", plant.title))
            }
            _ => return Err(unexpected(step, &Action::ConfirmRemoval)),
        },
    };

    Ok(Outcome::Transition(transition))
}
