// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wizard routing table.
//!
//! [`route`] maps the current [`Step`] and an [`Intent`] to the [`Action`]
//! it triggers; anything not in the table is ignored by the dispatcher.
//! [`back`] gives the previous step of a flow. Both are pure, which keeps
//! the state machine testable without storage or a transport.

use chrono::NaiveDate;
use plantcare_core::types::{ButtonKind, Intent, Staged, StagedPlant, Step};

/// Field selected on a "what to change" screen of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Title,
    Description,
    LastWatering,
    Interval,
}

/// Field selected on a "what to change" screen of a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantField {
    Title,
    Description,
    Group,
    Photo,
}

/// A last-watering date as the user supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    /// Quick-pick button.
    Picked(NaiveDate),
    /// Free text, parsed by the use-case layer.
    Typed(String),
}

/// What an intent asks for. Field inputs (`Title`, `Description`, ...) mean
/// "stage" inside an add flow and "write now" inside a change flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    BeginAddGroup,
    ListGroups,
    BeginAddPlant,
    ListPlantGroups,
    OpenGroup(i64),
    OpenPlant(i64),
    /// Shows the plants of one group while managing plants.
    ListPlants(i64),
    ChooseGroup(i64),

    Title(String),
    /// `None` when the user skipped the description.
    Description(Option<String>),
    LastWatering(DateInput),
    Interval(u32),
    AskPhoto,
    SkipPhoto,
    Photo(Vec<u8>),
    Confirm,

    ShowGroupChange,
    ShowGroupPlants,
    ShowPlantChange,
    EditGroup(GroupField),
    EditPlant(PlantField),
    AskRemoval,
    ConfirmRemoval,
}

/// Which screen to show after a transition into `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Menu,
    Groups,
    /// The screen belonging to the step.
    Step,
}

/// Target of a back transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Back {
    pub step: Step,
    pub staged: Staged,
    pub view: View,
}

fn title_step(step: Step) -> bool {
    matches!(
        step,
        Step::AddGroupTitle | Step::ChangeGroupTitle | Step::AddPlantTitle | Step::ChangePlantTitle
    )
}

fn description_step(step: Step) -> bool {
    matches!(
        step,
        Step::AddGroupDescription
            | Step::ChangeGroupDescription
            | Step::AddPlantDescription
            | Step::ChangePlantDescription
    )
}

fn last_watering_step(step: Step) -> bool {
    matches!(step, Step::AddGroupLastWatering | Step::ChangeGroupLastWatering)
}

fn interval_step(step: Step) -> bool {
    matches!(step, Step::AddGroupInterval | Step::ChangeGroupInterval)
}

fn id(data: &Option<String>) -> Option<i64> {
    data.as_deref()?.parse().ok()
}

/// Looks up the action for `intent` in `step`. `None` means the intent is
/// not accepted here.
pub fn route(step: Step, intent: &Intent) -> Option<Action> {
    match intent {
        Intent::Text(text) if title_step(step) => Some(Action::Title(text.clone())),
        Intent::Text(text) if description_step(step) => {
            Some(Action::Description(Some(text.clone())))
        }
        Intent::Text(text) if last_watering_step(step) => {
            Some(Action::LastWatering(DateInput::Typed(text.clone())))
        }
        Intent::Date(date) if last_watering_step(step) => {
            Some(Action::LastWatering(DateInput::Picked(*date)))
        }
        Intent::Photo(bytes)
            if matches!(
                step,
                Step::AddPlantPhotoQuestion | Step::AddPlantPhoto | Step::ChangePlantPhoto
            ) =>
        {
            Some(Action::Photo(bytes.clone()))
        }
        Intent::Button { kind, data } => route_button(step, *kind, data),
        _ => None,
    }
}

fn route_button(step: Step, kind: ButtonKind, data: &Option<String>) -> Option<Action> {
    use ButtonKind as B;

    if interval_step(step) && kind == B::Interval {
        return data.as_deref()?.parse().ok().map(Action::Interval);
    }
    if description_step(step) && kind == B::SkipDescription {
        return Some(Action::Description(None));
    }

    match (step, kind) {
        (Step::Idle, B::CreateGroup) => Some(Action::BeginAddGroup),
        (Step::Idle, B::MyGroups) => Some(Action::ListGroups),
        (Step::Idle, B::CreatePlant) => Some(Action::BeginAddPlant),
        (Step::Idle, B::MyPlants) => Some(Action::ListPlantGroups),
        (Step::Idle, B::ChooseGroup) => id(data).map(Action::OpenGroup),

        (Step::AddGroupConfirm | Step::AddPlantConfirm, B::Confirm) => Some(Action::Confirm),

        (Step::ManageGroupAction, B::ChangeGroup) => Some(Action::ShowGroupChange),
        (Step::ManageGroupAction, B::DeleteGroup) => Some(Action::AskRemoval),
        (Step::ManageGroupAction, B::SeePlants) => Some(Action::ShowGroupPlants),

        (Step::ManageGroupChange, B::EditTitle) => Some(Action::EditGroup(GroupField::Title)),
        (Step::ManageGroupChange, B::EditDescription) => {
            Some(Action::EditGroup(GroupField::Description))
        }
        (Step::ManageGroupChange, B::EditLastWatering) => {
            Some(Action::EditGroup(GroupField::LastWatering))
        }
        (Step::ManageGroupChange, B::EditInterval) => {
            Some(Action::EditGroup(GroupField::Interval))
        }

        (Step::ManageGroupRemoval | Step::ManagePlantRemoval, B::ConfirmRemoval) => {
            Some(Action::ConfirmRemoval)
        }
        (Step::ManageGroupSeePlants, B::ChoosePlant) => id(data).map(Action::OpenPlant),

        (Step::AddPlantGroup | Step::ChangePlantGroup, B::ChooseGroup) => {
            id(data).map(Action::ChooseGroup)
        }
        (Step::AddPlantPhotoQuestion, B::PhotoYes) => Some(Action::AskPhoto),
        (Step::AddPlantPhotoQuestion, B::PhotoNo) => Some(Action::SkipPhoto),

        (Step::ManagePlantChooseGroup, B::ChooseGroup) => id(data).map(Action::ListPlants),
        (Step::ManagePlantChooseGroup, B::ChoosePlant) => id(data).map(Action::OpenPlant),

        (Step::ManagePlantAction, B::ChangePlant) => Some(Action::ShowPlantChange),
        (Step::ManagePlantAction, B::DeletePlant) => Some(Action::AskRemoval),

        (Step::ManagePlantChange, B::EditTitle) => Some(Action::EditPlant(PlantField::Title)),
        (Step::ManagePlantChange, B::EditDescription) => {
            Some(Action::EditPlant(PlantField::Description))
        }
        (Step::ManagePlantChange, B::EditGroup) => Some(Action::EditPlant(PlantField::Group)),
        (Step::ManagePlantChange, B::EditPhoto) => Some(Action::EditPlant(PlantField::Photo)),

        _ => None,
    }
}

/// The step a group field is edited in.
pub fn group_field_step(field: GroupField) -> Step {
    match field {
        GroupField::Title => Step::ChangeGroupTitle,
        GroupField::Description => Step::ChangeGroupDescription,
        GroupField::LastWatering => Step::ChangeGroupLastWatering,
        GroupField::Interval => Step::ChangeGroupInterval,
    }
}

/// The step a plant field is edited in.
pub fn plant_field_step(field: PlantField) -> Step {
    match field {
        PlantField::Title => Step::ChangePlantTitle,
        PlantField::Description => Step::ChangePlantDescription,
        PlantField::Group => Step::ChangePlantGroup,
        PlantField::Photo => Step::ChangePlantPhoto,
    }
}

/// Previous step of the flow `step` belongs to. The staged payload is kept
/// unless the transition leaves the flow.
pub fn back(step: Step, staged: &Staged) -> Back {
    let within = |step: Step| Back {
        step,
        staged: staged.clone(),
        view: View::Step,
    };
    let leave = |view: View| Back {
        step: Step::Idle,
        staged: Staged::None,
        view,
    };

    match step {
        Step::Idle | Step::AddGroupTitle | Step::AddPlantTitle => leave(View::Menu),

        Step::AddGroupDescription => within(Step::AddGroupTitle),
        Step::AddGroupLastWatering => within(Step::AddGroupDescription),
        Step::AddGroupInterval => within(Step::AddGroupLastWatering),
        Step::AddGroupConfirm => within(Step::AddGroupInterval),

        Step::ManageGroupAction => leave(View::Groups),
        Step::ManageGroupChange | Step::ManageGroupRemoval | Step::ManageGroupSeePlants => {
            within(Step::ManageGroupAction)
        }
        Step::ChangeGroupTitle
        | Step::ChangeGroupDescription
        | Step::ChangeGroupLastWatering
        | Step::ChangeGroupInterval => within(Step::ManageGroupChange),

        Step::AddPlantDescription => within(Step::AddPlantTitle),
        Step::AddPlantGroup => within(Step::AddPlantDescription),
        Step::AddPlantPhotoQuestion => within(Step::AddPlantGroup),
        Step::AddPlantPhoto | Step::AddPlantConfirm => within(Step::AddPlantPhotoQuestion),

        // With a group picked the plant list is showing; go back to the group list.
        Step::ManagePlantChooseGroup => match staged.plant() {
            Some(plant) if plant.group_id.is_some() => Back {
                step: Step::ManagePlantChooseGroup,
                staged: Staged::Plant(StagedPlant::default()),
                view: View::Step,
            },
            _ => leave(View::Menu),
        },
        Step::ManagePlantAction => Back {
            step: Step::ManagePlantChooseGroup,
            staged: Staged::Plant(StagedPlant {
                group_id: staged.plant().and_then(|p| p.group_id),
                ..StagedPlant::default()
            }),
            view: View::Step,
        },
        Step::ManagePlantChange | Step::ManagePlantRemoval => within(Step::ManagePlantAction),
        Step::ChangePlantTitle
        | Step::ChangePlantDescription
        | Step::ChangePlantGroup
        | Step::ChangePlantPhoto => within(Step::ManagePlantChange),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantcare_core::types::StagedGroup;

    const ALL_STEPS: [Step; 28] = [
        Step::Idle,
        Step::AddGroupTitle,
        Step::AddGroupDescription,
        Step::AddGroupLastWatering,
        Step::AddGroupInterval,
        Step::AddGroupConfirm,
        Step::ManageGroupAction,
        Step::ManageGroupChange,
        Step::ChangeGroupTitle,
        Step::ChangeGroupDescription,
        Step::ChangeGroupLastWatering,
        Step::ChangeGroupInterval,
        Step::ManageGroupRemoval,
        Step::ManageGroupSeePlants,
        Step::AddPlantTitle,
        Step::AddPlantDescription,
        Step::AddPlantGroup,
        Step::AddPlantPhotoQuestion,
        Step::AddPlantPhoto,
        Step::AddPlantConfirm,
        Step::ManagePlantChooseGroup,
        Step::ManagePlantAction,
        Step::ManagePlantChange,
        Step::ChangePlantTitle,
        Step::ChangePlantDescription,
        Step::ChangePlantGroup,
        Step::ChangePlantPhoto,
        Step::ManagePlantRemoval,
    ];

    fn button(kind: ButtonKind, data: Option<&str>) -> Intent {
        Intent::Button {
            kind,
            data: data.map(str::to_string),
        }
    }

    fn staged_group() -> Staged {
        Staged::Group(StagedGroup {
            id: None,
            title: Some("Kitchen".into()),
            description: Some("➖".into()),
            last_watering_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            watering_interval: Some(7),
        })
    }

    #[test]
    fn text_is_a_title_only_in_title_steps() {
        let text = Intent::Text("Kitchen".into());
        assert_eq!(
            route(Step::AddGroupTitle, &text),
            Some(Action::Title("Kitchen".into()))
        );
        assert_eq!(
            route(Step::ChangePlantTitle, &text),
            Some(Action::Title("Kitchen".into()))
        );
        assert_eq!(route(Step::Idle, &text), None);
        assert_eq!(route(Step::AddGroupConfirm, &text), None);
    }

    #[test]
    fn skip_description_in_description_steps() {
        let skip = button(ButtonKind::SkipDescription, None);
        assert_eq!(
            route(Step::AddGroupDescription, &skip),
            Some(Action::Description(None))
        );
        assert_eq!(
            route(Step::ChangePlantDescription, &skip),
            Some(Action::Description(None))
        );
        assert_eq!(route(Step::AddGroupTitle, &skip), None);
    }

    #[test]
    fn dates_picked_or_typed() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(
            route(Step::AddGroupLastWatering, &Intent::Date(date)),
            Some(Action::LastWatering(DateInput::Picked(date)))
        );
        assert_eq!(
            route(Step::ChangeGroupLastWatering, &Intent::Text("01.06.2024".into())),
            Some(Action::LastWatering(DateInput::Typed("01.06.2024".into())))
        );
        assert_eq!(route(Step::AddGroupInterval, &Intent::Date(date)), None);
    }

    #[test]
    fn interval_buttons_carry_the_value() {
        assert_eq!(
            route(Step::AddGroupInterval, &button(ButtonKind::Interval, Some("7"))),
            Some(Action::Interval(7))
        );
        assert_eq!(
            route(Step::AddGroupInterval, &button(ButtonKind::Interval, Some("x"))),
            None
        );
        assert_eq!(
            route(Step::AddGroupTitle, &button(ButtonKind::Interval, Some("7"))),
            None
        );
    }

    #[test]
    fn choose_group_depends_on_step() {
        let choose = button(ButtonKind::ChooseGroup, Some("5"));
        assert_eq!(route(Step::Idle, &choose), Some(Action::OpenGroup(5)));
        assert_eq!(route(Step::AddPlantGroup, &choose), Some(Action::ChooseGroup(5)));
        assert_eq!(route(Step::ChangePlantGroup, &choose), Some(Action::ChooseGroup(5)));
        assert_eq!(
            route(Step::ManagePlantChooseGroup, &choose),
            Some(Action::ListPlants(5))
        );
        assert_eq!(
            route(Step::Idle, &button(ButtonKind::ChooseGroup, None)),
            None
        );
    }

    #[test]
    fn photos_only_where_expected() {
        let photo = Intent::Photo(vec![1]);
        assert_eq!(
            route(Step::AddPlantPhoto, &photo),
            Some(Action::Photo(vec![1]))
        );
        assert_eq!(
            route(Step::AddPlantPhotoQuestion, &photo),
            Some(Action::Photo(vec![1]))
        );
        assert_eq!(route(Step::AddPlantTitle, &photo), None);
    }

    #[test]
    fn fixed_buttons_are_not_in_the_table() {
        for step in ALL_STEPS {
            for kind in [ButtonKind::Menu, ButtonKind::Back, ButtonKind::Watered] {
                assert_eq!(route(step, &button(kind, Some("1"))), None, "{step} {kind}");
            }
        }
    }

    #[test]
    fn back_within_add_flows_keeps_staged_payload() {
        let staged = staged_group();
        for step in [
            Step::AddGroupDescription,
            Step::AddGroupLastWatering,
            Step::AddGroupInterval,
            Step::AddGroupConfirm,
            Step::AddPlantDescription,
            Step::AddPlantGroup,
            Step::AddPlantPhotoQuestion,
            Step::AddPlantPhoto,
            Step::AddPlantConfirm,
        ] {
            let target = back(step, &staged);
            assert_eq!(target.staged, staged, "{step}");
            assert_eq!(target.view, View::Step);
            assert_ne!(target.step, step);
        }
    }

    #[test]
    fn back_from_flow_entry_leaves_the_flow() {
        for step in [Step::Idle, Step::AddGroupTitle, Step::AddPlantTitle] {
            let target = back(step, &staged_group());
            assert_eq!(target.step, Step::Idle);
            assert_eq!(target.staged, Staged::None);
            assert_eq!(target.view, View::Menu);
        }
        assert_eq!(
            back(Step::ManageGroupAction, &staged_group()).view,
            View::Groups
        );
    }

    #[test]
    fn back_in_plant_management() {
        let picked = Staged::Plant(StagedPlant {
            group_id: Some(4),
            ..StagedPlant::default()
        });
        let target = back(Step::ManagePlantChooseGroup, &picked);
        assert_eq!(target.step, Step::ManagePlantChooseGroup);
        assert_eq!(target.staged, Staged::Plant(StagedPlant::default()));

        let target = back(Step::ManagePlantChooseGroup, &target.staged);
        assert_eq!(target.step, Step::Idle);

        let card = Staged::Plant(StagedPlant {
            id: Some(9),
            group_id: Some(4),
            title: Some("Rose".into()),
            ..StagedPlant::default()
        });
        let target = back(Step::ManagePlantAction, &card);
        assert_eq!(target.step, Step::ManagePlantChooseGroup);
        assert_eq!(target.staged, picked);
    }

    #[test]
    fn every_step_has_a_back_target() {
        for step in ALL_STEPS {
            let target = back(step, &Staged::None);
            // Repeated Back always reaches Idle.
            let mut current = target;
            for _ in 0..ALL_STEPS.len() {
                if current.step == Step::Idle {
                    break;
                }
                current = back(current.step, &current.staged);
            }
            assert_eq!(current.step, Step::Idle, "stuck starting from {step}");
        }
    }

    #[test]
    fn field_steps() {
        assert_eq!(group_field_step(GroupField::Interval), Step::ChangeGroupInterval);
        assert_eq!(plant_field_step(PlantField::Group), Step::ChangePlantGroup);
        assert_eq!(
            route(Step::ManageGroupChange, &button(ButtonKind::EditInterval, None)),
            Some(Action::EditGroup(GroupField::Interval))
        );
    }
}
