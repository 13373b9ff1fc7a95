// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain entities, wizard state, and the transport-neutral message types
//! exchanged between the core and a channel adapter.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

// --- Users ---

/// Chat profile as reported by the transport, used to upsert a [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub is_bot: bool,
}

/// A stored chat participant. `telegram_id` is the external lookup key,
/// `id` the foreign-key target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub is_bot: bool,
    pub created_at: String,
}

// --- Watering scenarios ---

/// A watering scenario: a cadence shared by a set of plants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub last_watering_date: NaiveDate,
    pub watering_interval: u32,
    /// Always `last_watering_date + watering_interval`; recomputed by storage on write.
    pub next_watering_date: NaiveDate,
}

/// Fields needed to create a [`Group`]. The next watering date is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub last_watering_date: NaiveDate,
    pub watering_interval: u32,
}

// --- Plants ---

/// A plant, member of exactly one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plant {
    pub id: i64,
    pub user_id: i64,
    pub group_id: i64,
    pub title: String,
    pub description: String,
    /// Photo bytes. `None` means the default image is shown.
    pub photo: Option<Vec<u8>>,
}

/// Fields needed to create a [`Plant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlant {
    pub user_id: i64,
    pub group_id: i64,
    pub title: String,
    pub description: String,
    pub photo: Option<Vec<u8>>,
}

// --- Notifications ---

/// Append-only record of a dispatched reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: i64,
    pub group_id: i64,
    pub message_id: i32,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// A reminder that was just delivered and is about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub group_id: i64,
    pub message_id: i32,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    /// The scheduler day the reminder counts against.
    pub sent_on: NaiveDate,
}

/// Keyset position in the due-scenario ordering `(next_watering_date, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NotifyCursor {
    pub next_watering_date: NaiveDate,
    pub group_id: i64,
}

impl From<&Group> for NotifyCursor {
    fn from(group: &Group) -> Self {
        Self {
            next_watering_date: group.next_watering_date,
            group_id: group.id,
        }
    }
}

// --- Wizard state ---

/// Step of the per-user conversational wizard.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
pub enum Step {
    #[default]
    #[strum(serialize = "Idle")]
    Idle,

    #[strum(serialize = "AddGroup.Title")]
    AddGroupTitle,
    #[strum(serialize = "AddGroup.Description")]
    AddGroupDescription,
    #[strum(serialize = "AddGroup.LastWatering")]
    AddGroupLastWatering,
    #[strum(serialize = "AddGroup.Interval")]
    AddGroupInterval,
    #[strum(serialize = "AddGroup.Confirm")]
    AddGroupConfirm,

    #[strum(serialize = "ManageGroup.Action")]
    ManageGroupAction,
    #[strum(serialize = "ManageGroup.Change")]
    ManageGroupChange,
    #[strum(serialize = "ChangeGroup.Title")]
    ChangeGroupTitle,
    #[strum(serialize = "ChangeGroup.Description")]
    ChangeGroupDescription,
    #[strum(serialize = "ChangeGroup.LastWatering")]
    ChangeGroupLastWatering,
    #[strum(serialize = "ChangeGroup.Interval")]
    ChangeGroupInterval,
    #[strum(serialize = "ManageGroup.Removal")]
    ManageGroupRemoval,
    #[strum(serialize = "ManageGroup.SeePlants")]
    ManageGroupSeePlants,

    #[strum(serialize = "AddPlant.Title")]
    AddPlantTitle,
    #[strum(serialize = "AddPlant.Description")]
    AddPlantDescription,
    #[strum(serialize = "AddPlant.Group")]
    AddPlantGroup,
    #[strum(serialize = "AddPlant.PhotoQuestion")]
    AddPlantPhotoQuestion,
    #[strum(serialize = "AddPlant.Photo")]
    AddPlantPhoto,
    #[strum(serialize = "AddPlant.Confirm")]
    AddPlantConfirm,

    #[strum(serialize = "ManagePlant.ChooseGroup")]
    ManagePlantChooseGroup,
    #[strum(serialize = "ManagePlant.Action")]
    ManagePlantAction,
    #[strum(serialize = "ManagePlant.Change")]
    ManagePlantChange,
    #[strum(serialize = "ChangePlant.Title")]
    ChangePlantTitle,
    #[strum(serialize = "ChangePlant.Description")]
    ChangePlantDescription,
    #[strum(serialize = "ChangePlant.Group")]
    ChangePlantGroup,
    #[strum(serialize = "ChangePlant.Photo")]
    ChangePlantPhoto,
    #[strum(serialize = "ManagePlant.Removal")]
    ManagePlantRemoval,
}

/// A group being created or edited, one field per wizard step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedGroup {
    /// Set when editing an existing group.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub last_watering_date: Option<NaiveDate>,
    #[serde(default)]
    pub watering_interval: Option<u32>,
}

impl From<&Group> for StagedGroup {
    fn from(group: &Group) -> Self {
        Self {
            id: Some(group.id),
            title: Some(group.title.clone()),
            description: Some(group.description.clone()),
            last_watering_date: Some(group.last_watering_date),
            watering_interval: Some(group.watering_interval),
        }
    }
}

/// A plant being created or edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedPlant {
    /// Set when editing an existing plant.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "base64_bytes")]
    pub photo: Option<Vec<u8>>,
}

impl From<&Plant> for StagedPlant {
    fn from(plant: &Plant) -> Self {
        Self {
            id: Some(plant.id),
            group_id: Some(plant.group_id),
            title: Some(plant.title.clone()),
            description: Some(plant.description.clone()),
            photo: plant.photo.clone(),
        }
    }
}

/// Staged edits buffered between chat turns. Which variant is valid is
/// determined by the current [`Step`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Staged {
    #[default]
    None,
    Group(StagedGroup),
    Plant(StagedPlant),
}

impl Staged {
    pub fn group(&self) -> Option<&StagedGroup> {
        match self {
            Staged::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn plant(&self) -> Option<&StagedPlant> {
        match self {
            Staged::Plant(p) => Some(p),
            _ => None,
        }
    }
}

/// Per-user wizard buffer. At most one exists per user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Temporary {
    pub user_id: i64,
    pub step: Step,
    pub staged: Staged,
    /// The bot message currently showing the wizard screen, deleted on the next transition.
    pub pending_message_id: Option<i32>,
}

impl Temporary {
    /// A fresh buffer in the `Idle` step.
    pub fn idle(user_id: i64) -> Self {
        Self {
            user_id,
            step: Step::Idle,
            staged: Staged::None,
            pending_message_id: None,
        }
    }
}

// --- Transport-neutral messages ---

/// Handle of a message the transport delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Stable routing tag of an inline button. Per-instance parameters go into
/// [`Button::data`], so one tag per kind is enough.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ButtonKind {
    Menu,
    Back,
    CreateGroup,
    MyGroups,
    CreatePlant,
    MyPlants,
    SkipDescription,
    Date,
    Interval,
    Confirm,
    ChooseGroup,
    ChoosePlant,
    ChangeGroup,
    DeleteGroup,
    SeePlants,
    ChangePlant,
    DeletePlant,
    EditTitle,
    EditDescription,
    EditLastWatering,
    EditInterval,
    EditGroup,
    EditPhoto,
    ConfirmRemoval,
    PhotoYes,
    PhotoNo,
    Watered,
}

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub kind: ButtonKind,
    pub data: Option<String>,
}

impl Button {
    pub fn new(label: impl Into<String>, kind: ButtonKind) -> Self {
        Self {
            label: label.into(),
            kind,
            data: None,
        }
    }

    pub fn with_data(label: impl Into<String>, kind: ButtonKind, data: impl ToString) -> Self {
        Self {
            label: label.into(),
            kind,
            data: Some(data.to_string()),
        }
    }

    /// Wire form `<kind>` or `<kind>:<data>`.
    pub fn callback_data(&self) -> String {
        match &self.data {
            Some(data) => format!("{}:{data}", self.kind),
            None => self.kind.to_string(),
        }
    }
}

/// Inline keyboard as rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row; empty rows are dropped.
    pub fn row(mut self, row: Vec<Button>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    pub fn find(&self, kind: ButtonKind) -> Option<&Button> {
        self.buttons().find(|b| b.kind == kind)
    }
}

/// Media attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Media {
    /// Caption-only message.
    None,
    /// Screen image looked up by key in the transport's asset catalog.
    Asset(&'static str),
    /// Raw image bytes, e.g. a plant photo.
    Photo(Vec<u8>),
}

/// A rendered screen addressed to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub media: Media,
    pub caption: String,
    pub keyboard: Keyboard,
}

/// Classified inbound event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Text(String),
    Photo(Vec<u8>),
    Button {
        kind: ButtonKind,
        data: Option<String>,
    },
    Date(NaiveDate),
}

/// Discriminant of [`Intent`], used for routing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum IntentKind {
    Text,
    Photo,
    Button,
    Date,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Text(_) => IntentKind::Text,
            Intent::Photo(_) => IntentKind::Photo,
            Intent::Button { .. } => IntentKind::Button,
            Intent::Date(_) => IntentKind::Date,
        }
    }

    /// Parses button callback data. The `date` kind becomes [`Intent::Date`].
    /// Returns `None` for unknown kinds or malformed dates.
    pub fn from_callback_data(raw: &str) -> Option<Self> {
        let (kind, data) = match raw.split_once(':') {
            Some((kind, data)) => (kind, Some(data.to_string())),
            None => (raw, None),
        };
        let kind: ButtonKind = kind.parse().ok()?;
        if kind == ButtonKind::Date {
            let date = NaiveDate::parse_from_str(data.as_deref()?, "%Y-%m-%d").ok()?;
            return Some(Intent::Date(date));
        }
        Some(Intent::Button { kind, data })
    }
}

/// An inbound transport event after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender: UserProfile,
    pub chat_id: i64,
    /// The inbound message, or the message carrying the pressed button.
    pub message_id: Option<i32>,
    /// Set for button presses; must be answered once.
    pub callback_id: Option<String>,
    pub intent: Intent,
}

/// Serde adapter storing optional bytes as a base64 string inside JSON.
mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|e| STANDARD.decode(e).map_err(serde::de::Error::custom))
            .transpose()
    }
}
