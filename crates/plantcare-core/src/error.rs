// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Plantcare watering bot.

use chrono::NaiveDate;
use thiserror::Error;

/// Input rejected by a domain validator before anything reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title is empty or whitespace-only.
    #[error("title must not be empty")]
    TitleEmpty,

    /// Title exceeds the character limit.
    #[error("title is {actual} characters long, at most {max} allowed")]
    TitleTooLong { max: usize, actual: usize },

    /// Description exceeds the character limit.
    #[error("description is {actual} characters long, at most {max} allowed")]
    DescriptionTooLong { max: usize, actual: usize },

    /// Watering interval is not one of the offered values.
    #[error("watering interval {0} is not allowed")]
    IntervalInvalid(u32),

    /// Last watering date lies after today.
    #[error("last watering date {date} is after today ({today})")]
    LastWateringInFuture { date: NaiveDate, today: NaiveDate },

    /// Free-text date did not match `DD.MM.YYYY`.
    #[error("cannot parse date `{0}`")]
    DateUnparsable(String),

    /// A staged entity is missing a field required for commit.
    #[error("staged entity is missing `{0}`")]
    Incomplete(&'static str),
}

/// Which per-owner limit was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Watering scenarios per user.
    GroupsPerUser(u32),
    /// Plants per watering scenario.
    PlantsPerGroup(u32),
}

/// The primary error type used across all Plantcare adapter traits and core operations.
#[derive(Debug, Error)]
pub enum PlantcareError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// User input failed a domain validator.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The user already owns a watering scenario with this title.
    #[error("group `{title}` already exists")]
    GroupAlreadyExists { title: String },

    /// The watering scenario already holds a plant with this title.
    #[error("plant `{title}` already exists in this group")]
    PlantAlreadyExists { title: String },

    /// A per-owner count limit would be exceeded.
    #[error("limit exceeded: {0:?}")]
    LimitExceeded(Limit),

    /// A referenced row (user, temporary, group, plant) does not exist or is not owned by the caller.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport errors (send, edit, delete failed).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A panic was caught inside a scheduler tick.
    #[error("recovered panic: {0}")]
    Panic(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlantcareError {
    /// Shorthand for a missing row.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        PlantcareError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Errors the user can fix by changing their input. These are shown in chat
    /// and leave the wizard step where it was.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            PlantcareError::Validation(_)
                | PlantcareError::GroupAlreadyExists { .. }
                | PlantcareError::PlantAlreadyExists { .. }
                | PlantcareError::LimitExceeded(_)
        )
    }

    /// Short chat text for a user-facing error, `None` for internal ones.
    pub fn user_message(&self) -> Option<String> {
        let text = match self {
            PlantcareError::Validation(v) => match v {
                ValidationError::TitleEmpty => "Название не может быть пустым.".to_string(),
                ValidationError::TitleTooLong { max, .. } => {
                    format!("Название слишком длинное: не больше {max} символов.")
                }
                ValidationError::DescriptionTooLong { max, .. } => {
                    format!("Описание слишком длинное: не больше {max} символов.")
                }
                ValidationError::IntervalInvalid(_) => {
                    "Выберите интервал из предложенных вариантов.".to_string()
                }
                ValidationError::LastWateringInFuture { .. } => {
                    "Дата последнего полива не может быть в будущем.".to_string()
                }
                ValidationError::DateUnparsable(_) => {
                    "Не удалось распознать дату. Формат: ДД.ММ.ГГГГ.".to_string()
                }
                ValidationError::Incomplete(_) => {
                    "Не все поля заполнены, вернитесь назад и проверьте данные.".to_string()
                }
            },
            PlantcareError::GroupAlreadyExists { title } => {
                format!("Сценарий «{title}» уже существует, выберите другое название.")
            }
            PlantcareError::PlantAlreadyExists { title } => {
                format!("Растение «{title}» уже есть в этом сценарии.")
            }
            PlantcareError::LimitExceeded(Limit::GroupsPerUser(max)) => {
                format!("Можно создать не больше {max} сценариев.")
            }
            PlantcareError::LimitExceeded(Limit::PlantsPerGroup(max)) => {
                format!("В сценарии может быть не больше {max} растений.")
            }
            _ => return None,
        };
        Some(text)
    }
}

impl From<serde_json::Error> for PlantcareError {
    fn from(e: serde_json::Error) -> Self {
        PlantcareError::Storage {
            source: Box::new(e),
        }
    }
}
