// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Plantcare watering bot.
//!
//! This crate provides the domain model (users, watering scenarios, plants,
//! the wizard buffer, notifications), the pure invariants that govern
//! watering dates, the error taxonomy, and the adapter traits the storage and
//! transport crates implement.

pub mod clock;
pub mod domain;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock, offset_from_hours};
pub use error::{Limit, PlantcareError, ValidationError};
pub use types::{AdapterType, HealthStatus, Step};

// Re-export all adapter traits at crate root.
pub use traits::{ChannelAdapter, PluginAdapter, StorageAdapter};
