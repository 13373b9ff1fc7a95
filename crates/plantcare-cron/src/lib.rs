// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Watering reminder scheduler.
//!
//! A single background task wakes every `scheduler.interval_secs`, picks up a
//! page of scenarios whose next watering date has come, and sends each owner a
//! reminder with a "watered" button. Every delivery is recorded, so a scenario
//! is reminded at most once per day.

pub mod recording;
pub mod scheduler;

pub use scheduler::{NotificationScheduler, TickOutcome, TickReport};
