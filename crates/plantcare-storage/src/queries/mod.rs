// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions, one module per table.

pub mod groups;
pub mod notifications;
pub mod plants;
pub mod temporary;
pub mod users;
