// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Plantcare integration tests.
//!
//! Provides a mock transport, a settable clock and a harness that wires the
//! dispatcher and the reminder scheduler to a temp SQLite database, so whole
//! conversations run without Telegram.
//!
//! # Components
//!
//! - [`MockChannel`] - records every send, edit, delete and callback answer
//! - [`FixedClock`] - clock pinned to an instant the test controls
//! - [`TestHarness`] - full stack driven by chat-level helpers

pub mod clock;
pub mod harness;
pub mod mock_channel;

pub use clock::FixedClock;
pub use harness::TestHarness;
pub use mock_channel::MockChannel;
