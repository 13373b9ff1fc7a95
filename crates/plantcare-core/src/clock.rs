// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time source shared by the use-case layer and the scheduler.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Source of the current instant.
///
/// Domain dates are calendar days at the clock's UTC offset. The use-case
/// layer and the scheduler read the same offset, so "today" means one day for
/// watering confirmation, the due query and the reminder record.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    /// Offset of the owners' local time. UTC unless overridden.
    fn utc_offset(&self) -> FixedOffset {
        Utc.fix()
    }

    fn local_now(&self) -> DateTime<FixedOffset> {
        self.now().with_timezone(&self.utc_offset())
    }

    /// Today's local date.
    fn today(&self) -> NaiveDate {
        self.local_now().date_naive()
    }
}

/// Converts whole hours east of UTC into an offset, falling back to UTC when
/// out of range.
pub fn offset_from_hours(hours: i32) -> FixedOffset {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn with_utc_offset_hours(hours: i32) -> Self {
        Self {
            offset: offset_from_hours(hours),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self { offset: Utc.fix() }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn utc_offset(&self) -> FixedOffset {
        self.offset
    }
}
