// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic clock.

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use plantcare_core::{Clock, offset_from_hours};

/// A clock that only moves when the test moves it.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
            offset: Utc.fix(),
        }
    }

    /// Noon UTC on `date`, inside the default reminder window.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::at(noon(date, Utc.fix()))
    }

    /// Keeps the instant and reports local dates at `hours` east of UTC.
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Self {
        self.offset = offset_from_hours(hours);
        self
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Jumps to local noon of `date`.
    pub fn set_date(&self, date: NaiveDate) {
        self.set(noon(date, self.offset));
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn utc_offset(&self) -> FixedOffset {
        self.offset
    }
}

fn noon(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
    let local = date.and_time(noon).and_utc();
    local - Duration::seconds(i64::from(offset.local_minus_utc()))
}
