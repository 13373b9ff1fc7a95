// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure domain invariants for watering scenarios and plants.
//!
//! Every mutating use-case funnels its input through these validators before
//! calling storage. Storage in turn derives the next watering date with
//! [`compute_next_watering`] so the derived column can never drift.

use chrono::{Days, NaiveDate};

use crate::error::ValidationError;

/// Maximum length of group and plant titles, in characters.
pub const MAX_TITLE_CHARS: usize = 50;

/// Maximum length of a description, in characters. Keeps entity cards under
/// the transport's photo caption limit.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Watering intervals (days) a user may choose.
pub const ALLOWED_INTERVALS: [u32; 12] = [1, 2, 3, 4, 5, 6, 7, 10, 14, 18, 21, 30];

/// Description placeholder stored when the user skips the description.
pub const EMPTY_DESCRIPTION: &str = "➖";

/// `last + interval` days.
pub fn compute_next_watering(last: NaiveDate, interval: u32) -> NaiveDate {
    last.checked_add_days(Days::new(u64::from(interval)))
        .unwrap_or(NaiveDate::MAX)
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong {
            max: MAX_TITLE_CHARS,
            actual: chars,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates a group title and returns it trimmed.
pub fn validate_group_title(title: &str) -> Result<String, ValidationError> {
    validate_title(title)
}

/// Validates a plant title and returns it trimmed.
pub fn validate_plant_title(title: &str) -> Result<String, ValidationError> {
    validate_title(title)
}

/// Validates a description and returns it trimmed. Blank input becomes
/// [`EMPTY_DESCRIPTION`].
pub fn validate_description(description: &str) -> Result<String, ValidationError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Ok(EMPTY_DESCRIPTION.to_string());
    }
    let chars = trimmed.chars().count();
    if chars > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_CHARS,
            actual: chars,
        });
    }
    Ok(trimmed.to_string())
}

pub fn validate_interval(interval: u32) -> Result<u32, ValidationError> {
    if ALLOWED_INTERVALS.contains(&interval) {
        Ok(interval)
    } else {
        Err(ValidationError::IntervalInvalid(interval))
    }
}

/// The last watering can be today at the latest.
pub fn validate_last_watering(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    if date > today {
        return Err(ValidationError::LastWateringInFuture { date, today });
    }
    Ok(date)
}

/// Parses a typed date. Accepts `DD.MM.YYYY` and ISO `YYYY-MM-DD`.
pub fn parse_user_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| ValidationError::DateUnparsable(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn next_watering_adds_interval_days() {
        assert_eq!(compute_next_watering(ymd(2024, 6, 1), 7), ymd(2024, 6, 8));
        assert_eq!(compute_next_watering(ymd(2024, 2, 28), 1), ymd(2024, 2, 29));
        assert_eq!(compute_next_watering(ymd(2024, 12, 25), 10), ymd(2025, 1, 4));
    }

    #[test]
    fn titles_are_trimmed_and_bounded() {
        assert_eq!(validate_group_title("  Kitchen ").unwrap(), "Kitchen");
        assert_eq!(validate_plant_title("   "), Err(ValidationError::TitleEmpty));
        let long = "ф".repeat(51);
        assert_eq!(
            validate_group_title(&long),
            Err(ValidationError::TitleTooLong { max: 50, actual: 51 })
        );
        // Fifty Cyrillic characters are fine even though they are 100 bytes.
        assert!(validate_group_title(&"ф".repeat(50)).is_ok());
    }

    #[test]
    fn blank_description_becomes_placeholder() {
        assert_eq!(validate_description("").unwrap(), EMPTY_DESCRIPTION);
        assert_eq!(validate_description(" sunny sill ").unwrap(), "sunny sill");
        assert!(validate_description(&"x".repeat(501)).is_err());
    }

    #[test]
    fn only_offered_intervals_pass() {
        for n in ALLOWED_INTERVALS {
            assert_eq!(validate_interval(n), Ok(n));
        }
        assert_eq!(validate_interval(0), Err(ValidationError::IntervalInvalid(0)));
        assert_eq!(validate_interval(8), Err(ValidationError::IntervalInvalid(8)));
    }

    #[test]
    fn last_watering_not_in_future() {
        let today = ymd(2024, 6, 10);
        assert!(validate_last_watering(today, today).is_ok());
        assert!(validate_last_watering(ymd(2024, 6, 1), today).is_ok());
        assert_eq!(
            validate_last_watering(ymd(2024, 6, 11), today),
            Err(ValidationError::LastWateringInFuture {
                date: ymd(2024, 6, 11),
                today
            })
        );
    }

    #[test]
    fn typed_dates() {
        assert_eq!(parse_user_date("01.06.2024").unwrap(), ymd(2024, 6, 1));
        assert_eq!(parse_user_date(" 2024-06-01 ").unwrap(), ymd(2024, 6, 1));
        assert!(matches!(
            parse_user_date("yesterday"),
            Err(ValidationError::DateUnparsable(_))
        ));
    }

    proptest! {
        #[test]
        fn next_watering_is_last_plus_interval(
            days_from_epoch in 0i64..40_000,
            idx in 0usize..ALLOWED_INTERVALS.len(),
        ) {
            let last = ymd(1970, 1, 1) + chrono::Duration::days(days_from_epoch);
            let interval = ALLOWED_INTERVALS[idx];
            let next = compute_next_watering(last, interval);
            prop_assert_eq!((next - last).num_days(), i64::from(interval));
        }
    }
}
