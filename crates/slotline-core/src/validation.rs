//! # Validation Module
//!
//! Input validation rules for the scheduling engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (pure, before any storage call)                   │
//! │  ├── Range/duration preconditions                                       │
//! │  ├── Past-date and past-time guards                                     │
//! │  └── Page/offset bounds                                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: slotline-db (SQLite)                                          │
//! │  ├── UNIQUE (provider, date, start) constraint                          │
//! │  └── is_booked guards inside UPDATE/DELETE statements                   │
//! │                                                                         │
//! │  Defense in depth: the pre-check gives fast typed rejections, the       │
//! │  constraint catches races the pre-check cannot see                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers pass `today` / `now` explicitly - this crate never reads a clock.

use chrono::NaiveDate;

use crate::error::{ValidationError, ValidationResult};
use crate::types::SlotTime;
use crate::{MAX_PAGES, PAGE_DAYS};

/// Validates that a slot duration is a positive number of minutes.
pub fn validate_duration(minutes: i64) -> ValidationResult<()> {
    if minutes <= 0 {
        return Err(ValidationError::NonPositiveDuration { minutes });
    }
    Ok(())
}

/// Validates that `from` is strictly before `to`.
pub fn validate_time_range(from: SlotTime, to: SlotTime) -> ValidationResult<()> {
    if from >= to {
        return Err(ValidationError::InvalidTimeRange { from, to });
    }
    Ok(())
}

/// Past-time guard for ad-hoc slot adds.
///
/// ## Rules
/// - `date` strictly before `today` → `PastDate`
/// - `date == today` and `time` at or before `now` → `PastTime`
/// - future dates are never filtered, whatever the time
pub fn validate_add_time(
    date: NaiveDate,
    time: SlotTime,
    today: NaiveDate,
    now: SlotTime,
) -> ValidationResult<()> {
    if date < today {
        return Err(ValidationError::PastDate { date });
    }
    if date == today && time <= now {
        return Err(ValidationError::PastTime { date, time });
    }
    Ok(())
}

/// Validates a page index against `[0, MAX_PAGES)`.
pub fn validate_page(page: u32) -> ValidationResult<()> {
    if page >= MAX_PAGES {
        return Err(ValidationError::PageOutOfRange {
            page,
            max: MAX_PAGES,
        });
    }
    Ok(())
}

/// Validates a day offset against `[0, PAGE_DAYS)`.
pub fn validate_offset(offset: u32) -> ValidationResult<()> {
    if offset >= PAGE_DAYS {
        return Err(ValidationError::OffsetOutOfRange {
            offset,
            max: PAGE_DAYS,
        });
    }
    Ok(())
}

/// Computes `start + duration`, rejecting results that cross midnight.
pub fn slot_end(start: SlotTime, duration_minutes: i64) -> ValidationResult<SlotTime> {
    start
        .add_minutes(duration_minutes)
        .ok_or(ValidationError::TimeOverflow {
            time: start,
            minutes: duration_minutes,
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn t(input: &str) -> SlotTime {
        SlotTime::parse(input).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration(30).is_ok());
        assert!(validate_duration(1).is_ok());
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(-10).is_err());
    }

    #[test]
    fn test_validate_time_range() {
        assert!(validate_time_range(t("09:00"), t("17:00")).is_ok());
        assert!(validate_time_range(t("09:00"), t("09:00")).is_err());
        assert!(validate_time_range(t("17:00"), t("09:00")).is_err());
    }

    #[test]
    fn test_validate_add_time_guards() {
        let today = date(2026, 3, 14);
        let now = t("12:00");

        // yesterday rejected outright
        assert!(matches!(
            validate_add_time(date(2026, 3, 13), t("18:00"), today, now),
            Err(ValidationError::PastDate { .. })
        ));

        // today: at or before now rejected, after now accepted
        assert!(matches!(
            validate_add_time(today, t("12:00"), today, now),
            Err(ValidationError::PastTime { .. })
        ));
        assert!(validate_add_time(today, t("12:01"), today, now).is_ok());

        // tomorrow: any time accepted
        assert!(validate_add_time(date(2026, 3, 15), t("00:30"), today, now).is_ok());
    }

    #[test]
    fn test_page_and_offset_bounds() {
        assert!(validate_page(0).is_ok());
        assert!(validate_page(MAX_PAGES - 1).is_ok());
        assert!(validate_page(MAX_PAGES).is_err());

        assert!(validate_offset(0).is_ok());
        assert!(validate_offset(PAGE_DAYS - 1).is_ok());
        assert!(validate_offset(PAGE_DAYS).is_err());
    }

    #[test]
    fn test_slot_end() {
        assert_eq!(slot_end(t("09:00"), 60).unwrap(), t("10:00"));
        assert!(matches!(
            slot_end(t("23:30"), 60),
            Err(ValidationError::TimeOverflow { .. })
        ));
    }
}
