//! # Error Types
//!
//! Validation error types for slotline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  slotline-core errors (this file)                                      │
//! │  └── ValidationError  - Rejected input, checked before any I/O         │
//! │                                                                         │
//! │  slotline-db errors (separate crate)                                   │
//! │  └── DbError          - Storage operation failures                     │
//! │                                                                         │
//! │  slotline-sync errors (separate crate)                                 │
//! │  └── EngineError      - What callers of the engine see                 │
//! │                                                                         │
//! │  Flow: ValidationError → EngineError → caller                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (date, time, page)
//! 3. Errors are enum variants, never String
//! 4. Validation errors are produced before any storage call is made

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::SlotTime;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These cover every rejection the engine makes without touching storage:
/// malformed times, inverted ranges, duplicates against known state,
/// past-time guards and window bounds.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A time string could not be parsed as `HH:MM` or `HH:MM:SS`.
    #[error("invalid time '{input}': {reason}")]
    InvalidTime { input: String, reason: String },

    /// `from` must be strictly before `to`.
    #[error("invalid time range: {from} must be before {to}")]
    InvalidTimeRange { from: SlotTime, to: SlotTime },

    /// Slot duration must be a positive number of minutes.
    #[error("slot duration must be positive, got {minutes} minutes")]
    NonPositiveDuration { minutes: i64 },

    /// Another slot on the same day already starts at this time.
    #[error("a slot at {time} already exists on {date}")]
    DuplicateSlot { date: NaiveDate, time: SlotTime },

    /// The day lies strictly before today.
    #[error("{date} is in the past")]
    PastDate { date: NaiveDate },

    /// The time is at or before the current time-of-day (today only).
    #[error("{time} on {date} is at or before the current time")]
    PastTime { date: NaiveDate, time: SlotTime },

    /// The first slot of a day requires an explicit start time.
    #[error("a start time is required for the first slot on {date}")]
    StartTimeRequired { date: NaiveDate },

    /// Slots cannot be added to a day that is switched off.
    #[error("{date} is not a working day")]
    DayNotWorking { date: NaiveDate },

    /// Page index outside `[0, MAX_PAGES)`.
    #[error("page {page} is out of range (0..{max})")]
    PageOutOfRange { page: u32, max: u32 },

    /// Day offset outside `[0, PAGE_DAYS)`.
    #[error("day offset {offset} is out of range (0..{max})")]
    OffsetOutOfRange { offset: u32, max: u32 },

    /// Adding the duration to this start time would cross midnight.
    #[error("{time} plus {minutes} minutes crosses midnight")]
    TimeOverflow { time: SlotTime, minutes: i64 },
}

/// Convenience type alias for Results with ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let from = SlotTime::parse("10:00").unwrap();
        let to = SlotTime::parse("09:00").unwrap();
        let err = ValidationError::InvalidTimeRange { from, to };
        assert_eq!(
            err.to_string(),
            "invalid time range: 10:00:00 must be before 09:00:00"
        );

        let err = ValidationError::NonPositiveDuration { minutes: 0 };
        assert_eq!(err.to_string(), "slot duration must be positive, got 0 minutes");
    }

    #[test]
    fn test_duplicate_message_uses_normalized_time() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let time = SlotTime::parse("09:30").unwrap();
        let err = ValidationError::DuplicateSlot { date, time };
        assert_eq!(err.to_string(), "a slot at 09:30:00 already exists on 2026-03-14");
    }
}
