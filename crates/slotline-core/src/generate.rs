//! # Slot Generator
//!
//! Pure functions turning a time range + duration into candidate start
//! times, plus the current-day past-filter and the "next slot" suggestion.
//!
//! ## Generation Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  generate_slots("09:00", "10:00", 30)                                   │
//! │                                                                         │
//! │  09:00 ──┬── 09:30 ──┬── 10:00                                          │
//! │          │           │                                                  │
//! │       emitted     emitted    a 10:00 start is NOT emitted:              │
//! │                              10:00 + 30min > to                         │
//! │                                                                         │
//! │  Result: ["09:00:00", "09:30:00"]                                       │
//! │                                                                         │
//! │  Window shorter than one duration → empty result (valid, not an error)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationResult;
use crate::types::{Slot, SlotTime};
use crate::validation::{validate_duration, validate_time_range};
use crate::SLOT_SUGGEST_GAP_MINUTES;

/// Generates candidate start times stepping by `duration_minutes`.
///
/// ## Preconditions
/// `from < to` and `duration_minutes > 0`; violations are validation
/// errors, not generation behavior.
///
/// ## Guarantee
/// The last emitted start plus the duration never exceeds `to`, so the
/// resulting count is exactly `floor((to - from) / duration)`.
pub fn generate_slots(
    from: SlotTime,
    to: SlotTime,
    duration_minutes: i64,
) -> ValidationResult<Vec<SlotTime>> {
    validate_duration(duration_minutes)?;
    validate_time_range(from, to)?;

    let to_minutes = to.minutes_from_midnight();
    let mut starts = Vec::new();
    let mut current = from.minutes_from_midnight();

    while current + duration_minutes <= to_minutes {
        // current < to_minutes < 1440, so the conversion cannot fail
        if let Some(start) = SlotTime::from_minutes(current) {
            starts.push(start);
        }
        current += duration_minutes;
    }

    Ok(starts)
}

/// Drops starts at or before `now`.
///
/// Applied to the current day only during batch setup; days further out
/// keep their full candidate set.
pub fn filter_past_starts(starts: Vec<SlotTime>, now: SlotTime) -> Vec<SlotTime> {
    starts.into_iter().filter(|start| *start > now).collect()
}

/// Conventional default start for an ad-hoc add: last existing start plus
/// 30 minutes.
///
/// Returns `None` if the day has no slots (the first-slot flow requires an
/// explicit time) or if the suggestion would cross midnight.
pub fn suggest_next_start(slots: &[Slot]) -> Option<SlotTime> {
    slots
        .iter()
        .map(|slot| slot.start_time)
        .max()
        .and_then(|last| last.add_minutes(SLOT_SUGGEST_GAP_MINUTES))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn t(input: &str) -> SlotTime {
        SlotTime::parse(input).unwrap()
    }

    fn slot_starting(start: SlotTime) -> Slot {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Slot {
            id: start.to_string(),
            provider_id: "prov-1".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            start_time: start,
            end_time: start.add_minutes(60).unwrap_or(start),
            is_booked: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_generate_excludes_start_that_would_overrun() {
        let starts = generate_slots(t("09:00"), t("10:00"), 30).unwrap();
        assert_eq!(starts, vec![t("09:00"), t("09:30")]);
    }

    #[test]
    fn test_generate_short_window_is_empty_not_error() {
        let starts = generate_slots(t("09:00"), t("09:20"), 30).unwrap();
        assert!(starts.is_empty());
    }

    #[test]
    fn test_generate_count_and_spacing() {
        // count = floor((to - from) / duration), consecutive starts differ
        // by exactly the duration, last start + duration <= to
        for (from, to, dur) in [
            ("08:00", "17:00", 45),
            ("09:00", "09:59", 20),
            ("00:00", "23:59", 60),
            ("06:15", "07:00", 15),
        ] {
            let (from, to) = (t(from), t(to));
            let starts = generate_slots(from, to, dur).unwrap();
            let span = to.minutes_from_midnight() - from.minutes_from_midnight();
            assert_eq!(starts.len() as i64, span / dur);
            for pair in starts.windows(2) {
                assert_eq!(
                    pair[1].minutes_from_midnight() - pair[0].minutes_from_midnight(),
                    dur
                );
            }
            if let Some(last) = starts.last() {
                assert!(last.minutes_from_midnight() + dur <= to.minutes_from_midnight());
            }
        }
    }

    #[test]
    fn test_generate_rejects_bad_preconditions() {
        assert!(generate_slots(t("10:00"), t("09:00"), 30).is_err());
        assert!(generate_slots(t("09:00"), t("09:00"), 30).is_err());
        assert!(generate_slots(t("09:00"), t("10:00"), 0).is_err());
        assert!(generate_slots(t("09:00"), t("10:00"), -15).is_err());
    }

    #[test]
    fn test_filter_past_starts_drops_at_or_before_now() {
        let starts = generate_slots(t("09:00"), t("10:00"), 30).unwrap();
        let filtered = filter_past_starts(starts, t("09:15"));
        assert_eq!(filtered, vec![t("09:30")]);

        // an exact match is also dropped
        let starts = generate_slots(t("09:00"), t("10:00"), 30).unwrap();
        let filtered = filter_past_starts(starts, t("09:00"));
        assert_eq!(filtered, vec![t("09:30")]);
    }

    #[test]
    fn test_suggest_next_start() {
        assert_eq!(suggest_next_start(&[]), None);

        let slots = vec![slot_starting(t("09:00")), slot_starting(t("11:00"))];
        assert_eq!(suggest_next_start(&slots), Some(t("11:30")));

        // suggestion crossing midnight yields nothing
        let slots = vec![slot_starting(t("23:45"))];
        assert_eq!(suggest_next_start(&slots), None);
    }
}
