//! # Calendar Windowing
//!
//! Maps page indexes to contiguous ranges of calendar days anchored at
//! "today", and assembles `Day` views from raw slots plus the working map.
//!
//! ## Paging Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Rolling Calendar Pages                             │
//! │                                                                         │
//! │  today                                                                  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  ┌────────── page 0 ──────────┬───── page 1 ─────┬───── page 2 ─────┐  │
//! │  │ d+0 d+1 d+2 ... d+7        │ d+8 ... d+15     │ d+16 ... d+23    │  │
//! │  └────────────────────────────┴──────────────────┴──────────────────┘  │
//! │                                                                         │
//! │  Pages are deterministic functions of the current date: contiguous,     │
//! │  non-overlapping, no day double-counted or skipped.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::error::ValidationResult;
use crate::types::{Day, Slot, WorkingDayMap};
use crate::validation::{validate_offset, validate_page};
use crate::{MAX_PAGES, PAGE_DAYS, SETUP_WINDOW_DAYS};

/// First date of `page`: local midnight of today advanced by `page * 8` days.
pub fn page_start(today: NaiveDate, page: u32) -> ValidationResult<NaiveDate> {
    validate_page(page)?;
    Ok(today + Days::new(u64::from(page) * u64::from(PAGE_DAYS)))
}

/// Date at `offset` within `page`, for `offset ∈ [0, PAGE_DAYS)`.
pub fn date_at(today: NaiveDate, page: u32, offset: u32) -> ValidationResult<NaiveDate> {
    validate_offset(offset)?;
    Ok(page_start(today, page)? + Days::new(u64::from(offset)))
}

/// All dates of `page` in order.
pub fn page_dates(today: NaiveDate, page: u32) -> ValidationResult<Vec<NaiveDate>> {
    let start = page_start(today, page)?;
    Ok((0..u64::from(PAGE_DAYS))
        .map(|d| start + Days::new(d))
        .collect())
}

/// The batch-setup window: `today ..= today + 6`, inclusive bounds.
pub fn setup_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today, today + Days::new(u64::from(SETUP_WINDOW_DAYS) - 1))
}

/// Every date covered by the calendar: `MAX_PAGES * PAGE_DAYS` days from today.
pub fn full_window_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (0..u64::from(MAX_PAGES) * u64::from(PAGE_DAYS))
        .map(|d| today + Days::new(d))
        .collect()
}

/// Assembles `Day` views for `dates` from raw slots and the working map.
///
/// Slots are grouped by date and ordered by start time; slots outside
/// `dates` are dropped. The working flag comes from the map alone, never
/// from slot existence.
pub fn build_window(dates: &[NaiveDate], slots: Vec<Slot>, map: &WorkingDayMap) -> Vec<Day> {
    let mut by_date: BTreeMap<NaiveDate, Vec<Slot>> = BTreeMap::new();
    for slot in slots {
        by_date.entry(slot.date).or_default().push(slot);
    }

    dates
        .iter()
        .map(|&date| {
            let mut slots = by_date.remove(&date).unwrap_or_default();
            slots.sort_by_key(|s| s.start_time);
            Day {
                date,
                is_working_day: map.is_working(date),
                slots,
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SlotTime;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn slot(d: NaiveDate, hm: (u32, u32)) -> Slot {
        let start = SlotTime::from_hm(hm.0, hm.1).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Slot {
            id: format!("{}-{}", d, start),
            provider_id: "prov-1".to_string(),
            date: d,
            start_time: start,
            end_time: start.add_minutes(60).unwrap(),
            is_booked: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pages_are_contiguous_and_non_overlapping() {
        let today = date(2026, 3, 1);
        let mut all = Vec::new();
        for page in 0..MAX_PAGES {
            all.extend(page_dates(today, page).unwrap());
        }
        assert_eq!(all.len(), (MAX_PAGES * PAGE_DAYS) as usize);
        for (i, d) in all.iter().enumerate() {
            assert_eq!(*d, today + Days::new(i as u64));
        }
    }

    #[test]
    fn test_page_bounds() {
        let today = date(2026, 3, 1);
        assert!(page_start(today, MAX_PAGES).is_err());
        assert!(date_at(today, 0, PAGE_DAYS).is_err());
        assert_eq!(date_at(today, 1, 0).unwrap(), date(2026, 3, 9));
        assert_eq!(date_at(today, 2, 7).unwrap(), date(2026, 3, 24));
    }

    #[test]
    fn test_setup_window_is_seven_days() {
        let today = date(2026, 3, 1);
        let (from, to) = setup_window(today);
        assert_eq!(from, today);
        assert_eq!(to, date(2026, 3, 7));
    }

    #[test]
    fn test_build_window_groups_and_sorts() {
        let today = date(2026, 3, 1);
        let dates = vec![today, today + Days::new(1)];
        let slots = vec![
            slot(today, (11, 0)),
            slot(today, (9, 0)),
            slot(today + Days::new(5), (9, 0)), // outside window, dropped
        ];
        let mut map = WorkingDayMap::new();
        map.set(today + Days::new(1), false);

        let days = build_window(&dates, slots, &map);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].slots.len(), 2);
        assert_eq!(days[0].slots[0].start_time, SlotTime::from_hm(9, 0).unwrap());
        assert!(days[0].is_working_day);
        assert!(!days[1].is_working_day);
        assert!(days[1].slots.is_empty());
    }
}
