//! # Domain Types
//!
//! Core domain types used throughout Slotline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Slot        │   │      Day        │   │  WorkingDayMap  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  date           │   │  date → bool    │       │
//! │  │  date           │   │  is_working_day │   │  sole authority │       │
//! │  │  start_time     │   │  slots (sorted) │   │  on day on/off  │       │
//! │  │  end_time       │   │  (computed view)│   └─────────────────┘       │
//! │  │  is_booked      │   └─────────────────┘                             │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │    SlotTime     │   │    DayState     │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  HH:MM:SS       │   │  Off            │                             │
//! │  │  second = 0     │   │  WorkingEmpty   │                             │
//! │  │  always         │   │  WorkingWithSlots                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Slots carry UUID v4 string ids, immutable for their lifetime. A `Day` has
//! no id: it is a computed view over its date, working flag and slots.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ValidationError, ValidationResult};

// =============================================================================
// Slot Time
// =============================================================================

/// A bookable start or end time, normalized to whole minutes.
///
/// ## Normalization
/// Input arrives with minute granularity (`"09:30"`) or already second-padded
/// (`"09:30:00"`); either way the stored value has `second = 0` and renders
/// as `HH:MM:SS`. Equality therefore ignores seconds-level formatting
/// differences, which is what the duplicate check relies on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(try_from = "String", into = "String")]
#[ts(export)]
pub struct SlotTime(#[ts(as = "String")] NaiveTime);

impl SlotTime {
    /// Minutes in a calendar day.
    pub const MINUTES_PER_DAY: i64 = 24 * 60;

    /// Creates a slot time from hour and minute components.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(SlotTime)
    }

    /// Normalizes an arbitrary `NaiveTime` by dropping seconds and below.
    pub fn from_naive(time: NaiveTime) -> Self {
        let truncated = time
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(time);
        SlotTime(truncated)
    }

    /// Parses `"HH:MM"` or `"HH:MM:SS"` input.
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let trimmed = input.trim();
        let parsed = NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
            .map_err(|e| ValidationError::InvalidTime {
                input: trimmed.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_naive(parsed))
    }

    /// Creates a slot time from minutes since midnight.
    ///
    /// Returns `None` outside `[0, 1440)`.
    pub fn from_minutes(minutes: i64) -> Option<Self> {
        if !(0..Self::MINUTES_PER_DAY).contains(&minutes) {
            return None;
        }
        NaiveTime::from_num_seconds_from_midnight_opt(minutes as u32 * 60, 0).map(SlotTime)
    }

    /// Minutes since midnight.
    #[inline]
    pub fn minutes_from_midnight(&self) -> i64 {
        (self.0.num_seconds_from_midnight() / 60) as i64
    }

    /// Advances by `minutes`, or `None` if the result crosses midnight.
    pub fn add_minutes(&self, minutes: i64) -> Option<Self> {
        Self::from_minutes(self.minutes_from_midnight() + minutes)
    }

    /// Returns the underlying `NaiveTime`.
    #[inline]
    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

impl FromStr for SlotTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlotTime::parse(s)
    }
}

impl From<SlotTime> for String {
    fn from(time: SlotTime) -> String {
        time.to_string()
    }
}

impl TryFrom<String> for SlotTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SlotTime::parse(&value)
    }
}

// =============================================================================
// Slot
// =============================================================================

/// A fixed-duration bookable time interval belonging to one provider-day.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Slot {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Provider this slot belongs to (opaque id).
    pub provider_id: String,

    /// Calendar date, provider-local.
    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Normalized start time.
    pub start_time: SlotTime,

    /// Normalized end time; always `start_time + service duration`.
    pub end_time: SlotTime,

    /// Whether an external booking holds this slot.
    /// A booked slot is immutable and undeletable through this engine.
    pub is_booked: bool,

    /// When the slot was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the slot was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    /// A slot is available iff it is not booked.
    #[inline]
    pub fn is_available(&self) -> bool {
        !self.is_booked
    }
}

// =============================================================================
// Day State
// =============================================================================

/// The state of one provider-day in the toggle/add/delete state machine.
///
/// ```text
/// Off ⇄ WorkingEmpty           via toggle (off-toggle deletes slots)
/// WorkingEmpty → WorkingWithSlots   via add
/// WorkingWithSlots → WorkingEmpty   via deleting the last slot
/// ```
///
/// All transitions are caller-initiated; there is no automatic transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    /// Day switched off; holds no slots.
    Off,
    /// Working day with zero slots.
    WorkingEmpty,
    /// Working day with at least one slot.
    WorkingWithSlots,
}

// =============================================================================
// Day
// =============================================================================

/// A computed view of one calendar day: working flag plus ordered slots.
///
/// Not a persisted row; only the working flag survives in storage.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Day {
    /// Calendar date, provider-local.
    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Working flag, sourced from the working-day map - never derived from
    /// slot existence.
    pub is_working_day: bool,

    /// Slots ordered by start time.
    pub slots: Vec<Slot>,
}

impl Day {
    /// Returns the day's position in the state machine.
    pub fn state(&self) -> DayState {
        match (self.is_working_day, self.slots.is_empty()) {
            (false, _) => DayState::Off,
            (true, true) => DayState::WorkingEmpty,
            (true, false) => DayState::WorkingWithSlots,
        }
    }

    /// True if at least one slot exists on this day.
    #[inline]
    pub fn has_slots(&self) -> bool {
        !self.slots.is_empty()
    }
}

// =============================================================================
// Working Day Map
// =============================================================================

/// `date → bool`, the sole authority on whether a day accepts slots.
///
/// ## Absent-entry semantics
/// A date with no entry counts as working. The map records explicit off-days
/// and explicit batch-marked on-days, and survives even if all of a day's
/// slots are deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingDayMap(BTreeMap<NaiveDate, bool>);

impl WorkingDayMap {
    /// Creates an empty map (every day working by default).
    pub fn new() -> Self {
        WorkingDayMap(BTreeMap::new())
    }

    /// Whether `date` accepts slots.
    pub fn is_working(&self, date: NaiveDate) -> bool {
        *self.0.get(&date).unwrap_or(&true)
    }

    /// Records an explicit flag for `date`.
    pub fn set(&mut self, date: NaiveDate, working: bool) {
        self.0.insert(date, working);
    }

    /// Iterates over explicit entries in date order.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &bool)> {
        self.0.iter()
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no explicit entries exist.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(NaiveDate, bool)> for WorkingDayMap {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, bool)>>(iter: I) -> Self {
        WorkingDayMap(iter.into_iter().collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
