//! # Clock Abstraction
//!
//! "Today" and "now" drive windowing, past-time guards and the current-day
//! filter, so the engine reads them through a trait instead of calling the
//! system clock directly. Production uses [`SystemClock`]; tests pin time
//! with [`FixedClock`].

use std::sync::Mutex;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use slotline_core::SlotTime;

/// Source of the provider-local date and time.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Current local date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Current time of day, normalized to whole minutes.
    fn time_of_day(&self) -> SlotTime {
        SlotTime::from_naive(self.now().time())
    }
}

/// Production clock reading the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Settable clock for tests.
#[derive(Debug)]
pub struct FixedClock {
    at: Mutex<NaiveDateTime>,
}

impl FixedClock {
    /// Creates a clock pinned at the given instant.
    pub fn new(at: NaiveDateTime) -> Self {
        FixedClock { at: Mutex::new(at) }
    }

    /// Moves the clock to a new instant.
    pub fn set(&self, at: NaiveDateTime) {
        *self.at.lock().unwrap() = at;
    }

    /// Advances the clock by whole minutes.
    pub fn advance_minutes(&self, minutes: i64) {
        let mut at = self.at.lock().unwrap();
        *at = *at + Duration::minutes(minutes);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.at.lock().unwrap()
    }
}
