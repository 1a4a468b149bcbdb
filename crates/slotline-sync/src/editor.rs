//! # Slot Editor
//!
//! Single-slot mutations: ad-hoc add, time edit, delete, and the day
//! on/off toggle.
//!
//! ## Mutation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Every Mutation Path                                 │
//! │                                                                         │
//! │  credential check ──► pure validation ──► storage write ──► refresh    │
//! │                            │                    │                       │
//! │                            │ rejected           │ failed                │
//! │                            ▼                    ▼                       │
//! │                    return before any      typed error AND a            │
//! │                    storage call, no       settled refresh: the view    │
//! │                    refresh                that produced the write       │
//! │                                           is stale                      │
//! │                                                                         │
//! │  Every mutation that reaches storage ends in exactly one               │
//! │  mutation-settled refetch, committed or failed; the UI never renders   │
//! │  a locally-patched guess.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use slotline_core::conflict::is_duplicate;
use slotline_core::generate::suggest_next_start;
use slotline_core::validation::{slot_end, validate_add_time};
use slotline_core::{
    Slot, SlotTime, ValidationError, SINGLE_SLOT_MINUTES, SLOT_SUGGEST_GAP_MINUTES,
};
use slotline_db::{Database, DbError, SlotRepository};

use crate::auth::Credential;
use crate::clock::Clock;
use crate::controller::{RefreshCause, RefreshHandle};
use crate::error::{EngineError, EngineResult};
use crate::session::EditSession;

/// Single-slot mutation surface.
pub struct SlotEditor {
    db: Database,
    refresh: RefreshHandle,
    clock: Arc<dyn Clock>,
}

impl SlotEditor {
    /// Creates an editor sharing the controller's refresh queue.
    pub fn new(db: Database, refresh: RefreshHandle, clock: Arc<dyn Clock>) -> Self {
        SlotEditor { db, refresh, clock }
    }

    /// Adds one fixed-duration slot to a provider-day.
    ///
    /// ## Rules
    /// - `start = None` falls back to last start + 30 minutes; an empty day
    ///   requires an explicit time
    /// - past dates and, for today, past times are rejected
    /// - the day must be working
    /// - a same-start slot on the day is a duplicate (the UNIQUE index
    ///   backstops races this pre-check cannot see)
    pub async fn add_slot(
        &self,
        credential: &Credential,
        provider_id: &str,
        date: NaiveDate,
        start: Option<SlotTime>,
    ) -> EngineResult<Slot> {
        credential.ensure_valid(Utc::now())?;

        let today = self.clock.today();
        let now = self.clock.time_of_day();
        let existing = self.db.slots().list_by_date(provider_id, date).await?;

        let start = match start {
            Some(time) => time,
            None => {
                if existing.is_empty() {
                    return Err(ValidationError::StartTimeRequired { date }.into());
                }
                match suggest_next_start(&existing) {
                    Some(time) => time,
                    None => {
                        let last = existing
                            .iter()
                            .map(|s| s.start_time)
                            .max()
                            .unwrap_or(now);
                        return Err(ValidationError::TimeOverflow {
                            time: last,
                            minutes: SLOT_SUGGEST_GAP_MINUTES,
                        }
                        .into());
                    }
                }
            }
        };

        validate_add_time(date, start, today, now)?;

        let map = self.db.schedule().working_map(provider_id, date, date).await?;
        if !map.is_working(date) {
            return Err(ValidationError::DayNotWorking { date }.into());
        }

        if is_duplicate(&existing, start, None) {
            return Err(ValidationError::DuplicateSlot { date, time: start }.into());
        }

        let end = slot_end(start, SINGLE_SLOT_MINUTES)?;
        let created_at = Utc::now();
        let slot = Slot {
            id: SlotRepository::generate_slot_id(),
            provider_id: provider_id.to_string(),
            date,
            start_time: start,
            end_time: end,
            is_booked: false,
            created_at,
            updated_at: created_at,
        };

        // The write reached storage; settled or failed, the view that
        // produced it must be reconciled.
        match self.db.slots().insert(&slot).await {
            Ok(()) => {}
            // A concurrent add slipped in between the pre-check and the
            // insert; surface it as the same duplicate rejection.
            Err(DbError::UniqueViolation { .. }) => {
                self.refresh.request(RefreshCause::MutationSettled);
                return Err(ValidationError::DuplicateSlot { date, time: start }.into());
            }
            Err(e) => {
                self.refresh.request(RefreshCause::MutationSettled);
                return Err(e.into());
            }
        }

        info!(id = %slot.id, date = %date, start = %start, "Slot added");
        self.refresh.request(RefreshCause::MutationSettled);
        Ok(slot)
    }

    /// Moves an available slot to a new start time, consuming the caller's
    /// edit session.
    ///
    /// On success the session closes silently and one mutation-settled
    /// refresh follows. On failure the session drops, which releases the
    /// gate and requests the session-closed catch-up refresh.
    pub async fn edit_slot(
        &self,
        credential: &Credential,
        session: EditSession,
        slot_id: &str,
        new_start: SlotTime,
    ) -> EngineResult<Slot> {
        credential.ensure_valid(Utc::now())?;

        let current = self.db.slots().get_by_id(slot_id).await?;
        if current.is_booked {
            return Err(EngineError::SlotBooked {
                id: slot_id.to_string(),
            });
        }

        let today = self.clock.today();
        let now = self.clock.time_of_day();
        validate_add_time(current.date, new_start, today, now)?;

        let day_slots = self
            .db
            .slots()
            .list_by_date(&current.provider_id, current.date)
            .await?;
        if is_duplicate(&day_slots, new_start, Some(slot_id)) {
            return Err(ValidationError::DuplicateSlot {
                date: current.date,
                time: new_start,
            }
            .into());
        }

        let new_end = slot_end(new_start, SINGLE_SLOT_MINUTES)?;
        self.db.slots().update_time(slot_id, new_start, new_end).await?;

        info!(id = %slot_id, start = %new_start, "Slot moved");
        session.close();
        self.refresh.request(RefreshCause::MutationSettled);

        Ok(self.db.slots().get_by_id(slot_id).await?)
    }

    /// Deletes an available slot. Booked slots are undeletable.
    ///
    /// A failed delete means the slot was booked or removed underneath the
    /// caller, so the settled refresh follows either way.
    pub async fn delete_slot(&self, credential: &Credential, slot_id: &str) -> EngineResult<()> {
        credential.ensure_valid(Utc::now())?;

        let result = self.db.slots().delete(slot_id).await;
        self.refresh.request(RefreshCause::MutationSettled);
        result?;

        info!(id = %slot_id, "Slot deleted");
        Ok(())
    }

    /// Toggles a provider-day on or off.
    ///
    /// ## Rules
    /// - off: the day's slots are wiped with the flag in one transaction;
    ///   a booked slot on the day aborts the toggle entirely
    /// - on: only the flag flips; slots destroyed by an earlier off-toggle
    ///   do not come back
    pub async fn set_day_working(
        &self,
        credential: &Credential,
        provider_id: &str,
        date: NaiveDate,
        working: bool,
    ) -> EngineResult<()> {
        credential.ensure_valid(Utc::now())?;

        let result = if working {
            self.db.schedule().set_working(provider_id, date, true).await.map(|()| 0)
        } else {
            self.db.slots().clear_day(provider_id, date).await
        };

        // A rejected off-toggle (booked slots on the day) still settles:
        // the caller's view missed the booking.
        self.refresh.request(RefreshCause::MutationSettled);
        let deleted = result?;

        debug!(
            provider = %provider_id,
            date = %date,
            working,
            deleted,
            "Day toggled"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
