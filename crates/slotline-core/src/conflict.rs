//! # Conflict Checker
//!
//! Duplicate start-time detection within one provider-day. Runs before
//! every create and every time-edit; the storage layer's UNIQUE constraint
//! is the authoritative backstop for races this pre-check cannot see.

use crate::types::{Slot, SlotTime};

/// True iff some slot in `slots` starts at `time` and has an id different
/// from `exclude_id`.
///
/// `exclude_id` carries the slot being edited so it never collides with
/// itself. Time normalization lives in [`SlotTime`], so seconds-level
/// formatting differences between stored and input values never defeat
/// the check.
pub fn is_duplicate(slots: &[Slot], time: SlotTime, exclude_id: Option<&str>) -> bool {
    slots
        .iter()
        .any(|slot| slot.start_time == time && exclude_id.map_or(true, |id| slot.id != id))
}

// =============================================================================
// Unit Tests
// =============================================================================
