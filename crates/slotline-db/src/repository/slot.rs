//! # Slot Repository
//!
//! Database operations for slots.
//!
//! ## Key Operations
//! - CRUD with booked-state guards inside the SQL statement
//! - Atomic window replacement for quick setup
//! - Range listing ordered by date then start time
//!
//! ## Booked-State Guards
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            Why the guard is in the statement, not before it            │
//! │                                                                         │
//! │  UPDATE slots SET ... WHERE id = ? AND is_booked = 0                   │
//! │                              └──────┬──────┘                            │
//! │                                     │                                   │
//! │  A booking can land between a read and a write. Putting the check      │
//! │  inside the statement means the mutation and the check share one       │
//! │  moment: rows_affected = 0 + row exists  →  SlotBooked                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use slotline_core::{Slot, SlotTime};

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw slot row as stored. TEXT columns are parsed into domain types in
/// `TryFrom`, so a corrupt row surfaces as `DbError::Internal` instead of a
/// panic.
#[derive(Debug, FromRow)]
struct SlotRow {
    id: String,
    provider_id: String,
    slot_date: String,
    start_time: String,
    end_time: String,
    is_booked: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SlotRow> for Slot {
    type Error = DbError;

    fn try_from(row: SlotRow) -> Result<Self, Self::Error> {
        let date = row
            .slot_date
            .parse::<NaiveDate>()
            .map_err(|e| DbError::Internal(format!("bad slot_date '{}': {}", row.slot_date, e)))?;
        let start_time = SlotTime::parse(&row.start_time)
            .map_err(|e| DbError::Internal(format!("bad start_time: {}", e)))?;
        let end_time = SlotTime::parse(&row.end_time)
            .map_err(|e| DbError::Internal(format!("bad end_time: {}", e)))?;
        let created_at = parse_timestamp(&row.created_at)?;
        let updated_at = parse_timestamp(&row.updated_at)?;

        Ok(Slot {
            id: row.id,
            provider_id: row.provider_id,
            date,
            start_time,
            end_time,
            is_booked: row.is_booked,
            created_at,
            updated_at,
        })
    }
}

fn parse_timestamp(raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Internal(format!("bad timestamp '{}': {}", raw, e)))
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of an atomic window replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The window was rewritten inside one transaction.
    Replaced {
        /// Available slots deleted from the window.
        deleted: u64,
        /// New slots inserted.
        inserted: u64,
        /// Booked slots that survived untouched.
        kept_booked: u64,
        /// Candidates dropped because a surviving booked slot holds the
        /// same date + start.
        skipped: u64,
    },

    /// `require_empty` was set and the window already holds slots. Nothing
    /// was written.
    ExistingSlots {
        /// Slots found in the window.
        count: i64,
    },
}

/// Result of clearing a provider's schedule from a date onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearOutcome {
    /// Available slots deleted.
    pub deleted: u64,
    /// Booked slots left in place.
    pub kept_booked: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for slot database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.slots();
///
/// let slot = repo.get_by_id("uuid-here").await?;
/// let week = repo.list_by_date_range("prov-1", from, to).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SlotRepository {
    pool: SqlitePool,
}

impl SlotRepository {
    /// Creates a new SlotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SlotRepository { pool }
    }

    /// Generates a fresh slot id (UUID v4).
    pub fn generate_slot_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Inserts a new slot.
    ///
    /// The `(provider_id, slot_date, start_time)` unique index turns a
    /// same-start insert into `DbError::UniqueViolation`.
    pub async fn insert(&self, slot: &Slot) -> DbResult<()> {
        debug!(id = %slot.id, date = %slot.date, start = %slot.start_time, "Inserting slot");

        sqlx::query(
            r#"
            INSERT INTO slots (id, provider_id, slot_date, start_time, end_time,
                               is_booked, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&slot.id)
        .bind(&slot.provider_id)
        .bind(slot.date.to_string())
        .bind(slot.start_time.to_string())
        .bind(slot.end_time.to_string())
        .bind(slot.is_booked)
        .bind(slot.created_at.to_rfc3339())
        .bind(slot.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a slot by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Slot> {
        let row = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT id, provider_id, slot_date, start_time, end_time,
                   is_booked, created_at, updated_at
            FROM slots
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Slot", id))?;

        Slot::try_from(row)
    }

    /// Lists slots for one provider across an inclusive date range, ordered
    /// by date then start time.
    pub async fn list_by_date_range(
        &self,
        provider_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<Slot>> {
        let rows = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT id, provider_id, slot_date, start_time, end_time,
                   is_booked, created_at, updated_at
            FROM slots
            WHERE provider_id = ? AND slot_date >= ? AND slot_date <= ?
            ORDER BY slot_date ASC, start_time ASC
            "#,
        )
        .bind(provider_id)
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Slot::try_from).collect()
    }

    /// Lists slots for a single provider-day, ordered by start time.
    pub async fn list_by_date(&self, provider_id: &str, date: NaiveDate) -> DbResult<Vec<Slot>> {
        self.list_by_date_range(provider_id, date, date).await
    }

    /// Counts slots for one provider across an inclusive date range.
    pub async fn count_in_range(
        &self,
        provider_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM slots WHERE provider_id = ? AND slot_date >= ? AND slot_date <= ?",
        )
        .bind(provider_id)
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Moves a slot to a new start/end time.
    ///
    /// ## Rules
    /// - Booked slots never move: the statement carries `is_booked = 0`
    /// - `rows_affected = 0` is disambiguated with a follow-up read:
    ///   row exists → `SlotBooked`, otherwise `NotFound`
    pub async fn update_time(
        &self,
        id: &str,
        new_start: SlotTime,
        new_end: SlotTime,
    ) -> DbResult<()> {
        debug!(id = %id, start = %new_start, "Updating slot time");

        let result = sqlx::query(
            r#"
            UPDATE slots
            SET start_time = ?, end_time = ?, updated_at = ?
            WHERE id = ? AND is_booked = 0
            "#,
        )
        .bind(new_start.to_string())
        .bind(new_end.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.classify_guard_miss(id).await?);
        }

        Ok(())
    }

    /// Deletes a slot.
    ///
    /// Same guard shape as `update_time`: booked slots are undeletable.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting slot");

        let result = sqlx::query("DELETE FROM slots WHERE id = ? AND is_booked = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(self.classify_guard_miss(id).await?);
        }

        Ok(())
    }

    /// Marks a slot booked or available.
    ///
    /// This is how external bookings land, so it carries no booked guard.
    pub async fn set_booked(&self, id: &str, booked: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE slots SET is_booked = ?, updated_at = ? WHERE id = ?")
            .bind(booked)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Slot", id));
        }

        Ok(())
    }

    /// Wipes one provider-day and switches it off, in one transaction.
    ///
    /// ## Rules
    /// - Any booked slot on the day aborts the whole operation
    ///   (`BookedSlotsRemain`), leaving every slot and the flag untouched
    /// - Otherwise: delete the day's slots, record `is_working = 0`
    pub async fn clear_day(&self, provider_id: &str, date: NaiveDate) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;

        let booked: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM slots WHERE provider_id = ? AND slot_date = ? AND is_booked = 1",
        )
        .bind(provider_id)
        .bind(date.to_string())
        .fetch_one(&mut *tx)
        .await?;

        if booked > 0 {
            return Err(DbError::BookedSlotsRemain {
                date: date.to_string(),
                count: booked,
            });
        }

        let deleted = sqlx::query("DELETE FROM slots WHERE provider_id = ? AND slot_date = ?")
            .bind(provider_id)
            .bind(date.to_string())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        upsert_working(&mut tx, provider_id, date, false).await?;

        tx.commit().await?;

        info!(provider = %provider_id, date = %date, deleted, "Cleared day");
        Ok(deleted)
    }

    /// Atomically replaces a provider's slots across an inclusive window.
    ///
    /// ## What Happens (one transaction)
    /// 1. If `require_empty`, count the window; any slot at all returns
    ///    `ExistingSlots` and writes nothing
    /// 2. Delete every available slot in the window (booked survive)
    /// 3. Insert the new slots, skipping any candidate whose date + start
    ///    collides with a surviving booked slot
    /// 4. Mark every day in the window as working
    ///
    /// Any failure rolls the whole window back.
    pub async fn replace_window(
        &self,
        provider_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        new_slots: &[Slot],
        require_empty: bool,
    ) -> DbResult<ReplaceOutcome> {
        let mut tx = self.pool.begin().await?;

        if require_empty {
            let existing: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM slots WHERE provider_id = ? AND slot_date >= ? AND slot_date <= ?",
            )
            .bind(provider_id)
            .bind(from.to_string())
            .bind(to.to_string())
            .fetch_one(&mut *tx)
            .await?;

            if existing > 0 {
                // Dropping tx rolls back; nothing was written anyway.
                return Ok(ReplaceOutcome::ExistingSlots { count: existing });
            }
        }

        let deleted = sqlx::query(
            r#"
            DELETE FROM slots
            WHERE provider_id = ? AND slot_date >= ? AND slot_date <= ? AND is_booked = 0
            "#,
        )
        .bind(provider_id)
        .bind(from.to_string())
        .bind(to.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // Surviving booked slots keep their (date, start); colliding
        // candidates are dropped rather than double-booking the start.
        let occupied: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT slot_date, start_time
            FROM slots
            WHERE provider_id = ? AND slot_date >= ? AND slot_date <= ?
            "#,
        )
        .bind(provider_id)
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(&mut *tx)
        .await?;

        let kept_booked = occupied.len() as u64;
        let occupied: HashSet<(String, String)> = occupied.into_iter().collect();

        let mut inserted = 0u64;
        let mut skipped = 0u64;

        for slot in new_slots {
            let key = (slot.date.to_string(), slot.start_time.to_string());
            if occupied.contains(&key) {
                skipped += 1;
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO slots (id, provider_id, slot_date, start_time, end_time,
                                   is_booked, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, 0, ?, ?)
                "#,
            )
            .bind(&slot.id)
            .bind(provider_id)
            .bind(&key.0)
            .bind(&key.1)
            .bind(slot.end_time.to_string())
            .bind(slot.created_at.to_rfc3339())
            .bind(slot.updated_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;

            inserted += 1;
        }

        // Every day the batch touched becomes an explicit working day.
        let mut day = from;
        while day <= to {
            upsert_working(&mut tx, provider_id, day, true).await?;
            day = day.succ_opt().ok_or_else(|| {
                DbError::Internal("date overflow while marking working days".to_string())
            })?;
        }

        tx.commit().await?;

        info!(
            provider = %provider_id,
            from = %from,
            to = %to,
            deleted,
            inserted,
            kept_booked,
            skipped,
            "Replaced slot window"
        );

        Ok(ReplaceOutcome::Replaced {
            deleted,
            inserted,
            kept_booked,
            skipped,
        })
    }

    /// Clears a provider's schedule from `from` onward, in one transaction.
    ///
    /// Available slots go; booked slots stay. Every day in
    /// `from ..= through` is recorded as an explicit off-day, and any
    /// explicit entry beyond `through` is switched off as well.
    pub async fn clear_from(
        &self,
        provider_id: &str,
        from: NaiveDate,
        through: NaiveDate,
    ) -> DbResult<ClearOutcome> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM slots WHERE provider_id = ? AND slot_date >= ? AND is_booked = 0",
        )
        .bind(provider_id)
        .bind(from.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let kept_booked: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM slots WHERE provider_id = ? AND slot_date >= ?",
        )
        .bind(provider_id)
        .bind(from.to_string())
        .fetch_one(&mut *tx)
        .await?;

        let mut day = from;
        while day <= through {
            upsert_working(&mut tx, provider_id, day, false).await?;
            day = day.succ_opt().ok_or_else(|| {
                DbError::Internal("date overflow while clearing working days".to_string())
            })?;
        }

        sqlx::query(
            "UPDATE working_days SET is_working = 0, updated_at = ? WHERE provider_id = ? AND day > ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(provider_id)
        .bind(through.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(provider = %provider_id, from = %from, deleted, kept_booked, "Cleared schedule");

        Ok(ClearOutcome {
            deleted,
            kept_booked,
        })
    }

    /// Disambiguates a guarded write that affected zero rows.
    async fn classify_guard_miss(&self, id: &str) -> DbResult<DbError> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM slots WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if exists > 0 {
            Ok(DbError::slot_booked(id))
        } else {
            Ok(DbError::not_found("Slot", id))
        }
    }
}

/// Shared working-day upsert used inside slot transactions.
async fn upsert_working(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    provider_id: &str,
    day: NaiveDate,
    working: bool,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO working_days (provider_id, day, is_working, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (provider_id, day) DO UPDATE
        SET is_working = excluded.is_working, updated_at = excluded.updated_at
        "#,
    )
    .bind(provider_id)
    .bind(day.to_string())
    .bind(working)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
