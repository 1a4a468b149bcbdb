//! # Schedule Repository
//!
//! Database operations for the working-day map.
//!
//! ## Key Operations
//! - Range reads into `WorkingDayMap`
//! - Single-day upserts for toggles
//! - Wholesale replacement when a remote pull wins
//!
//! Only explicit flags are stored; a date with no row counts as working.
//! Flags survive slot deletion, which is what lets an off-toggled day come
//! back as `WorkingEmpty` instead of silently re-deriving from slots.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use slotline_core::WorkingDayMap;

/// Repository for working-day flag operations.
#[derive(Debug, Clone)]
pub struct ScheduleRepository {
    pool: SqlitePool,
}

impl ScheduleRepository {
    /// Creates a new ScheduleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ScheduleRepository { pool }
    }

    /// Reads explicit flags in an inclusive date range into a map.
    ///
    /// Dates without a row are simply absent; `WorkingDayMap::is_working`
    /// fills them in as working.
    pub async fn working_map(
        &self,
        provider_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<WorkingDayMap> {
        let rows: Vec<(String, bool)> = sqlx::query_as(
            r#"
            SELECT day, is_working
            FROM working_days
            WHERE provider_id = ? AND day >= ? AND day <= ?
            "#,
        )
        .bind(provider_id)
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(&self.pool)
        .await?;

        let map = rows
            .into_iter()
            .filter_map(|(day, working)| {
                day.parse::<NaiveDate>().ok().map(|d| (d, working))
            })
            .collect();

        Ok(map)
    }

    /// Records an explicit working flag for one provider-day.
    pub async fn set_working(
        &self,
        provider_id: &str,
        date: NaiveDate,
        working: bool,
    ) -> DbResult<()> {
        debug!(provider = %provider_id, date = %date, working, "Setting working flag");

        sqlx::query(
            r#"
            INSERT INTO working_days (provider_id, day, is_working, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (provider_id, day) DO UPDATE
            SET is_working = excluded.is_working, updated_at = excluded.updated_at
            "#,
        )
        .bind(provider_id)
        .bind(date.to_string())
        .bind(working)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replaces every stored flag for one provider with the given map.
    ///
    /// Runs in one transaction so a reader never sees a half-written map.
    pub async fn put_working_map(
        &self,
        provider_id: &str,
        map: &WorkingDayMap,
    ) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM working_days WHERE provider_id = ?")
            .bind(provider_id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now().to_rfc3339();
        for (day, working) in map.iter() {
            sqlx::query(
                "INSERT INTO working_days (provider_id, day, is_working, updated_at) VALUES (?, ?, ?, ?)",
            )
            .bind(provider_id)
            .bind(day.to_string())
            .bind(*working)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
