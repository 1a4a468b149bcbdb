//! # Provider Repository
//!
//! Database operations for provider-level state. Slots and working days hang
//! off an opaque provider id; this repository owns the little that is stored
//! about the provider itself, currently just the visibility flag.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for provider database operations.
#[derive(Debug, Clone)]
pub struct ProviderRepository {
    pool: SqlitePool,
}

impl ProviderRepository {
    /// Creates a new ProviderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProviderRepository { pool }
    }

    /// Ensures a provider row exists. Idempotent.
    pub async fn ensure(&self, provider_id: &str) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO providers (id, is_visible, created_at, updated_at)
            VALUES (?, 1, ?, ?)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(provider_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Whether the provider is visible to bookers. Unknown providers count
    /// as visible.
    pub async fn is_visible(&self, provider_id: &str) -> DbResult<bool> {
        let visible: Option<bool> =
            sqlx::query_scalar("SELECT is_visible FROM providers WHERE id = ?")
                .bind(provider_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(visible.unwrap_or(true))
    }

    /// Sets the provider's visibility flag, creating the row if needed.
    pub async fn set_visible(&self, provider_id: &str, visible: bool) -> DbResult<()> {
        debug!(provider = %provider_id, visible, "Setting provider visibility");

        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO providers (id, is_visible, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE
            SET is_visible = excluded.is_visible, updated_at = excluded.updated_at
            "#,
        )
        .bind(provider_id)
        .bind(visible)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
