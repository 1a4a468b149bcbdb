//! # Engine Error Types
//!
//! Error types for the scheduling engine.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  ValidationError (slotline-core)   DbError (slotline-db)               │
//! │          │                              │                               │
//! │          └──────────┬───────────────────┘                               │
//! │                     ▼                                                   │
//! │            EngineError (this module)                                    │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │            Caller / calendar UI                                         │
//! │                                                                         │
//! │  Typed rule rejections stay typed end-to-end; only genuinely opaque    │
//! │  storage failures collapse into `Storage`.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use slotline_core::ValidationError;
use slotline_db::DbError;

/// Errors surfaced by the scheduling engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A scheduling rule rejected the input before storage was touched.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No credential was supplied for an authenticated mutation.
    #[error("missing credential")]
    MissingCredential,

    /// The supplied credential has expired.
    #[error("credential expired")]
    CredentialExpired,

    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The targeted slot is booked; booked slots never move or vanish.
    #[error("slot {id} is booked and cannot be modified")]
    SlotBooked { id: String },

    /// A day wipe hit booked slots that must survive.
    #[error("{count} booked slot(s) on {date} prevent the operation")]
    BookedSlotsRemain { date: String, count: i64 },

    /// An edit session is already open.
    #[error("an edit session is already in progress")]
    EditInProgress,

    /// No provider is currently being observed.
    #[error("no provider is being observed")]
    NotObserving,

    /// Storage failure with no domain meaning.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid engine configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file I/O failure.
    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Config file parse failure.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config file serialization failure.
    #[error("config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// The engine is shutting down.
    #[error("engine is shutting down")]
    ShuttingDown,
}

/// Convert storage errors, keeping domain-meaningful variants typed.
impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::SlotBooked { id } => EngineError::SlotBooked { id },
            DbError::BookedSlotsRemain { date, count } => {
                EngineError::BookedSlotsRemain { date, count }
            }
            other => EngineError::Storage(other.to_string()),
        }
    }
}

impl EngineError {
    /// True when the caller's view is stale and a refetch is the right
    /// follow-up: the slot changed underneath them.
    pub fn requires_reload(&self) -> bool {
        matches!(
            self,
            EngineError::SlotBooked { .. }
                | EngineError::NotFound { .. }
                | EngineError::BookedSlotsRemain { .. }
        )
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
