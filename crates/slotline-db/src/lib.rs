//! # slotline-db: Storage Layer for Slotline
//!
//! SQLite persistence for the Slotline availability engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          slotline-db                                    │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        Database                                 │   │
//! │  │            (pool handle + repository accessors)                 │   │
//! │  └──────┬──────────────────────┬──────────────────────┬───────────┘   │
//! │         │                      │                      │                │
//! │         ▼                      ▼                      ▼                │
//! │  ┌─────────────┐       ┌──────────────┐       ┌──────────────┐        │
//! │  │SlotRepository│      │ScheduleRepo  │       │ProviderRepo  │        │
//! │  │ slots CRUD   │      │ working days │       │ visibility   │        │
//! │  │ replace_window│     │ flag upserts │       │              │        │
//! │  └─────────────┘       └──────────────┘       └──────────────┘        │
//! │         │                      │                      │                │
//! │         └──────────────────────┴──────────────────────┘                │
//! │                                │                                        │
//! │                          SqlitePool (WAL)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - Booked slots never change or vanish through this crate's write paths
//!   (other than the explicit `set_booked` landing path)
//! - `replace_window` and `clear_day` are all-or-nothing transactions
//! - Embedded migrations run on connect

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    ClearOutcome, ProviderRepository, ReplaceOutcome, ScheduleRepository, SlotRepository,
};
