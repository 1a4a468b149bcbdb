//! # Repository Modules
//!
//! One repository per aggregate. Repositories own their SQL and map rows to
//! `slotline-core` domain types; nothing above this layer writes SQL.
//!
//! ## Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Repository Pattern                                 │
//! │                                                                         │
//! │  Engine (slotline-sync)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository (this module) ← SQL lives here, nowhere else               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqlitePool → SQLite                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dates and times are stored as ISO-8601 TEXT (`YYYY-MM-DD`, `HH:MM:SS`),
//! which makes lexicographic comparison equal to chronological comparison.

pub mod provider;
pub mod schedule;
pub mod slot;

pub use provider::ProviderRepository;
pub use schedule::ScheduleRepository;
pub use slot::{ClearOutcome, ReplaceOutcome, SlotRepository};
