//! # slotline-core: Pure Scheduling Logic for Slotline
//!
//! This crate is the **heart** of the Slotline availability engine. It
//! contains the scheduling rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Slotline Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Calendar UI (external collaborator)              │   │
//! │  │    Day grid ──► Slot chips ──► Quick-setup dialog               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  slotline-sync (engine)                         │   │
//! │  │    SlotEditor, QuickSetup, SyncController                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ slotline-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐     │   │
//! │  │   │   types   │ │  window   │ │ generate  │ │ conflict  │     │   │
//! │  │   │ Slot, Day │ │  paging   │ │ candidates│ │ duplicates│     │   │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └───────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  slotline-db (storage layer)                    │   │
//! │  │        SQLite queries, migrations, repositories                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Slot, Day, SlotTime, WorkingDayMap)
//! - [`window`] - Calendar paging anchored at "today"
//! - [`generate`] - Candidate start-time generation
//! - [`conflict`] - Duplicate start-time detection
//! - [`validation`] - Scheduling rule validation
//! - [`error`] - Validation error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: callers pass `today` / `now` explicitly; the crate
//!    never reads a clock
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Normalized Times**: every time is second-normalized `HH:MM:SS`
//! 4. **Explicit Errors**: all rejections are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use slotline_core::generate::generate_slots;
//! use slotline_core::types::SlotTime;
//!
//! let from = SlotTime::parse("09:00").unwrap();
//! let to = SlotTime::parse("10:00").unwrap();
//!
//! // Two candidates; a 10:00 start would overrun the range
//! let starts = generate_slots(from, to, 30).unwrap();
//! assert_eq!(starts.len(), 2);
//! assert_eq!(starts[1].to_string(), "09:30:00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod conflict;
pub mod error;
pub mod generate;
pub mod types;
pub mod validation;
pub mod window;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use slotline_core::Slot` instead of
// `use slotline_core::types::Slot`

pub use error::{ValidationError, ValidationResult};
pub use types::{Day, DayState, Slot, SlotTime, WorkingDayMap};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Days shown together on one calendar page.
pub const PAGE_DAYS: u32 = 8;

/// Number of navigable pages; pages cover `MAX_PAGES * PAGE_DAYS` days total.
pub const MAX_PAGES: u32 = 3;

/// Days covered by a quick-setup run (`today ..= today + 6`).
pub const SETUP_WINDOW_DAYS: u32 = 7;

/// Service duration for ad-hoc single adds and time edits, in minutes.
pub const SINGLE_SLOT_MINUTES: i64 = 60;

/// Gap used to suggest the next start after the last existing slot.
pub const SLOT_SUGGEST_GAP_MINUTES: i64 = 30;
