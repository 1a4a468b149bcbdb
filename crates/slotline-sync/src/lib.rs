//! # slotline-sync: Scheduling Engine for Slotline
//!
//! The async engine layer: single-slot editing, 7-day quick setup, and the
//! sync controller that keeps one authoritative calendar snapshot current.
//!
//! ## Engine Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        slotline-sync                                    │
//! │                                                                         │
//! │  ┌────────────┐  ┌────────────┐  ┌──────────────────────────────────┐  │
//! │  │ SlotEditor │  │ QuickSetup │  │         SyncController           │  │
//! │  │            │  │            │  │                                  │  │
//! │  │ add / edit │  │ 7-day batch│  │  poll feed ─┐                    │  │
//! │  │ delete /   │  │ replace +  │  │  push feed ─┼─► reconcile loop   │  │
//! │  │ day toggle │  │ clear      │  │  mutations ─┘        │           │  │
//! │  └─────┬──────┘  └─────┬──────┘  │                      ▼           │  │
//! │        │               │        │              watch snapshot       │  │
//! │        └───────┬───────┘        └──────────────────────────────────┘  │
//! │                │ MutationSettled refresh requests                      │
//! │                ▼                                                       │
//! │        shared refresh queue                                            │
//! │                                                                         │
//! │  Cross-cutting: Credential checks, Clock abstraction, EditSession      │
//! │  suppression, EngineConfig                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Guarantees
//! - every mutation that reaches storage ends in exactly one authoritative
//!   refetch, whether it committed or failed
//! - the reconcile loop is strictly serial: refreshes never overlap
//! - an open edit session suppresses background refreshes, never mutations
//! - booked slots survive every engine write path
//!
//! ## Example
//! ```rust,ignore
//! let db = Database::new(DbConfig::new(path)).await?;
//! let channel = Arc::new(LocalChangeChannel::new());
//! let clock = Arc::new(SystemClock);
//!
//! let controller = SyncController::new(
//!     db.clone(), channel, EngineConfig::load_or_default(None), clock.clone(),
//! );
//! controller.start();
//! controller.observe("prov-1").await?;
//!
//! let editor = SlotEditor::new(db.clone(), controller.refresh_handle(), clock.clone());
//! let slot = editor.add_slot(&credential, "prov-1", date, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod batch;
pub mod channel;
pub mod clock;
pub mod config;
pub mod controller;
pub mod editor;
pub mod error;
pub mod session;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::Credential;
pub use batch::{QuickSetup, SetupOutcome, SetupRequest, SetupSummary};
pub use channel::{ChangeChannel, ChangeKind, LocalChangeChannel, SlotChange, Subscription};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use controller::{RefreshCause, RefreshHandle, ScheduleSnapshot, SnapshotHint, SyncController};
pub use editor::SlotEditor;
pub use error::{EngineError, EngineResult};
pub use session::{EditGate, EditSession};
