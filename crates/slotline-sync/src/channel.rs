//! # Change Channel
//!
//! Push feed of remote slot changes, one subscription per provider.
//!
//! ## Feed Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Change Channel                                   │
//! │                                                                         │
//! │  booking service ──► ChangeChannel ──► Subscription (per provider)      │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                      SyncController push task           │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                      refresh request (Push)             │
//! │                                                                         │
//! │  The payload names what changed; the controller ignores the detail and  │
//! │  refetches the whole window. One authoritative read beats patching.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a `Subscription` detaches the provider feed; switching providers
//! is just drop + subscribe.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

/// Buffered changes per subscription before lagging kicks in.
const CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Change Payload
// =============================================================================

/// What happened to a slot, as reported by the booking side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// An external booking landed on the slot.
    Booked,

    /// A booking was cancelled; the slot is available again.
    Cancelled,

    /// The slot changed in some other way.
    Updated,
}

/// A single remote slot change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotChange {
    /// Provider the slot belongs to.
    pub provider_id: String,

    /// The changed slot.
    pub slot_id: String,

    /// What happened.
    pub kind: ChangeKind,
}

impl SlotChange {
    /// Serializes to the wire format (JSON).
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string(self).map_err(|e| EngineError::Storage(e.to_string()))
    }

    /// Parses the wire format (JSON).
    pub fn from_json(raw: &str) -> EngineResult<Self> {
        serde_json::from_str(raw).map_err(|e| EngineError::Storage(e.to_string()))
    }
}

// =============================================================================
// Channel Trait
// =============================================================================

/// Source of remote slot changes.
///
/// Production wires a network-backed implementation; tests and single-node
/// deployments use [`LocalChangeChannel`].
pub trait ChangeChannel: Send + Sync {
    /// Opens a change feed scoped to one provider.
    fn subscribe(&self, provider_id: &str) -> Subscription;
}

/// A live per-provider change feed.
pub struct Subscription {
    provider_id: String,
    rx: broadcast::Receiver<SlotChange>,
}

impl Subscription {
    /// The provider this feed is scoped to.
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Receives the next change, or `None` once the channel is closed.
    ///
    /// A lagged receiver skips the overrun and keeps going; the controller
    /// refetches the whole window anyway, so dropped intermediate changes
    /// cost nothing.
    pub async fn recv(&mut self) -> Option<SlotChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(provider = %self.provider_id, skipped, "Change feed lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// =============================================================================
// Local Channel
// =============================================================================

/// In-process change channel: publishes fan out to every subscription of
/// the same provider.
#[derive(Default)]
pub struct LocalChangeChannel {
    senders: Mutex<HashMap<String, broadcast::Sender<SlotChange>>>,
}

impl LocalChangeChannel {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a change to the provider's subscribers. Changes for
    /// providers with no subscriber are dropped.
    pub fn publish(&self, change: SlotChange) {
        let senders = self.senders.lock().unwrap();
        if let Some(tx) = senders.get(&change.provider_id) {
            let delivered = tx.send(change.clone()).unwrap_or(0);
            debug!(
                provider = %change.provider_id,
                slot = %change.slot_id,
                delivered,
                "Published slot change"
            );
        }
    }
}

impl ChangeChannel for LocalChangeChannel {
    fn subscribe(&self, provider_id: &str) -> Subscription {
        let mut senders = self.senders.lock().unwrap();
        let tx = senders
            .entry(provider_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);

        Subscription {
            provider_id: provider_id.to_string(),
            rx: tx.subscribe(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
