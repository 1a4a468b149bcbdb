//! # Edit Sessions
//!
//! While a slot's time is being picked in the UI, a background refresh would
//! yank the form out from under the user. An [`EditSession`] marks that
//! interval: the controller keeps polling and receiving pushes, but skips
//! applying background refreshes while a session is open.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Edit Session Lifecycle                             │
//! │                                                                         │
//! │  begin_edit() ──► gate opens ──► background refreshes suppressed        │
//! │       │                                                                 │
//! │       ├── edit committed: editor consumes the session, gate closes,    │
//! │       │   one mutation-settled refresh follows                          │
//! │       │                                                                 │
//! │       └── abandoned (drop): gate closes, one session-closed refresh    │
//! │           catches up on anything suppressed meanwhile                   │
//! │                                                                         │
//! │  Only one session at a time; a second begin_edit() is EditInProgress.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::controller::{RefreshCause, RefreshHandle};
use crate::error::{EngineError, EngineResult};

/// Shared flag marking an in-flight edit.
#[derive(Debug, Default)]
pub struct EditGate {
    open: AtomicBool,
}

impl EditGate {
    /// Creates a closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an edit session is open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn try_open(&self) -> bool {
        self.open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self) {
        self.open.store(false, Ordering::Release);
    }
}

/// An open edit interval. Consume with [`close`](EditSession::close) on
/// commit; dropping it counts as abandoning the edit.
pub struct EditSession {
    gate: Arc<EditGate>,
    refresh: RefreshHandle,
    closed: bool,
}

impl EditSession {
    /// Opens the gate, failing if another session is already open.
    pub(crate) fn begin(gate: Arc<EditGate>, refresh: RefreshHandle) -> EngineResult<Self> {
        if !gate.try_open() {
            return Err(EngineError::EditInProgress);
        }
        debug!("Edit session opened");
        Ok(EditSession {
            gate,
            refresh,
            closed: false,
        })
    }

    /// Closes the session without a catch-up refresh.
    ///
    /// The editor calls this right before its own mutation-settled refresh,
    /// so the commit path still ends in exactly one refetch.
    pub(crate) fn close(mut self) {
        self.closed = true;
        self.gate.release();
        debug!("Edit session closed");
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        if !self.closed {
            self.gate.release();
            debug!("Edit session abandoned");
            self.refresh.request(RefreshCause::SessionClosed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::RefreshCause;
    use tokio::sync::mpsc;

    fn handle() -> (RefreshHandle, mpsc::Receiver<RefreshCause>) {
        RefreshHandle::for_tests()
    }

    #[tokio::test]
    async fn test_only_one_session_at_a_time() {
        let gate = Arc::new(EditGate::new());
        let (refresh, _rx) = handle();

        let session = EditSession::begin(gate.clone(), refresh.clone()).unwrap();
        assert!(gate.is_open());

        assert!(matches!(
            EditSession::begin(gate.clone(), refresh.clone()),
            Err(EngineError::EditInProgress)
        ));

        session.close();
        assert!(!gate.is_open());
        assert!(EditSession::begin(gate, refresh).is_ok());
    }

    #[tokio::test]
    async fn test_abandoned_session_requests_catch_up() {
        let gate = Arc::new(EditGate::new());
        let (refresh, mut rx) = handle();

        let session = EditSession::begin(gate.clone(), refresh).unwrap();
        drop(session);

        assert!(!gate.is_open());
        assert_eq!(rx.recv().await, Some(RefreshCause::SessionClosed));
    }

    #[tokio::test]
    async fn test_closed_session_stays_silent() {
        let gate = Arc::new(EditGate::new());
        let (refresh, mut rx) = handle();

        let session = EditSession::begin(gate, refresh).unwrap();
        session.close();

        assert!(rx.try_recv().is_err());
    }
}
