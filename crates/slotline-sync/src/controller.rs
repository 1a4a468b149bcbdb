//! # Sync Controller
//!
//! Keeps one authoritative calendar snapshot current against three change
//! sources: the background poll, the push feed, and local mutations.
//!
//! ## Reconcile Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     SyncController Architecture                         │
//! │                                                                         │
//! │   poll task          push task          editor / quick setup            │
//! │   (interval)         (Subscription)     (mutation settled)              │
//! │       │                  │                  │                           │
//! │       │ Poll             │ Push             │ MutationSettled           │
//! │       └──────────────────┼──────────────────┘                           │
//! │                          ▼                                              │
//! │                 refresh queue (mpsc, coalescing)                        │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                 reconcile loop (serial)                                 │
//! │                  │                                                      │
//! │                  ├── edit gate open + background cause → skip           │
//! │                  │                                                      │
//! │                  └── refetch 24-day window ──► watch snapshot           │
//! │                                                                         │
//! │  Every cause converges on the same full refetch: no per-change         │
//! │  patching, no merge logic, one source of truth.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use slotline_core::window::{build_window, full_window_dates, page_dates};
use slotline_core::Day;
use slotline_db::Database;

use crate::auth::Credential;
use crate::channel::ChangeChannel;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::session::{EditGate, EditSession};

/// Queued refresh requests before coalescing kicks in. Small on purpose:
/// every entry triggers the same full refetch.
const REFRESH_QUEUE_CAPACITY: usize = 8;

// =============================================================================
// Refresh Causes
// =============================================================================

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshCause {
    /// Background poll timer fired.
    Poll,

    /// The push feed reported a remote change.
    Push,

    /// A local mutation committed; its result must be refetched.
    MutationSettled,

    /// An edit session was abandoned; catch up on suppressed changes.
    SessionClosed,

    /// Explicit caller request (initial load, pull-to-refresh).
    Manual,
}

impl RefreshCause {
    /// Background causes are the ones an open edit session suppresses.
    fn is_background(&self) -> bool {
        matches!(self, RefreshCause::Poll | RefreshCause::Push)
    }
}

/// Collapses queued causes into one. A foreground cause always wins, so
/// suppression never swallows a settled mutation.
fn coalesce(current: RefreshCause, next: RefreshCause) -> RefreshCause {
    if current.is_background() {
        next
    } else {
        current
    }
}

// =============================================================================
// Refresh Handle
// =============================================================================

/// Cheap handle for requesting refreshes from anywhere in the engine.
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<RefreshCause>,
}

impl RefreshHandle {
    /// Queues a refresh. A full queue means a refresh is already pending,
    /// so the request coalesces into it.
    pub fn request(&self, cause: RefreshCause) {
        match self.tx.try_send(cause) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(?cause, "Refresh queue full, request coalesced")
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(?cause, "Refresh queue closed, request dropped")
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> (RefreshHandle, mpsc::Receiver<RefreshCause>) {
        let (tx, rx) = mpsc::channel(REFRESH_QUEUE_CAPACITY);
        (RefreshHandle { tx }, rx)
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Cheap handle for painting rendering hints into the published snapshot
/// ahead of the authoritative refetch that replaces them.
#[derive(Clone)]
pub struct SnapshotHint {
    tx: watch::Sender<Option<ScheduleSnapshot>>,
}

impl SnapshotHint {
    pub(crate) fn new(tx: watch::Sender<Option<ScheduleSnapshot>>) -> Self {
        SnapshotHint { tx }
    }

    /// Schedule-clear hint: empties available slots and switches days off
    /// from `today` onward in the published snapshot, without touching
    /// storage. The settled refresh that follows the real clear replaces
    /// this with the authoritative readout.
    pub fn apply_clear(&self, today: NaiveDate) {
        self.tx.send_modify(|maybe| {
            if let Some(snapshot) = maybe {
                for day in &mut snapshot.days {
                    if day.date >= today {
                        day.slots.retain(|s| s.is_booked);
                        day.is_working_day = false;
                    }
                }
            }
        });
    }
}

/// One authoritative readout of the visible calendar.
#[derive(Debug, Clone)]
pub struct ScheduleSnapshot {
    /// Provider the snapshot belongs to.
    pub provider_id: String,

    /// Monotonic refresh counter; one increment per refetch.
    pub refresh_seq: u64,

    /// When the snapshot was fetched (provider-local).
    pub fetched_at: NaiveDateTime,

    /// All 24 visible days in order, starting at today.
    pub days: Vec<Day>,
}

// =============================================================================
// Controller
// =============================================================================

/// Orchestrates refresh feeds and owns the published snapshot.
pub struct SyncController {
    db: Database,
    channel: Arc<dyn ChangeChannel>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    gate: Arc<EditGate>,

    refresh_tx: mpsc::Sender<RefreshCause>,
    refresh_rx: StdMutex<Option<mpsc::Receiver<RefreshCause>>>,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: StdMutex<Option<mpsc::Receiver<()>>>,

    snapshot_tx: watch::Sender<Option<ScheduleSnapshot>>,
    provider: Arc<RwLock<Option<String>>>,
    refresh_seq: Arc<AtomicU64>,

    feed_tasks: StdMutex<Vec<JoinHandle<()>>>,
    loop_task: StdMutex<Option<JoinHandle<()>>>,
}

impl SyncController {
    /// Creates a controller. Call [`start`](Self::start) to spawn the
    /// reconcile loop, then [`observe`](Self::observe) to attach a provider.
    pub fn new(
        db: Database,
        channel: Arc<dyn ChangeChannel>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (refresh_tx, refresh_rx) = mpsc::channel(REFRESH_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (snapshot_tx, _) = watch::channel(None);

        SyncController {
            db,
            channel,
            config,
            clock,
            gate: Arc::new(EditGate::new()),
            refresh_tx,
            refresh_rx: StdMutex::new(Some(refresh_rx)),
            shutdown_tx,
            shutdown_rx: StdMutex::new(Some(shutdown_rx)),
            snapshot_tx,
            provider: Arc::new(RwLock::new(None)),
            refresh_seq: Arc::new(AtomicU64::new(0)),
            feed_tasks: StdMutex::new(Vec::new()),
            loop_task: StdMutex::new(None),
        }
    }

    /// Spawns the reconcile loop. Idempotent; the second call is a no-op.
    pub fn start(&self) {
        let (rx, shutdown_rx) = {
            let rx = self.refresh_rx.lock().unwrap().take();
            let shutdown_rx = self.shutdown_rx.lock().unwrap().take();
            match (rx, shutdown_rx) {
                (Some(rx), Some(sd)) => (rx, sd),
                _ => {
                    debug!("Reconcile loop already running");
                    return;
                }
            }
        };

        let db = self.db.clone();
        let clock = self.clock.clone();
        let gate = self.gate.clone();
        let provider = self.provider.clone();
        let snapshot_tx = self.snapshot_tx.clone();
        let seq = self.refresh_seq.clone();

        let task = tokio::spawn(Self::reconcile_loop(
            db,
            clock,
            gate,
            provider,
            snapshot_tx,
            seq,
            rx,
            shutdown_rx,
        ));
        *self.loop_task.lock().unwrap() = Some(task);

        info!("Sync controller started");
    }

    /// Main reconcile loop: one queued request at a time, strictly serial.
    ///
    /// Serial consumption doubles as the in-flight guard: a refresh can
    /// never overlap another refresh or a mutation's settle step.
    #[allow(clippy::too_many_arguments)]
    async fn reconcile_loop(
        db: Database,
        clock: Arc<dyn Clock>,
        gate: Arc<EditGate>,
        provider: Arc<RwLock<Option<String>>>,
        snapshot_tx: watch::Sender<Option<ScheduleSnapshot>>,
        seq: Arc<AtomicU64>,
        mut rx: mpsc::Receiver<RefreshCause>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                maybe_cause = rx.recv() => {
                    let Some(mut cause) = maybe_cause else { break };

                    // Drain whatever queued up behind this request; they all
                    // mean the same refetch.
                    while let Ok(next) = rx.try_recv() {
                        cause = coalesce(cause, next);
                    }

                    if gate.is_open() && cause.is_background() {
                        debug!(?cause, "Refresh suppressed during edit session");
                        continue;
                    }

                    if let Err(e) =
                        Self::refresh_now(&db, clock.as_ref(), &provider, &snapshot_tx, &seq).await
                    {
                        warn!(error = %e, ?cause, "Refresh failed");
                    }
                }

                _ = shutdown_rx.recv() => {
                    info!("Reconcile loop received shutdown");
                    break;
                }
            }
        }

        info!("Reconcile loop stopped");
    }

    /// Fetches the full 24-day window and publishes a fresh snapshot.
    async fn refresh_now(
        db: &Database,
        clock: &dyn Clock,
        provider: &RwLock<Option<String>>,
        snapshot_tx: &watch::Sender<Option<ScheduleSnapshot>>,
        seq: &AtomicU64,
    ) -> EngineResult<()> {
        let Some(provider_id) = provider.read().await.clone() else {
            return Ok(());
        };

        let today = clock.today();
        let dates = full_window_dates(today);
        let from = *dates
            .first()
            .ok_or_else(|| EngineError::Storage("empty calendar window".into()))?;
        let to = *dates
            .last()
            .ok_or_else(|| EngineError::Storage("empty calendar window".into()))?;

        let slots = db.slots().list_by_date_range(&provider_id, from, to).await?;
        let map = db.schedule().working_map(&provider_id, from, to).await?;
        let days = build_window(&dates, slots, &map);

        let snapshot = ScheduleSnapshot {
            provider_id,
            refresh_seq: seq.fetch_add(1, Ordering::SeqCst) + 1,
            fetched_at: clock.now(),
            days,
        };

        debug!(seq = snapshot.refresh_seq, "Publishing schedule snapshot");
        snapshot_tx.send_replace(Some(snapshot));
        Ok(())
    }

    /// Attaches the controller to a provider: detaches any previous feeds,
    /// spawns poll + push feeds, and queues the initial load.
    pub async fn observe(&self, provider_id: &str) -> EngineResult<()> {
        info!(provider = %provider_id, "Observing provider");

        self.db.providers().ensure(provider_id).await?;
        *self.provider.write().await = Some(provider_id.to_string());
        self.detach_feeds();

        let mut tasks = Vec::new();

        if self.config.engine.enabled {
            let tx = self.refresh_tx.clone();
            let every = self.config.poll_interval();
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // the initial load below covers the first tick
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if tx.is_closed() {
                        break;
                    }
                    let _ = tx.try_send(RefreshCause::Poll);
                }
            }));
        }

        let mut sub = self.channel.subscribe(provider_id);
        let tx = self.refresh_tx.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(change) = sub.recv().await {
                debug!(slot = %change.slot_id, kind = ?change.kind, "Remote slot change");
                if tx.is_closed() {
                    break;
                }
                let _ = tx.try_send(RefreshCause::Push);
            }
        }));

        *self.feed_tasks.lock().unwrap() = tasks;
        self.refresh_handle().request(RefreshCause::Manual);
        Ok(())
    }

    /// Detaches the current provider and retracts the snapshot.
    pub async fn stop_observing(&self) {
        self.detach_feeds();
        *self.provider.write().await = None;
        self.snapshot_tx.send_replace(None);
        info!("Stopped observing");
    }

    fn detach_feeds(&self) {
        for task in self.feed_tasks.lock().unwrap().drain(..) {
            task.abort();
        }
    }

    /// Stops the reconcile loop and all feeds.
    pub async fn shutdown(&self) {
        info!("Shutting down sync controller");
        self.detach_feeds();
        let _ = self.shutdown_tx.send(()).await;
        if let Some(task) = self.loop_task.lock().unwrap().take() {
            task.abort();
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Opens an edit session, suppressing background refreshes until it
    /// closes. At most one session can be open.
    pub fn begin_edit(&self) -> EngineResult<EditSession> {
        EditSession::begin(self.gate.clone(), self.refresh_handle())
    }

    /// Returns a handle for requesting refreshes.
    pub fn refresh_handle(&self) -> RefreshHandle {
        RefreshHandle {
            tx: self.refresh_tx.clone(),
        }
    }

    /// Subscribes to published snapshots. `None` until the first refresh
    /// lands and after `stop_observing`.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Option<ScheduleSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Authoritative direct fetch of one calendar page, bypassing the
    /// snapshot.
    pub async fn page(&self, page: u32) -> EngineResult<Vec<Day>> {
        let provider_id = self
            .provider
            .read()
            .await
            .clone()
            .ok_or(EngineError::NotObserving)?;

        let today = self.clock.today();
        let dates = page_dates(today, page)?;
        let from = *dates
            .first()
            .ok_or_else(|| EngineError::Storage("empty page".into()))?;
        let to = *dates
            .last()
            .ok_or_else(|| EngineError::Storage("empty page".into()))?;

        let slots = self
            .db
            .slots()
            .list_by_date_range(&provider_id, from, to)
            .await?;
        let map = self.db.schedule().working_map(&provider_id, from, to).await?;
        Ok(build_window(&dates, slots, &map))
    }

    /// Whether the provider is visible to bookers.
    pub async fn is_visible(&self, provider_id: &str) -> EngineResult<bool> {
        Ok(self.db.providers().is_visible(provider_id).await?)
    }

    /// Sets the provider's visibility flag.
    pub async fn set_visible(
        &self,
        credential: &Credential,
        provider_id: &str,
        visible: bool,
    ) -> EngineResult<()> {
        credential.ensure_valid(chrono::Utc::now())?;
        self.db.providers().set_visible(provider_id, visible).await?;
        Ok(())
    }

    /// Returns a handle for the optimistic snapshot hints. The quick-setup
    /// clear paints its hint through this before touching storage.
    pub fn snapshot_hint(&self) -> SnapshotHint {
        SnapshotHint::new(self.snapshot_tx.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChangeKind, LocalChangeChannel, SlotChange};
    use crate::clock::FixedClock;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use slotline_core::{Slot, SlotTime};
    use slotline_db::DbConfig;
    use std::time::Duration;

    fn fixed_clock() -> Arc<FixedClock> {
        let at = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        Arc::new(FixedClock::new(at))
    }

    fn slot(id: &str, provider: &str, d: NaiveDate, start: &str) -> Slot {
        let start_time = SlotTime::parse(start).unwrap();
        Slot {
            id: id.to_string(),
            provider_id: provider.to_string(),
            date: d,
            start_time,
            end_time: start_time.add_minutes(60).unwrap(),
            is_booked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn setup() -> (Database, Arc<LocalChangeChannel>, Arc<FixedClock>, SyncController) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let channel = Arc::new(LocalChangeChannel::new());
        let clock = fixed_clock();
        let controller = SyncController::new(
            db.clone(),
            channel.clone(),
            EngineConfig::default(),
            clock.clone(),
        );
        (db, channel, clock, controller)
    }

    async fn next_snapshot(
        rx: &mut watch::Receiver<Option<ScheduleSnapshot>>,
    ) -> ScheduleSnapshot {
        loop {
            rx.changed().await.unwrap();
            if let Some(snapshot) = rx.borrow_and_update().clone() {
                return snapshot;
            }
        }
    }

    #[tokio::test]
    async fn test_observe_publishes_initial_snapshot() {
        let (db, _channel, clock, controller) = setup().await;
        let today = clock.today();
        db.slots()
            .insert(&slot("s1", "prov-1", today, "09:00"))
            .await
            .unwrap();

        let mut rx = controller.subscribe_snapshots();
        controller.start();
        controller.observe("prov-1").await.unwrap();

        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.provider_id, "prov-1");
        assert_eq!(snapshot.days.len(), 24);
        assert_eq!(snapshot.days[0].date, today);
        assert_eq!(snapshot.days[0].slots.len(), 1);

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_push_change_triggers_refetch() {
        let (db, channel, clock, controller) = setup().await;
        let today = clock.today();

        let mut rx = controller.subscribe_snapshots();
        controller.start();
        controller.observe("prov-1").await.unwrap();
        let first = next_snapshot(&mut rx).await;
        assert!(first.days[0].slots.is_empty());

        // A remote booking lands: storage changes, then the push arrives.
        db.slots()
            .insert(&slot("s1", "prov-1", today, "10:00"))
            .await
            .unwrap();
        channel.publish(SlotChange {
            provider_id: "prov-1".to_string(),
            slot_id: "s1".to_string(),
            kind: ChangeKind::Booked,
        });

        let second = next_snapshot(&mut rx).await;
        assert_eq!(second.days[0].slots.len(), 1);
        assert!(second.refresh_seq > first.refresh_seq);

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_poll_refetches_on_interval() {
        let (db, _channel, clock, controller) = setup().await;
        let today = clock.today();

        let mut rx = controller.subscribe_snapshots();
        controller.start();
        controller.observe("prov-1").await.unwrap();
        let first = next_snapshot(&mut rx).await;

        db.slots()
            .insert(&slot("s1", "prov-1", today, "10:00"))
            .await
            .unwrap();

        // Pause only for the tick wait: sqlx runs its SQLite work on blocking
        // threads, and paused time auto-advances past the pool's acquire
        // timeout whenever the single in-memory connection is contended.
        // Paused time auto-advances to the next poll tick.
        tokio::time::pause();
        let second = next_snapshot(&mut rx).await;
        assert_eq!(second.days[0].slots.len(), 1);
        assert!(second.refresh_seq > first.refresh_seq);

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_edit_session_suppresses_background_refreshes() {
        let (db, channel, clock, controller) = setup().await;
        let today = clock.today();

        let mut rx = controller.subscribe_snapshots();
        controller.start();
        controller.observe("prov-1").await.unwrap();
        next_snapshot(&mut rx).await;

        // Runs under real time: sqlx runs its SQLite work on blocking
        // threads, and paused time auto-advances past the pool's acquire
        // timeout whenever the single in-memory connection is contended.

        let session = controller.begin_edit().unwrap();

        db.slots()
            .insert(&slot("s1", "prov-1", today, "10:00"))
            .await
            .unwrap();
        channel.publish(SlotChange {
            provider_id: "prov-1".to_string(),
            slot_id: "s1".to_string(),
            kind: ChangeKind::Updated,
        });

        // Give the loop room; the push must be swallowed, not applied.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!rx.has_changed().unwrap());

        // Abandoning the session catches up on what was suppressed.
        drop(session);
        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.days[0].slots.len(), 1);

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_switching_providers_detaches_old_feed() {
        let (db, channel, clock, controller) = setup().await;
        let today = clock.today();

        let mut rx = controller.subscribe_snapshots();
        controller.start();
        controller.observe("prov-1").await.unwrap();
        next_snapshot(&mut rx).await;

        controller.observe("prov-2").await.unwrap();
        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.provider_id, "prov-2");

        // A change on the old provider must not repaint the new one.
        db.slots()
            .insert(&slot("s1", "prov-1", today, "10:00"))
            .await
            .unwrap();
        channel.publish(SlotChange {
            provider_id: "prov-1".to_string(),
            slot_id: "s1".to_string(),
            kind: ChangeKind::Updated,
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        match rx.borrow().as_ref() {
            Some(current) => assert_eq!(current.provider_id, "prov-2"),
            None => panic!("snapshot retracted unexpectedly"),
        }

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_page_is_an_authoritative_fetch() {
        let (db, _channel, clock, controller) = setup().await;
        let today = clock.today();

        controller.start();
        controller.observe("prov-1").await.unwrap();

        db.slots()
            .insert(&slot("s1", "prov-1", today, "09:30"))
            .await
            .unwrap();

        // No refresh requested; page() reads storage directly.
        let days = controller.page(0).await.unwrap();
        assert_eq!(days.len(), 8);
        assert_eq!(days[0].slots.len(), 1);

        assert!(matches!(
            controller.page(3).await,
            Err(EngineError::Validation(_))
        ));

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_page_requires_observation() {
        let (_db, _channel, _clock, controller) = setup().await;
        controller.start();
        assert!(matches!(
            controller.page(0).await,
            Err(EngineError::NotObserving)
        ));
        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_clear_hint_mutates_snapshot_only() {
        let (db, _channel, clock, controller) = setup().await;
        let today = clock.today();

        db.slots()
            .insert(&slot("free", "prov-1", today, "09:00"))
            .await
            .unwrap();
        db.slots()
            .insert(&slot("held", "prov-1", today, "10:00"))
            .await
            .unwrap();
        db.slots().set_booked("held", true).await.unwrap();

        let mut rx = controller.subscribe_snapshots();
        controller.start();
        controller.observe("prov-1").await.unwrap();
        next_snapshot(&mut rx).await;

        controller.snapshot_hint().apply_clear(clock.today());

        let hint = rx.borrow().clone().unwrap();
        assert!(!hint.days[0].is_working_day);
        let ids: Vec<&str> = hint.days[0].slots.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["held"]);

        // Storage was never touched.
        assert_eq!(db.slots().list_by_date("prov-1", today).await.unwrap().len(), 2);

        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_visibility_passthrough() {
        let (_db, _channel, _clock, controller) = setup().await;
        let cred = Credential::new("tok");

        assert!(controller.is_visible("prov-1").await.unwrap());
        controller.set_visible(&cred, "prov-1", false).await.unwrap();
        assert!(!controller.is_visible("prov-1").await.unwrap());

        let anon = Credential::new("");
        assert!(matches!(
            controller.set_visible(&anon, "prov-1", true).await,
            Err(EngineError::MissingCredential)
        ));
    }
}
