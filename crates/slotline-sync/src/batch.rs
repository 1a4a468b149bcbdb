//! # Quick Setup
//!
//! Bulk population of the 7-day setup window from one time range + duration,
//! and the inverse schedule clear.
//!
//! ## Batch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Quick Setup Flow                                  │
//! │                                                                         │
//! │  range + duration                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  generate starts (once) ──► day 0 drops past starts ──► 7 day plans    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  replace_window (single transaction)                                   │
//! │       │                                                                 │
//! │       ├── window holds slots + no confirm ──► ConfirmationRequired,    │
//! │       │                                        nothing written          │
//! │       │                                                                 │
//! │       └── otherwise ──► available slots replaced, booked preserved,    │
//! │                          days flagged working ──► settled refresh       │
//! │                                                                         │
//! │  The existing-slots check runs inside the transaction, so a stale      │
//! │  client view can never skip the confirmation step. A batch that        │
//! │  reaches storage and fails still ends in a settled refetch.            │
//! │                                                                         │
//! │  The inverse clear paints an optimistic cleared snapshot first, then   │
//! │  reconciles it with the same settled refetch.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use tracing::info;

use slotline_core::generate::{filter_past_starts, generate_slots};
use slotline_core::validation::slot_end;
use slotline_core::window::setup_window;
use slotline_core::{Slot, SlotTime, MAX_PAGES, PAGE_DAYS};
use slotline_db::{ClearOutcome, Database, ReplaceOutcome, SlotRepository};

use crate::auth::Credential;
use crate::clock::Clock;
use crate::controller::{RefreshCause, RefreshHandle, SnapshotHint};
use crate::error::EngineResult;

// =============================================================================
// Request / Outcome
// =============================================================================

/// One quick-setup run over `today ..= today + 6`.
#[derive(Debug, Clone)]
pub struct SetupRequest {
    /// Provider whose window is being populated.
    pub provider_id: String,

    /// First possible start time of each day.
    pub from: SlotTime,

    /// Hard end of each day; no slot may end after it.
    pub to: SlotTime,

    /// Slot duration in minutes.
    pub duration_minutes: i64,

    /// Caller has confirmed that existing slots in the window may be
    /// replaced.
    pub confirm_replace: bool,
}

/// What a quick-setup run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The window was rewritten.
    Applied(SetupSummary),

    /// The window already holds slots and `confirm_replace` was not set.
    /// Nothing was written; re-run with confirmation to proceed.
    ConfirmationRequired {
        /// Slots currently in the window.
        existing: i64,
    },
}

/// Counters from an applied quick-setup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupSummary {
    /// First day of the window.
    pub from: NaiveDate,

    /// Last day of the window.
    pub to: NaiveDate,

    /// Candidate starts generated per full day.
    pub starts_per_day: usize,

    /// Day-0 starts dropped by the past filter.
    pub dropped_past: usize,

    /// Available slots deleted from the window.
    pub deleted: u64,

    /// New slots inserted.
    pub inserted: u64,

    /// Booked slots that survived untouched.
    pub kept_booked: u64,

    /// Candidates skipped over surviving booked slots.
    pub skipped: u64,
}

// =============================================================================
// Quick Setup
// =============================================================================

/// Bulk setup and clear operations.
pub struct QuickSetup {
    db: Database,
    refresh: RefreshHandle,
    hint: SnapshotHint,
    clock: Arc<dyn Clock>,
}

impl QuickSetup {
    /// Creates a quick-setup coordinator sharing the controller's refresh
    /// queue and snapshot hint handle.
    pub fn new(
        db: Database,
        refresh: RefreshHandle,
        hint: SnapshotHint,
        clock: Arc<dyn Clock>,
    ) -> Self {
        QuickSetup {
            db,
            refresh,
            hint,
            clock,
        }
    }

    /// Runs one quick-setup batch.
    ///
    /// Generation happens once; every day of the window gets the same
    /// starts, except today, which drops starts at or before the current
    /// time. The write is all-or-nothing.
    pub async fn execute(
        &self,
        credential: &Credential,
        request: SetupRequest,
    ) -> EngineResult<SetupOutcome> {
        credential.ensure_valid(Utc::now())?;

        let today = self.clock.today();
        let now = self.clock.time_of_day();
        let (from, to) = setup_window(today);

        let starts = generate_slots(request.from, request.to, request.duration_minutes)?;
        let starts_per_day = starts.len();
        let day0_starts = filter_past_starts(starts.clone(), now);
        let dropped_past = starts_per_day - day0_starts.len();

        let created_at = Utc::now();
        let mut planned = Vec::new();
        let mut day = from;
        while day <= to {
            let day_starts = if day == today { &day0_starts } else { &starts };
            for &start in day_starts {
                planned.push(Slot {
                    id: SlotRepository::generate_slot_id(),
                    provider_id: request.provider_id.clone(),
                    date: day,
                    start_time: start,
                    end_time: slot_end(start, request.duration_minutes)?,
                    is_booked: false,
                    created_at,
                    updated_at: created_at,
                });
            }
            day = day + Days::new(1);
        }

        let outcome = match self
            .db
            .slots()
            .replace_window(
                &request.provider_id,
                from,
                to,
                &planned,
                !request.confirm_replace,
            )
            .await
        {
            Ok(outcome) => outcome,
            // The batch reached storage and failed; a reload is mandatory,
            // since the window may be anywhere between old and new.
            Err(e) => {
                self.refresh.request(RefreshCause::MutationSettled);
                return Err(e.into());
            }
        };

        match outcome {
            ReplaceOutcome::ExistingSlots { count } => {
                info!(
                    provider = %request.provider_id,
                    existing = count,
                    "Quick setup needs confirmation"
                );
                Ok(SetupOutcome::ConfirmationRequired { existing: count })
            }
            ReplaceOutcome::Replaced {
                deleted,
                inserted,
                kept_booked,
                skipped,
            } => {
                info!(
                    provider = %request.provider_id,
                    inserted,
                    deleted,
                    kept_booked,
                    "Quick setup applied"
                );
                self.refresh.request(RefreshCause::MutationSettled);
                Ok(SetupOutcome::Applied(SetupSummary {
                    from,
                    to,
                    starts_per_day,
                    dropped_past,
                    deleted,
                    inserted,
                    kept_booked,
                    skipped,
                }))
            }
        }
    }

    /// Clears the provider's schedule from today through the end of the
    /// visible calendar: available slots deleted, booked slots kept, every
    /// day switched off.
    ///
    /// The published snapshot is painted with the cleared view immediately;
    /// the settled refresh that follows the storage write replaces the hint
    /// with the authoritative readout, on success and on failure alike.
    pub async fn clear(
        &self,
        credential: &Credential,
        provider_id: &str,
    ) -> EngineResult<ClearOutcome> {
        credential.ensure_valid(Utc::now())?;

        let today = self.clock.today();
        let through = today + Days::new(u64::from(MAX_PAGES * PAGE_DAYS) - 1);

        self.hint.apply_clear(today);

        let result = self.db.slots().clear_from(provider_id, today, through).await;
        self.refresh.request(RefreshCause::MutationSettled);
        let outcome = result?;

        info!(
            provider = %provider_id,
            deleted = outcome.deleted,
            kept_booked = outcome.kept_booked,
            "Schedule cleared"
        );
        Ok(outcome)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::controller::ScheduleSnapshot;
    use crate::error::EngineError;
    use chrono::NaiveTime;
    use slotline_core::window::{build_window, full_window_dates};
    use slotline_core::ValidationError;
    use slotline_db::DbConfig;
    use tokio::sync::{mpsc, watch};

    struct Fixture {
        db: Database,
        setup: QuickSetup,
        refresh_rx: mpsc::Receiver<RefreshCause>,
        snapshot_tx: watch::Sender<Option<ScheduleSnapshot>>,
        clock: Arc<FixedClock>,
        cred: Credential,
    }

    async fn fixture(hms: (u32, u32, u32)) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let at = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(hms.0, hms.1, hms.2).unwrap());
        let clock = Arc::new(FixedClock::new(at));
        let (refresh, refresh_rx) = RefreshHandle::for_tests();
        let (snapshot_tx, _) = watch::channel(None);
        let setup = QuickSetup::new(
            db.clone(),
            refresh,
            SnapshotHint::new(snapshot_tx.clone()),
            clock.clone(),
        );
        Fixture {
            db,
            setup,
            refresh_rx,
            snapshot_tx,
            clock,
            cred: Credential::new("tok"),
        }
    }

    fn t(input: &str) -> SlotTime {
        SlotTime::parse(input).unwrap()
    }

    fn request(confirm: bool) -> SetupRequest {
        SetupRequest {
            provider_id: "prov-1".to_string(),
            from: t("09:00"),
            to: t("11:00"),
            duration_minutes: 30,
            confirm_replace: confirm,
        }
    }

    #[tokio::test]
    async fn test_setup_populates_seven_days() {
        let mut f = fixture((6, 0, 0)).await;
        let today = f.clock.today();

        let outcome = f.setup.execute(&f.cred, request(false)).await.unwrap();
        let SetupOutcome::Applied(summary) = outcome else {
            panic!("expected applied outcome");
        };

        // 09:00..11:00 by 30 = 4 starts; clock reads 06:00 so day 0 keeps all
        assert_eq!(summary.starts_per_day, 4);
        assert_eq!(summary.dropped_past, 0);
        assert_eq!(summary.inserted, 28);
        assert_eq!(summary.from, today);
        assert_eq!(summary.to, today + Days::new(6));

        // every window day is flagged working
        let map = f
            .db
            .schedule()
            .working_map("prov-1", today, today + Days::new(6))
            .await
            .unwrap();
        for offset in 0..7 {
            assert!(map.is_working(today + Days::new(offset)));
        }

        // one settled refresh
        assert_eq!(f.refresh_rx.recv().await, Some(RefreshCause::MutationSettled));
        assert!(f.refresh_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_day_zero_drops_past_starts() {
        let f = fixture((9, 15, 0)).await;
        let today = f.clock.today();

        let outcome = f.setup.execute(&f.cred, request(false)).await.unwrap();
        let SetupOutcome::Applied(summary) = outcome else {
            panic!("expected applied outcome");
        };

        // 09:00 and 09:15-equal starts are gone from today only
        assert_eq!(summary.dropped_past, 1);
        assert_eq!(summary.inserted, 3 + 6 * 4);

        let day0 = f.db.slots().list_by_date("prov-1", today).await.unwrap();
        assert_eq!(day0[0].start_time, t("09:30"));

        let day1 = f
            .db
            .slots()
            .list_by_date("prov-1", today + Days::new(1))
            .await
            .unwrap();
        assert_eq!(day1[0].start_time, t("09:00"));
    }

    #[tokio::test]
    async fn test_existing_slots_demand_confirmation() {
        let mut f = fixture((6, 0, 0)).await;

        f.setup.execute(&f.cred, request(false)).await.unwrap();
        f.refresh_rx.recv().await;

        // second run without confirmation writes nothing
        let outcome = f.setup.execute(&f.cred, request(false)).await.unwrap();
        assert_eq!(outcome, SetupOutcome::ConfirmationRequired { existing: 28 });
        assert!(f.refresh_rx.try_recv().is_err());

        // confirmed run replaces
        let outcome = f.setup.execute(&f.cred, request(true)).await.unwrap();
        let SetupOutcome::Applied(summary) = outcome else {
            panic!("expected applied outcome");
        };
        assert_eq!(summary.deleted, 28);
        assert_eq!(summary.inserted, 28);
    }

    #[tokio::test]
    async fn test_replace_preserves_booked_slots() {
        let f = fixture((6, 0, 0)).await;
        let today = f.clock.today();

        f.setup.execute(&f.cred, request(false)).await.unwrap();

        // a booking lands on one of the generated slots
        let day0 = f.db.slots().list_by_date("prov-1", today).await.unwrap();
        let held = &day0[0];
        f.db.slots().set_booked(&held.id, true).await.unwrap();

        let outcome = f.setup.execute(&f.cred, request(true)).await.unwrap();
        let SetupOutcome::Applied(summary) = outcome else {
            panic!("expected applied outcome");
        };
        assert_eq!(summary.kept_booked, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.deleted, 27);

        let survivor = f.db.slots().get_by_id(&held.id).await.unwrap();
        assert!(survivor.is_booked);
    }

    #[tokio::test]
    async fn test_invalid_range_rejected_before_storage() {
        let mut f = fixture((6, 0, 0)).await;

        let mut bad = request(false);
        bad.duration_minutes = 0;
        let err = f.setup.execute(&f.cred, bad).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::NonPositiveDuration { .. })
        ));

        let mut bad = request(false);
        bad.from = t("11:00");
        bad.to = t("09:00");
        let err = f.setup.execute(&f.cred, bad).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::InvalidTimeRange { .. })
        ));

        assert_eq!(
            f.db.slots()
                .count_in_range("prov-1", f.clock.today(), f.clock.today() + Days::new(6))
                .await
                .unwrap(),
            0
        );
        assert!(f.refresh_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_clear_keeps_booked_and_switches_days_off() {
        let f = fixture((6, 0, 0)).await;
        let today = f.clock.today();

        f.setup.execute(&f.cred, request(false)).await.unwrap();

        let day0 = f.db.slots().list_by_date("prov-1", today).await.unwrap();
        f.db.slots().set_booked(&day0[0].id, true).await.unwrap();

        let outcome = f.setup.clear(&f.cred, "prov-1").await.unwrap();
        assert_eq!(outcome.deleted, 27);
        assert_eq!(outcome.kept_booked, 1);

        let map = f
            .db
            .schedule()
            .working_map("prov-1", today, today + Days::new(23))
            .await
            .unwrap();
        for offset in 0..24 {
            assert!(!map.is_working(today + Days::new(offset)));
        }
    }

    #[tokio::test]
    async fn test_clear_paints_hint_then_requests_refetch() {
        let mut f = fixture((6, 0, 0)).await;
        let today = f.clock.today();

        f.setup.execute(&f.cred, request(false)).await.unwrap();
        while f.refresh_rx.try_recv().is_ok() {}

        let day0 = f.db.slots().list_by_date("prov-1", today).await.unwrap();
        let held = day0[0].id.clone();
        f.db.slots().set_booked(&held, true).await.unwrap();

        // a published snapshot is on screen
        let dates = full_window_dates(today);
        let (from, to) = (dates[0], *dates.last().unwrap());
        let slots = f.db.slots().list_by_date_range("prov-1", from, to).await.unwrap();
        let map = f.db.schedule().working_map("prov-1", from, to).await.unwrap();
        f.snapshot_tx.send_replace(Some(ScheduleSnapshot {
            provider_id: "prov-1".to_string(),
            refresh_seq: 7,
            fetched_at: f.clock.now(),
            days: build_window(&dates, slots, &map),
        }));

        f.setup.clear(&f.cred, "prov-1").await.unwrap();

        // the hint landed in the same snapshot generation: cleared view,
        // booked slot retained, days off, sequence untouched
        let hinted = f.snapshot_tx.borrow().clone().unwrap();
        assert_eq!(hinted.refresh_seq, 7);
        assert!(!hinted.days[0].is_working_day);
        let ids: Vec<&str> = hinted.days[0].slots.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![held.as_str()]);

        // with the authoritative refetch queued behind it
        assert_eq!(f.refresh_rx.recv().await, Some(RefreshCause::MutationSettled));
    }

    #[tokio::test]
    async fn test_failed_batch_still_settles() {
        let mut f = fixture((6, 0, 0)).await;
        f.db.close().await;

        let err = f.setup.execute(&f.cred, request(false)).await.unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));

        // the batch reached storage and failed: the reload is mandatory
        assert!(matches!(
            f.refresh_rx.try_recv(),
            Ok(RefreshCause::MutationSettled)
        ));

        let err = f.setup.clear(&f.cred, "prov-1").await.unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));
        assert!(matches!(
            f.refresh_rx.try_recv(),
            Ok(RefreshCause::MutationSettled)
        ));
    }

    #[tokio::test]
    async fn test_setup_requires_credential() {
        let f = fixture((6, 0, 0)).await;
        let err = f
            .setup
            .execute(&Credential::new(""), request(false))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingCredential));
    }
}
