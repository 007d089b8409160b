//! Poll cycle: timer-driven discovery and dispatch of eligible work items.
//!
//! A single self-rescheduling loop. Each tick queries both collections under
//! their eligibility predicates and hands the results to the dispatch path.
//! The next tick is scheduled from the moment the current one settles, so a
//! slow tick stretches the effective period rather than piling up. No tick
//! outcome, including query failure, ever stops the loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::sleep;

use super::Shared;
use crate::records::{RecordStatus, WorkItem};

/// Fixed cadence between ticks, measured from tick completion.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(300);

pub(super) async fn run(shared: Arc<Shared>) {
    tracing::debug!(interval_ms = REFRESH_INTERVAL.as_millis() as u64, "poll cycle started");
    loop {
        tick(&shared, Utc::now()).await;
        sleep(REFRESH_INTERVAL).await;
    }
}

/// Run one poll tick at the given instant.
pub(super) async fn tick(shared: &Shared, now: DateTime<Utc>) {
    let settings = shared.current_settings().await;
    let stale_before = settings.stale_before(now);
    let today = now.date_naive();

    // Bookings dispatch only inside the window around the venue's release
    // instant; outside it the collection is not even queried.
    if settings.booking_window_contains(now) {
        match shared.store.due_bookings(today, stale_before).await {
            Ok(records) => dispatch(shared, records, stale_before, now).await,
            Err(e) => {
                tracing::error!(error = %e, "booking query failed; skipping this tick's dispatch");
            }
        }
    }

    let last_open_date = settings.last_open_date(today);
    match shared
        .store
        .active_watches(today, last_open_date, stale_before)
        .await
    {
        Ok(records) => dispatch(shared, records, stale_before, now).await,
        Err(e) => {
            tracing::error!(error = %e, "cancellation watch query failed; skipping this tick's dispatch");
        }
    }
}

/// Deduplicate query results against the registry and spawn bots for the
/// identities that need one.
async fn dispatch(
    shared: &Shared,
    records: Vec<WorkItem>,
    stale_before: DateTime<Utc>,
    now: DateTime<Utc>,
) {
    for record in records {
        let id = record.id();
        let stale = record.is_stale(stale_before);

        if let Some(existing) = shared.registry.find(id).await {
            if !stale {
                // Already has an active bot; identity-based dedup.
                continue;
            }
            // The bot stalled: its record sat in `inprogress` past the
            // timeout. Tear it down and give the item a fresh bot.
            tracing::warn!(%id, kind = %record.kind(), "stalled bot detected; restarting");
            shared.registry.unregister(id).await;
            if let Err(e) = existing.destroy().await {
                tracing::warn!(%id, error = %e, "stalled bot teardown failed");
            }
        }

        if stale {
            // Stamp the record before spawning so the stale predicate stops
            // matching it until the new bot has had a full interval to report.
            if let Err(e) = shared
                .store
                .update_status(record.kind(), id, RecordStatus::InProgress, "", now)
                .await
            {
                tracing::warn!(%id, error = %e, "failed to stamp stalled record before respawn");
            }
        }

        spawn_bot(shared, &record).await;
    }
}

/// Construct and register a bot for `record`. Registration happens before
/// this returns, so the next tick's dedup sees the identity as taken.
async fn spawn_bot(shared: &Shared, record: &WorkItem) {
    let id = record.id();
    let settings = shared.current_settings().await;

    let bot = match shared
        .factory
        .spawn(record, settings, shared.status_tx.clone())
        .await
    {
        Ok(bot) => bot,
        Err(e) => {
            tracing::error!(%id, error = %e, "bot spawn failed");
            return;
        }
    };

    match shared.registry.register(Arc::clone(&bot)).await {
        Ok(()) => {
            tracing::info!(%id, kind = %record.kind(), "bot spawned");
        }
        Err(e) => {
            // Lost a race with a concurrent dispatch for the same identity.
            tracing::warn!(%id, error = %e, "discarding duplicate bot");
            if let Err(e) = bot.destroy().await {
                tracing::warn!(%id, error = %e, "duplicate bot teardown failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeDelta};
    use tokio::sync::{mpsc, RwLock};
    use uuid::Uuid;

    use crate::bot::registry::Registry;
    use crate::bot::{Bot, BotFactory, StatusEvent};
    use crate::error::{BotError, StoreError};
    use crate::records::{BookingSchedule, CancellationWatch, RecordStatus, WorkItemKind};
    use crate::settings::{Settings, SettingsProvider, StaticSettings};
    use crate::store::{MemoryStore, RecordStore};

    struct CountingStore {
        booking_queries: AtomicUsize,
        watch_queries: AtomicUsize,
        bookings: Vec<WorkItem>,
    }

    impl CountingStore {
        fn new(bookings: Vec<WorkItem>) -> Self {
            Self {
                booking_queries: AtomicUsize::new(0),
                watch_queries: AtomicUsize::new(0),
                bookings,
            }
        }
    }

    #[async_trait]
    impl RecordStore for CountingStore {
        async fn due_bookings(
            &self,
            _today: NaiveDate,
            _stale_before: DateTime<Utc>,
        ) -> Result<Vec<WorkItem>, StoreError> {
            self.booking_queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.bookings.clone())
        }

        async fn active_watches(
            &self,
            _today: NaiveDate,
            _last_open_date: NaiveDate,
            _stale_before: DateTime<Utc>,
        ) -> Result<Vec<WorkItem>, StoreError> {
            self.watch_queries.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn update_status(
            &self,
            _kind: WorkItemKind,
            _id: Uuid,
            _status: RecordStatus,
            _message: &str,
            _status_time: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct NoopBot {
        id: Uuid,
        destroys: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Bot for NoopBot {
        fn id(&self) -> Uuid {
            self.id
        }

        fn kind(&self) -> WorkItemKind {
            WorkItemKind::Booking
        }

        async fn set_settings(&self, _settings: Arc<Settings>) {}

        async fn destroy(&self) -> Result<(), BotError> {
            self.destroys.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CountingFactory {
        spawns: AtomicUsize,
        destroys: Arc<AtomicUsize>,
    }

    impl CountingFactory {
        fn new() -> Self {
            Self {
                spawns: AtomicUsize::new(0),
                destroys: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl BotFactory for CountingFactory {
        async fn spawn(
            &self,
            record: &WorkItem,
            _settings: Arc<Settings>,
            _status_tx: mpsc::Sender<StatusEvent>,
        ) -> Result<Arc<dyn Bot>, BotError> {
            self.spawns.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NoopBot {
                id: record.id(),
                destroys: Arc::clone(&self.destroys),
            }))
        }
    }

    fn settings(target: DateTime<Utc>) -> Settings {
        Settings {
            booking_interval: Some(1),
            booking_target_date_time: target,
            start_before: 30,
            open_tee_times: 3,
        }
    }

    fn booking(status: RecordStatus, status_time: DateTime<Utc>) -> WorkItem {
        WorkItem::Booking(BookingSchedule {
            id: Uuid::new_v4(),
            status,
            status_message: String::new(),
            status_time,
            launch_date: Utc::now().date_naive(),
            account: None,
        })
    }

    fn shared(
        store: Arc<dyn RecordStore>,
        factory: Arc<dyn BotFactory>,
        settings: Settings,
    ) -> Arc<Shared> {
        let (status_tx, _status_rx) = mpsc::channel(8);
        Arc::new(Shared {
            registry: Registry::new(),
            store,
            factory,
            provider: Arc::new(StaticSettings::new(settings.clone())) as Arc<dyn SettingsProvider>,
            settings: RwLock::new(Arc::new(settings)),
            status_tx,
        })
    }

    #[tokio::test]
    async fn booking_query_gated_by_window() {
        let now = Utc::now();
        let store = Arc::new(CountingStore::new(Vec::new()));
        let factory = Arc::new(CountingFactory::new());
        // Target two hours out: now is well before the window opens.
        let shared = shared(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            factory,
            settings(now + TimeDelta::hours(2)),
        );

        tick(&shared, now).await;
        assert_eq!(store.booking_queries.load(Ordering::SeqCst), 0);
        // The watch collection is queried unconditionally.
        assert_eq!(store.watch_queries.load(Ordering::SeqCst), 1);

        // Inside the window the booking collection is queried too.
        tick(&shared, now + TimeDelta::hours(2)).await;
        assert_eq!(store.booking_queries.load(Ordering::SeqCst), 1);
        assert_eq!(store.watch_queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dedup_spawns_at_most_one_bot_per_identity() {
        let now = Utc::now();
        let record = booking(RecordStatus::Pending, now);
        let store = Arc::new(CountingStore::new(vec![record]));
        let factory = Arc::new(CountingFactory::new());
        let shared = shared(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            Arc::clone(&factory) as Arc<dyn BotFactory>,
            settings(now),
        );

        // Same record surfaces on three consecutive ticks.
        for _ in 0..3 {
            tick(&shared, now).await;
        }
        assert_eq!(factory.spawns.load(Ordering::SeqCst), 1);
        assert_eq!(shared.registry.len().await, 1);
    }

    #[tokio::test]
    async fn stale_record_restarts_its_bot() {
        let now = Utc::now();
        // Record stuck in inprogress since well past the one-minute timeout.
        let record = booking(RecordStatus::InProgress, now - TimeDelta::minutes(10));
        let id = record.id();
        let store = Arc::new(MemoryStore::new());
        store.insert(record).await;
        let factory = Arc::new(CountingFactory::new());
        let shared = shared(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            Arc::clone(&factory) as Arc<dyn BotFactory>,
            settings(now),
        );

        tick(&shared, now).await;
        assert_eq!(factory.spawns.load(Ordering::SeqCst), 1);
        assert_eq!(factory.destroys.load(Ordering::SeqCst), 0);
        // The record was stamped for the new bot's interval.
        assert_eq!(store.get(id).await.unwrap().status_time(), now);

        // The bot reports nothing for two minutes: the record goes stale
        // again, the registered bot is torn down and a fresh one takes over.
        let later = now + TimeDelta::minutes(2);
        tick(&shared, later).await;
        assert_eq!(factory.spawns.load(Ordering::SeqCst), 2);
        assert_eq!(factory.destroys.load(Ordering::SeqCst), 1);
        assert_eq!(shared.registry.len().await, 1);
        assert_eq!(store.get(id).await.unwrap().status_time(), later);
    }

    #[tokio::test]
    async fn restarted_bot_gets_a_full_interval_before_the_next_restart() {
        let now = Utc::now();
        let today = now.date_naive();
        // Watch stuck in inprogress since well past the one-minute timeout.
        let record = CancellationWatch {
            id: Uuid::new_v4(),
            status: RecordStatus::InProgress,
            status_message: String::new(),
            status_time: now - TimeDelta::minutes(10),
            from_date: today,
            to_date: today + TimeDelta::days(2),
            account: None,
        };
        let store = Arc::new(MemoryStore::new());
        store.insert(WorkItem::Watch(record)).await;
        let factory = Arc::new(CountingFactory::new());
        let shared = shared(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            Arc::clone(&factory) as Arc<dyn BotFactory>,
            settings(now),
        );

        // The replacement bot never reports. Ticks well inside its interval
        // must leave it alone rather than tearing it down every cycle.
        tick(&shared, now).await;
        for i in 1..=5i64 {
            tick(&shared, now + TimeDelta::milliseconds(300 * i)).await;
        }
        assert_eq!(factory.spawns.load(Ordering::SeqCst), 1);
        assert_eq!(factory.destroys.load(Ordering::SeqCst), 0);
        assert_eq!(shared.registry.len().await, 1);
    }

    #[tokio::test]
    async fn query_failure_skips_dispatch_but_not_the_other_branch() {
        struct FailingStore {
            watch_queries: AtomicUsize,
        }

        #[async_trait]
        impl RecordStore for FailingStore {
            async fn due_bookings(
                &self,
                _today: NaiveDate,
                _stale_before: DateTime<Utc>,
            ) -> Result<Vec<WorkItem>, StoreError> {
                Err(StoreError::QueryFailed {
                    reason: "down".into(),
                })
            }

            async fn active_watches(
                &self,
                _today: NaiveDate,
                _last_open_date: NaiveDate,
                _stale_before: DateTime<Utc>,
            ) -> Result<Vec<WorkItem>, StoreError> {
                self.watch_queries.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            }

            async fn update_status(
                &self,
                _kind: WorkItemKind,
                _id: Uuid,
                _status: RecordStatus,
                _message: &str,
                _status_time: DateTime<Utc>,
            ) -> Result<(), StoreError> {
                Ok(())
            }
        }

        let now = Utc::now();
        let store = Arc::new(FailingStore {
            watch_queries: AtomicUsize::new(0),
        });
        let factory = Arc::new(CountingFactory::new());
        let shared = shared(
            Arc::clone(&store) as Arc<dyn RecordStore>,
            Arc::clone(&factory) as Arc<dyn BotFactory>,
            settings(now),
        );

        tick(&shared, now).await;
        // Booking branch failed; the watch branch still ran and no bot spawned.
        assert_eq!(store.watch_queries.load(Ordering::SeqCst), 1);
        assert_eq!(factory.spawns.load(Ordering::SeqCst), 0);
    }
}
