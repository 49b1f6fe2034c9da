//! Polling loop: fetch, detect, broadcast, commit.
//!
//! The [`Scheduler`] owns the [`CacheStore`] and drives one cycle per tick
//! of a fixed interval until stopped through its [`SchedulerHandle`]. Each
//! cycle ends in an explicit [`CycleOutcome`]; no outcome is fatal to the
//! loop.
//!
//! ```text
//! tick ─► fetch ──err──► Skipped
//!           │
//!           ▼
//!         detect ─► broadcast ─► commit ──err──► CommitFailed
//!                                   │
//!                                   ▼
//!                               Completed
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::broadcast::{BroadcastReport, Dispatcher};
use super::cache::CacheStore;
use super::detector::{detect, sort_by_id};
use super::lifecycle::{shutdown_requested, Lifecycle, LifecycleState, SchedulerHandle};
use super::registry::ChatRegistry;
use crate::domain::ChangeEvent;
use crate::error::{Error, FetchError, Result, StoreError};
use crate::port::outbound::CatalogFetcher;

/// Settings for the polling loop.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Seller whose catalog is watched.
    pub seller_id: String,
    /// Time between the starts of two cycles.
    pub poll_interval: Duration,
    /// Upper bound on one catalog fetch.
    pub fetch_timeout: Duration,
    /// Sort fetched listings by id so event order is deterministic.
    pub sort_by_id: bool,
    /// Record the first catalog silently when the cache starts empty.
    pub prime_on_empty: bool,
}

/// How a single cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The fetch failed; nothing was detected, sent or committed.
    Skipped(FetchError),
    /// The cache started empty and the catalog was recorded without
    /// announcing anything.
    Primed { recorded: usize },
    /// Events were detected, broadcast and committed.
    Completed {
        events: Vec<ChangeEvent>,
        report: BroadcastReport,
    },
    /// Events were broadcast but the cache could not be persisted. The
    /// cache is unchanged, so the same events will be detected again.
    CommitFailed {
        events: Vec<ChangeEvent>,
        report: BroadcastReport,
        error: StoreError,
    },
    /// Stop was requested before the cycle reached the broadcast.
    Cancelled,
}

impl CycleOutcome {
    /// Whether the cycle advanced the cache as intended.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Primed { .. } | Self::Completed { .. })
    }

    fn log(&self) {
        match self {
            Self::Skipped(e) => warn!(error = %e, "Catalog fetch failed, skipping cycle"),
            Self::Primed { recorded } => {
                info!(recorded = recorded, "Cache primed without announcing");
            }
            Self::Completed { events, report } if events.is_empty() => {
                debug!(attempted = report.attempted, "No catalog changes");
            }
            Self::Completed { events, report } => info!(
                events = events.len(),
                delivered = report.succeeded,
                failed = report.failed(),
                "Cycle completed"
            ),
            Self::CommitFailed { events, error, .. } => error!(
                events = events.len(),
                error = %error,
                "Failed to commit cache, cycle not advanced"
            ),
            Self::Cancelled => info!("Cycle cancelled by shutdown"),
        }
    }
}

/// Drives the poll/detect/broadcast/commit cycle.
pub struct Scheduler {
    config: SchedulerConfig,
    cache: CacheStore,
    fetcher: Arc<dyn CatalogFetcher>,
    registry: Arc<ChatRegistry>,
    dispatcher: Dispatcher,
    handle: SchedulerHandle,
    shutdown: watch::Receiver<bool>,
    lifecycle: Lifecycle,
    prime_pending: bool,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        cache: CacheStore,
        fetcher: Arc<dyn CatalogFetcher>,
        registry: Arc<ChatRegistry>,
        dispatcher: Dispatcher,
    ) -> Self {
        let (shutdown_tx, shutdown) = watch::channel(false);
        let lifecycle = Lifecycle::new();
        let handle = SchedulerHandle::new(shutdown_tx, lifecycle.clone());
        let prime_pending = config.prime_on_empty && cache.is_empty();

        Self {
            config,
            cache,
            fetcher,
            registry,
            dispatcher,
            handle,
            shutdown,
            lifecycle,
            prime_pending,
        }
    }

    /// A handle for stopping the loop from another task.
    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.get()
    }

    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Run cycles until stopped.
    ///
    /// The first cycle starts immediately. Between cycles the loop waits for
    /// the next tick, and that wait ends as soon as stop is requested. A
    /// scheduler runs once; calling `run` again is an error.
    pub async fn run(&mut self) -> Result<()> {
        let state = self.lifecycle.get();
        if state != LifecycleState::Idle {
            return Err(Error::Lifecycle(format!(
                "scheduler cannot run from state {state}"
            )));
        }
        self.lifecycle.transition(LifecycleState::Running);
        info!(
            seller_id = %self.config.seller_id,
            interval = ?self.config.poll_interval,
            source = self.fetcher.source_name(),
            cached = self.cache.len(),
            chats = self.registry.len(),
            "Scheduler started"
        );

        let mut shutdown = self.shutdown.clone();
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = shutdown_requested(&mut shutdown) => break,
                _ = ticker.tick() => {
                    let outcome = self.run_cycle().await;
                    outcome.log();
                }
            }
        }

        self.lifecycle.transition(LifecycleState::Stopping);
        self.lifecycle.transition(LifecycleState::Stopped);
        info!(cached = self.cache.len(), "Scheduler stopped");
        Ok(())
    }

    /// Run exactly one cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let mut shutdown = self.shutdown.clone();
        let fetch_timeout = self.config.fetch_timeout;

        let fetched = tokio::select! {
            biased;
            () = shutdown_requested(&mut shutdown) => return CycleOutcome::Cancelled,
            result = tokio::time::timeout(
                fetch_timeout,
                self.fetcher.fetch_listings(&self.config.seller_id),
            ) => result,
        };
        let mut listings = match fetched {
            Ok(Ok(listings)) => listings,
            Ok(Err(e)) => return CycleOutcome::Skipped(e),
            Err(_) => return CycleOutcome::Skipped(FetchError::Timeout(fetch_timeout)),
        };
        debug!(listings = listings.len(), "Catalog fetched");

        if self.config.sort_by_id {
            sort_by_id(&mut listings);
        }
        let events = detect(&listings, self.cache.snapshot());

        if self.prime_pending {
            if events.is_empty() {
                return CycleOutcome::Completed {
                    events,
                    report: BroadcastReport::default(),
                };
            }
            return match self.cache.commit(&events) {
                Ok(recorded) => {
                    self.prime_pending = false;
                    CycleOutcome::Primed { recorded }
                }
                Err(error) => CycleOutcome::CommitFailed {
                    events,
                    report: BroadcastReport::default(),
                    error,
                },
            };
        }

        if events.is_empty() {
            return CycleOutcome::Completed {
                events,
                report: BroadcastReport::default(),
            };
        }
        if *shutdown.borrow() {
            return CycleOutcome::Cancelled;
        }

        let chats = self.registry.list();
        if chats.is_empty() {
            debug!(events = events.len(), "No subscribed chats, recording changes only");
        }
        let report = self
            .dispatcher
            .broadcast(&events, &chats, &self.shutdown)
            .await;

        match self.cache.commit(&events) {
            Ok(_) => CycleOutcome::Completed { events, report },
            Err(error) => CycleOutcome::CommitFailed {
                events,
                report,
                error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, ListingRecord};
    use crate::testkit::catalog::ScriptedFetcher;
    use crate::testkit::config;
    use crate::testkit::domain::listing;
    use crate::testkit::storage::MemoryStorage;
    use crate::testkit::transport::RecordingTransport;
    use rust_decimal_macros::dec;

    struct Fixture {
        scheduler: Scheduler,
        cache_storage: Arc<MemoryStorage>,
        transport: RecordingTransport,
    }

    fn fixture(fetcher: ScriptedFetcher, config: SchedulerConfig, chats: &[i64]) -> Fixture {
        let cache_storage = Arc::new(MemoryStorage::new());
        let cache = CacheStore::load(cache_storage.clone(), false).unwrap();
        let registry = Arc::new(ChatRegistry::load(Arc::new(MemoryStorage::new())).unwrap());
        for &chat in chats {
            registry.subscribe(ChatId::new(chat)).unwrap();
        }
        let transport = RecordingTransport::new();
        let dispatcher = Dispatcher::new(Arc::new(transport.clone()), config::broadcast());

        Fixture {
            scheduler: Scheduler::new(config, cache, Arc::new(fetcher), registry, dispatcher),
            cache_storage,
            transport,
        }
    }

    #[tokio::test]
    async fn fetch_failure_skips_cycle_without_side_effects() {
        let mut f = fixture(ScriptedFetcher::new().then_fail(503), config::scheduler(10), &[1]);

        let outcome = f.scheduler.run_cycle().await;

        assert!(matches!(outcome, CycleOutcome::Skipped(FetchError::Status(503))));
        assert!(!outcome.is_success());
        assert!(f.scheduler.cache().is_empty());
        assert_eq!(f.cache_storage.write_count(), 0);
        assert_eq!(f.transport.total_sent(), 0);
    }

    #[tokio::test]
    async fn announcement_time_moves_only_when_a_change_is_announced() {
        let later = |mut record: ListingRecord, days: i64| {
            record.announced_at = record.announced_at + chrono::Duration::days(days);
            record
        };
        let first = listing("A", dec!(10));
        let announced = first.announced_at;
        let fetcher = ScriptedFetcher::new()
            .then_listings(vec![first])
            .then_listings(vec![later(listing("A", dec!(10)), 1)])
            .then_listings(vec![later(listing("A", dec!(8)), 2)]);
        let mut f = fixture(fetcher, config::scheduler(10), &[1]);

        assert!(f.scheduler.run_cycle().await.is_success());
        assert!(f.scheduler.run_cycle().await.is_success());
        let cached = f.scheduler.cache().get(&"A".into()).unwrap();
        assert_eq!(cached.announced_at, announced);

        assert!(f.scheduler.run_cycle().await.is_success());
        let cached = f.scheduler.cache().get(&"A".into()).unwrap();
        assert!(cached.announced_at > announced);
        assert_eq!(cached.price(), dec!(8));
    }

    #[tokio::test]
    async fn slow_fetch_times_out_as_skip() {
        let fetcher = ScriptedFetcher::new()
            .then_listings(vec![listing("A", dec!(1))])
            .with_delay(Duration::from_secs(5));
        let mut config = config::scheduler(10);
        config.fetch_timeout = Duration::from_millis(20);
        let mut f = fixture(fetcher, config, &[1]);

        assert!(matches!(
            f.scheduler.run_cycle().await,
            CycleOutcome::Skipped(FetchError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn new_listing_is_announced_once() {
        let fetcher = ScriptedFetcher::new().then_listings(vec![listing("A", dec!(10))]);
        let mut f = fixture(fetcher, config::scheduler(10), &[1, 2]);

        match f.scheduler.run_cycle().await {
            CycleOutcome::Completed { events, report } => {
                assert_eq!(events.len(), 1);
                assert_eq!(report.succeeded, 2);
            }
            other => panic!("expected completed cycle, got {other:?}"),
        }

        match f.scheduler.run_cycle().await {
            CycleOutcome::Completed { events, .. } => assert!(events.is_empty()),
            other => panic!("expected quiet cycle, got {other:?}"),
        }
        assert_eq!(f.transport.total_sent(), 2);
    }

    #[tokio::test]
    async fn commit_failure_keeps_cache_and_reannounces() {
        let fetcher = ScriptedFetcher::new().then_listings(vec![listing("A", dec!(10))]);
        let mut f = fixture(fetcher, config::scheduler(10), &[1]);
        f.cache_storage.fail_writes(true);

        let outcome = f.scheduler.run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::CommitFailed { .. }));
        assert!(!outcome.is_success());
        assert!(f.scheduler.cache().is_empty());

        f.cache_storage.fail_writes(false);
        match f.scheduler.run_cycle().await {
            CycleOutcome::Completed { events, .. } => assert_eq!(events.len(), 1),
            other => panic!("expected retry of detection, got {other:?}"),
        }
        assert!(f.scheduler.cache().contains(&"A".into()));
    }

    #[tokio::test]
    async fn priming_records_first_catalog_silently() {
        let fetcher = ScriptedFetcher::new()
            .then_listings(vec![listing("A", dec!(10)), listing("B", dec!(4))])
            .then_listings(vec![
                listing("A", dec!(10)),
                listing("B", dec!(4)),
                listing("C", dec!(7)),
            ]);
        let mut config = config::scheduler(10);
        config.prime_on_empty = true;
        let mut f = fixture(fetcher, config, &[1]);

        assert!(matches!(
            f.scheduler.run_cycle().await,
            CycleOutcome::Primed { recorded: 2 }
        ));
        assert_eq!(f.transport.total_sent(), 0);

        match f.scheduler.run_cycle().await {
            CycleOutcome::Completed { events, .. } => {
                assert_eq!(events.len(), 1);
                assert_eq!(events[0].listing_id().as_str(), "C");
            }
            other => panic!("expected completed cycle, got {other:?}"),
        }
        assert_eq!(f.transport.total_sent(), 1);
    }

    #[tokio::test]
    async fn stop_before_run_ends_without_fetching() {
        let fetcher = ScriptedFetcher::new().then_listings(vec![listing("A", dec!(10))]);
        let mut f = fixture(fetcher.clone(), config::scheduler(10), &[1]);

        let handle = f.scheduler.handle();
        handle.stop();
        f.scheduler.run().await.unwrap();

        assert_eq!(f.scheduler.state(), LifecycleState::Stopped);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn run_twice_is_rejected() {
        let mut f = fixture(ScriptedFetcher::new(), config::scheduler(10), &[]);
        f.scheduler.handle().stop();
        f.scheduler.run().await.unwrap();

        assert!(matches!(f.scheduler.run().await, Err(Error::Lifecycle(_))));
    }

    #[tokio::test]
    async fn stop_interrupts_long_interval_wait() {
        let fetcher = ScriptedFetcher::new().then_listings(vec![listing("A", dec!(10))]);
        let f = fixture(fetcher.clone(), config::scheduler(3_600_000), &[1]);
        let handle = f.scheduler.handle();
        let mut scheduler = f.scheduler;

        let task = tokio::spawn(async move {
            scheduler.run().await.unwrap();
            scheduler
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.state(), LifecycleState::Running);

        handle.stop();
        let scheduler = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("run should observe stop promptly")
            .unwrap();

        assert_eq!(scheduler.state(), LifecycleState::Stopped);
        assert_eq!(fetcher.calls(), 1);
        assert!(scheduler.cache().contains(&"A".into()));
    }

    #[tokio::test]
    async fn stop_interrupts_in_flight_fetch() {
        let fetcher = ScriptedFetcher::new()
            .then_listings(vec![listing("A", dec!(10))])
            .with_delay(Duration::from_secs(30));
        let mut config = config::scheduler(10);
        config.fetch_timeout = Duration::from_secs(60);
        let f = fixture(fetcher, config, &[1]);
        let handle = f.scheduler.handle();
        let mut scheduler = f.scheduler;

        let task = tokio::spawn(async move { scheduler.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop();

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("stop should cancel the fetch")
            .unwrap()
            .unwrap();
        assert_eq!(handle.state(), LifecycleState::Stopped);
    }
}
