//! Refresh scheduler
//!
//! One control loop owns the refresh cadence. Each cycle goes
//! `Idle -> Populating -> Dispatching -> Draining -> Idle`:
//!
//! 1. wait for a trigger (timer tick or target registration)
//! 2. enumerate connections and add the cached ones to the registry
//! 3. spawn `min(pending, max_workers)` workers
//! 4. wait for every worker to exit
//!
//! Nothing in a cycle is fatal. Enumeration, fetch and store errors are logged
//! and the cycle always returns to idle.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let scheduler = Scheduler::builder()
//!     .registry(registry)
//!     .enumerator(Arc::new(StaticConnections::new(connections)))
//!     .fetcher(Arc::new(fetcher))
//!     .store(Arc::new(store))
//!     .build();
//!
//! let running = scheduler.start(shutdown.clone());
//! running.handle().register_target("mini:imageinfo:aws:ohio").await?;
//! ```

mod handle;
pub mod trigger;
mod worker;

pub use handle::{RunningScheduler, SchedulerHandle};
pub use trigger::{Trigger, TriggerClosed, TriggerReceiver, TriggerSource};
pub use worker::WorkerStats;

use std::sync::Arc;
use std::time::{Duration, Instant};

use bon::Builder;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, error, info, info_span, warn};
use uuid::Uuid;

use crate::cache::CacheStore;
use crate::config::SchedulerConfig;
use crate::connections::ConnectionEnumerator;
use crate::fetcher::Fetcher;
use crate::observability::Metrics;
use crate::registry::{DEFAULT_SLOT, TargetRegistry, target_name};
use worker::WorkerContext;

/// Cadence and pool sizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub refresh_interval: Duration,
    pub max_workers: usize,
    pub connection_prefix: String,
    pub warm_on_start: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        SchedulerSettings::from(&SchedulerConfig::default())
    }
}

impl From<&SchedulerConfig> for SchedulerSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            max_workers: config.max_workers,
            connection_prefix: config.connection_prefix.clone(),
            warm_on_start: config.warm_on_start,
        }
    }
}

/// Summary of one populate/dispatch/drain pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub source: TriggerSource,
    /// Targets added from enumeration this cycle
    pub populated: usize,
    pub enumeration_failed: bool,
    pub workers: usize,
    pub refreshed: usize,
    pub fetch_failures: usize,
    pub store_failures: usize,
    pub elapsed: Duration,
}

#[derive(Builder)]
pub struct Scheduler {
    registry: Arc<TargetRegistry>,
    enumerator: Arc<dyn ConnectionEnumerator>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn CacheStore>,
    #[builder(default)]
    settings: SchedulerSettings,
    #[builder(default)]
    metrics: Arc<Metrics>,
}

impl Scheduler {
    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Spawn the scheduler loop and the refresh timer
    ///
    /// Both stop when `shutdown` is cancelled. A cycle already in progress is
    /// allowed to finish.
    pub fn start(self, shutdown: CancellationToken) -> RunningScheduler {
        let (trigger, signals) = trigger::channel();
        let handle = SchedulerHandle::new(self.registry.clone(), trigger.clone());

        // interval_at panics on a zero period
        let period = self.settings.refresh_interval.max(Duration::from_millis(1));
        let timer_task = tokio::spawn(trigger::run_timer(
            trigger,
            period,
            self.settings.warm_on_start,
            shutdown.clone(),
        ));
        let scheduler_task = tokio::spawn(self.run(signals, shutdown));

        RunningScheduler::new(handle, scheduler_task, timer_task)
    }

    /// Scheduler control loop: block on the trigger, run a cycle, repeat
    pub async fn run(self, mut signals: TriggerReceiver, shutdown: CancellationToken) {
        info!(
            max_workers = self.settings.max_workers,
            refresh_interval_secs = self.settings.refresh_interval.as_secs(),
            connection_prefix = %self.settings.connection_prefix,
            "Scheduler started"
        );

        loop {
            let source = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                signal = signals.recv() => match signal {
                    Some(source) => source,
                    None => break,
                },
            };

            self.metrics.signal_received();
            self.run_cycle(source).await;
        }

        info!("Scheduler stopped");
    }

    /// Run one full cycle and report what happened
    pub async fn run_cycle(&self, source: TriggerSource) -> CycleReport {
        let cycle_id = Uuid::now_v7();
        let span = info_span!("refresh_cycle", %cycle_id, ?source);

        self.cycle(cycle_id, source).instrument(span).await
    }

    async fn cycle(&self, cycle_id: Uuid, source: TriggerSource) -> CycleReport {
        let started = Instant::now();
        info!("Refresh cycle started");

        // Populating
        let (populated, enumeration_failed) = match self.populate().await {
            Some(added) => (added, false),
            None => (0, true),
        };

        // Dispatching
        let pending = self.registry.count();
        let workers = pending.min(self.settings.max_workers);
        info!(pending, workers, "Dispatching workers");

        let ctx = WorkerContext {
            registry: self.registry.clone(),
            fetcher: self.fetcher.clone(),
            store: self.store.clone(),
            metrics: self.metrics.clone(),
        };

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            pool.spawn(worker::run(worker_id, ctx.clone()).instrument(Span::current()));
        }

        // Draining
        let mut report = CycleReport {
            cycle_id,
            source,
            populated,
            enumeration_failed,
            workers,
            refreshed: 0,
            fetch_failures: 0,
            store_failures: 0,
            elapsed: Duration::ZERO,
        };

        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(stats) => {
                    report.refreshed += stats.refreshed;
                    report.fetch_failures += stats.fetch_failures;
                    report.store_failures += stats.store_failures;
                }
                Err(e) => error!(error = %e, "Worker task terminated abnormally"),
            }
        }

        report.elapsed = started.elapsed();
        self.metrics.cycle_completed();

        info!(
            refreshed = report.refreshed,
            fetch_failures = report.fetch_failures,
            store_failures = report.store_failures,
            remaining = self.registry.count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Refresh cycle finished"
        );

        report
    }

    /// Add every cached connection to the registry
    ///
    /// Returns the number added, or `None` when enumeration failed.
    async fn populate(&self) -> Option<usize> {
        let descriptors = match self.enumerator.list().await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                warn!(error = %e, "Connection enumeration failed, continuing with pending targets");
                self.metrics.enumeration_failed();
                return None;
            }
        };

        let prefix = &self.settings.connection_prefix;
        let mut added = 0;
        for descriptor in descriptors.iter().filter(|d| d.participates(prefix)) {
            self.registry.add(
                target_name(&descriptor.name, DEFAULT_SLOT),
                descriptor.name.clone(),
                descriptor.metadata_kind(),
            );
            added += 1;
        }

        info!(listed = descriptors.len(), added, "Registry populated");
        Some(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ObjectCacheStore;
    use crate::connections::{ConnectionDescriptor, EnumerationError, StaticConnections};
    use crate::fetcher::Result as FetchResult;
    use crate::registry::MetadataKind;
    use async_trait::async_trait;
    use bytes::Bytes;

    struct EchoFetcher;

    #[async_trait]
    impl Fetcher for EchoFetcher {
        async fn fetch(&self, connection_id: &str) -> FetchResult<Bytes> {
            Ok(Bytes::from(connection_id.to_string()))
        }
    }

    struct FailingEnumerator;

    #[async_trait]
    impl ConnectionEnumerator for FailingEnumerator {
        async fn list(&self) -> crate::connections::Result<Vec<ConnectionDescriptor>> {
            Err(EnumerationError::Status(503))
        }
    }

    fn scheduler(enumerator: Arc<dyn ConnectionEnumerator>, store: Arc<ObjectCacheStore>) -> Scheduler {
        Scheduler::builder()
            .registry(Arc::new(TargetRegistry::new()))
            .enumerator(enumerator)
            .fetcher(Arc::new(EchoFetcher))
            .store(store)
            .build()
    }

    #[test]
    fn test_default_settings() {
        let settings = SchedulerSettings::default();
        assert_eq!(settings.refresh_interval, Duration::from_secs(36000));
        assert_eq!(settings.max_workers, 10);
        assert_eq!(settings.connection_prefix, "mini:");
        assert!(!settings.warm_on_start);
    }

    #[tokio::test]
    async fn test_cycle_filters_by_prefix() {
        let store = Arc::new(ObjectCacheStore::in_memory());
        let enumerator = Arc::new(StaticConnections::new(vec![
            ConnectionDescriptor::new("mini:imageinfo:aws:ohio", "AWS"),
            ConnectionDescriptor::new("mini:specinfo:aws:ohio", "AWS"),
            ConnectionDescriptor::new("aws-ohio-config", "AWS"),
        ]));
        let scheduler = scheduler(enumerator, store.clone());

        let report = scheduler.run_cycle(TriggerSource::Manual).await;

        assert_eq!(report.populated, 2);
        assert_eq!(report.workers, 2);
        assert_eq!(report.refreshed, 2);
        assert!(!report.enumeration_failed);
        assert_eq!(scheduler.registry().count(), 0);
        assert!(store.get("mini:imageinfo:aws:ohio").await.unwrap().is_some());
        assert!(store.get("aws-ohio-config").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_enumeration_failure_uses_pending_targets() {
        let store = Arc::new(ObjectCacheStore::in_memory());
        let scheduler = scheduler(Arc::new(FailingEnumerator), store.clone());
        scheduler
            .registry()
            .add("manual#0", "manual", MetadataKind::Image);

        let report = scheduler.run_cycle(TriggerSource::Registration).await;

        assert!(report.enumeration_failed);
        assert_eq!(report.refreshed, 1);
        assert_eq!(scheduler.metrics().snapshot().enumeration_failures, 1);
        assert!(store.get("manual").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_cycle_spawns_no_workers() {
        let store = Arc::new(ObjectCacheStore::in_memory());
        let scheduler = scheduler(Arc::new(StaticConnections::default()), store);

        let report = scheduler.run_cycle(TriggerSource::Timer).await;

        assert_eq!(report.workers, 0);
        assert_eq!(report.refreshed, 0);
        assert_eq!(scheduler.metrics().snapshot().cycles_completed, 1);
    }

    #[tokio::test]
    async fn test_worker_count_capped() {
        let store = Arc::new(ObjectCacheStore::in_memory());
        let connections = (0..7)
            .map(|i| ConnectionDescriptor::new(format!("mini:imageinfo:aws:r{}", i), "AWS"))
            .collect();
        let scheduler = Scheduler::builder()
            .registry(Arc::new(TargetRegistry::new()))
            .enumerator(Arc::new(StaticConnections::new(connections)))
            .fetcher(Arc::new(EchoFetcher))
            .store(store)
            .settings(SchedulerSettings {
                max_workers: 3,
                ..SchedulerSettings::default()
            })
            .build();

        let report = scheduler.run_cycle(TriggerSource::Manual).await;

        assert_eq!(report.workers, 3);
        assert_eq!(report.refreshed, 7);
    }
}
