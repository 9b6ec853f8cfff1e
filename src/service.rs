//! Process wiring for the `serve` and `refresh-once` commands

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api::{self, AppState};
use crate::cache::{CacheStore, FjallCacheStore, ObjectCacheStore, StoreError};
use crate::config::{CacheBackend, CacheConfig, Config, ConnectionSource};
use crate::connections::{ConnectionEnumerator, StaticConnections, UpstreamConnections};
use crate::fetcher::HttpFetcher;
use crate::observability::Metrics;
use crate::registry::TargetRegistry;
use crate::scheduler::{CycleReport, Scheduler, SchedulerSettings, TriggerSource};
use crate::upstream::UpstreamClient;

pub type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// How long a running cycle may take to finish once shutdown starts
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Open the configured cache backend
pub fn open_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>, StoreError> {
    let store: Arc<dyn CacheStore> = match config.backend {
        CacheBackend::Fjall => {
            info!(path = %config.path.display(), "Opening Fjall cache");
            Arc::new(FjallCacheStore::open(&config.path)?)
        }
        CacheBackend::Memory => {
            warn!("Using in-memory cache, snapshots are lost on exit");
            Arc::new(ObjectCacheStore::in_memory())
        }
        CacheBackend::Local => {
            info!(path = %config.path.display(), "Opening local filesystem cache");
            Arc::new(ObjectCacheStore::local(&config.path)?)
        }
    };

    Ok(store)
}

/// Assemble a scheduler from configuration
pub fn build_scheduler(
    config: &Config,
    store: Arc<dyn CacheStore>,
    metrics: Arc<Metrics>,
) -> Result<Scheduler, AnyError> {
    let client = UpstreamClient::new(&config.upstream)?;

    let enumerator: Arc<dyn ConnectionEnumerator> = match config.connections.source {
        ConnectionSource::Static => {
            info!(
                count = config.connections.entries.len(),
                "Using static connection list"
            );
            Arc::new(StaticConnections::new(config.connections.entries.clone()))
        }
        ConnectionSource::Upstream => {
            info!(base_url = %client.base_url(), "Enumerating connections from upstream");
            Arc::new(UpstreamConnections::new(client.clone()))
        }
    };

    let explicit_kinds = config
        .connections
        .entries
        .iter()
        .filter_map(|entry| entry.kind.map(|kind| (entry.name.clone(), kind)));
    let fetcher = HttpFetcher::new(client).with_kinds(explicit_kinds);

    Ok(Scheduler::builder()
        .registry(Arc::new(TargetRegistry::new()))
        .enumerator(enumerator)
        .fetcher(Arc::new(fetcher))
        .store(store)
        .settings(SchedulerSettings::from(&config.scheduler))
        .metrics(metrics)
        .build())
}

/// Run the scheduler and admin API until Ctrl+C or SIGTERM
pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    let store = open_store(&config.cache).map_err(|e| format!("Failed to open cache: {}", e))?;
    let metrics = Arc::new(Metrics::new());
    let scheduler = build_scheduler(&config, store.clone(), metrics.clone())?;

    let listener = TcpListener::bind(address).await?;

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    serve_until_shutdown(listener, scheduler, store, metrics, shutdown, SHUTDOWN_GRACE).await?;
    info!("Shutdown complete");
    Ok(())
}

/// Run the scheduler and admin API until `shutdown` is cancelled
///
/// Once shutdown starts, the admin API and the scheduler share one `grace`
/// deadline. Whatever is still running after it (a registration waiting on a
/// hung cycle, the cycle itself) is aborted. The cache is flushed last.
pub async fn serve_until_shutdown(
    listener: TcpListener,
    scheduler: Scheduler,
    store: Arc<dyn CacheStore>,
    metrics: Arc<Metrics>,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<(), AnyError> {
    let mut running = scheduler.start(shutdown.clone());
    let state = AppState::new(running.handle(), metrics);
    let mut server = tokio::spawn(api::serve(listener, state, shutdown.clone()));

    let finished = tokio::select! {
        joined = &mut server => Some(joined),
        _ = shutdown.cancelled() => None,
    };
    shutdown.cancel();
    let deadline = Instant::now() + grace;

    let served = match finished {
        Some(joined) => joined,
        None => match tokio::time::timeout_at(deadline, &mut server).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(
                    grace_secs = grace.as_secs(),
                    "Admin API still has requests in flight, aborting"
                );
                server.abort();
                Ok(Ok(()))
            }
        },
    };

    info!("Waiting for scheduler to stop");
    if tokio::time::timeout_at(deadline, running.join()).await.is_err() {
        warn!(grace_secs = grace.as_secs(), "Refresh cycle still running, aborting");
        running.abort();
    }

    if let Err(e) = store.flush().await {
        error!(error = %e, "Failed to flush cache");
    }

    served??;
    Ok(())
}

/// Run a single refresh cycle and return its report
pub async fn refresh_once(config: Config) -> Result<CycleReport, AnyError> {
    let store = open_store(&config.cache).map_err(|e| format!("Failed to open cache: {}", e))?;
    let scheduler = build_scheduler(&config, store.clone(), Arc::new(Metrics::new()))?;

    let report = scheduler.run_cycle(TriggerSource::Manual).await;
    store.flush().await?;

    Ok(report)
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => return,
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
