//! Refresh worker: drains the registry one target at a time

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::fetcher::Fetcher;
use crate::observability::Metrics;
use crate::registry::TargetRegistry;

/// Shared handles a worker needs, cloned into every spawned worker
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub registry: Arc<TargetRegistry>,
    pub fetcher: Arc<dyn Fetcher>,
    pub store: Arc<dyn CacheStore>,
    pub metrics: Arc<Metrics>,
}

/// Outcome counts for one worker's run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub refreshed: usize,
    pub fetch_failures: usize,
    pub store_failures: usize,
}

/// Claim, fetch, store, retire until nothing is left to claim
///
/// A failed fetch or store drops that one target for this cycle and the loop
/// carries on. Every claimed target is retired exactly once.
pub(crate) async fn run(worker_id: usize, ctx: WorkerContext) -> WorkerStats {
    let mut stats = WorkerStats::default();

    while let Some(target) = ctx.registry.claim_next() {
        debug!(worker_id, target_name = %target.name, kind = %target.kind, "Refreshing target");

        let payload = match ctx.fetcher.fetch(&target.connection_id).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    worker_id,
                    connection_id = %target.connection_id,
                    error = %e,
                    "Fetch failed, target dropped for this cycle"
                );
                stats.fetch_failures += 1;
                ctx.metrics.fetch_failed();
                ctx.registry.retire(&target.name);
                continue;
            }
        };

        let size = payload.len();
        if let Err(e) = ctx.store.set(&target.connection_id, payload).await {
            warn!(
                worker_id,
                connection_id = %target.connection_id,
                error = %e,
                "Cache write failed, target dropped for this cycle"
            );
            stats.store_failures += 1;
            ctx.metrics.store_failed();
            ctx.registry.retire(&target.name);
            continue;
        }

        debug!(worker_id, connection_id = %target.connection_id, size, "Target refreshed");
        stats.refreshed += 1;
        ctx.metrics.target_refreshed();
        ctx.registry.retire(&target.name);
    }

    debug!(worker_id, ?stats, "Worker finished");
    stats
}
