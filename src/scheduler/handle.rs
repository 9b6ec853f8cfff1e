use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use super::trigger::{Trigger, TriggerClosed, TriggerSource};
use crate::registry::{DEFAULT_SLOT, MetadataKind, TargetRegistry, target_name};

/// Entry points exposed to the rest of the process
#[derive(Clone)]
pub struct SchedulerHandle {
    registry: Arc<TargetRegistry>,
    trigger: Trigger,
}

impl SchedulerHandle {
    pub(crate) fn new(registry: Arc<TargetRegistry>, trigger: Trigger) -> Self {
        Self { registry, trigger }
    }

    /// Add a target for `connection_id` and wake the scheduler
    ///
    /// The target is added at once, bypassing the prefix filter. The call then
    /// blocks until the scheduler loop accepts the wake-up, which is up to one
    /// full cycle if a cycle is running. Returns the target name.
    ///
    /// When the scheduler has stopped the target is removed again and
    /// [`TriggerClosed`] is returned.
    pub async fn register_target(&self, connection_id: &str) -> Result<String, TriggerClosed> {
        let kind = MetadataKind::from_connection_name(connection_id).unwrap_or_default();
        let name = target_name(connection_id, DEFAULT_SLOT);

        self.registry.add(name.clone(), connection_id, kind);
        info!(connection_id, target_name = %name, "Target registered");

        if let Err(e) = self.trigger.fire(TriggerSource::Registration).await {
            // Nothing will ever drain it
            self.registry.retire(&name);
            return Err(e);
        }
        Ok(name)
    }

    pub fn pending_count(&self) -> usize {
        self.registry.count()
    }

    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }
}

/// Scheduler loop and timer spawned by [`super::Scheduler::start`]
pub struct RunningScheduler {
    handle: SchedulerHandle,
    scheduler_task: JoinHandle<()>,
    timer_task: JoinHandle<()>,
}

impl RunningScheduler {
    pub(crate) fn new(
        handle: SchedulerHandle,
        scheduler_task: JoinHandle<()>,
        timer_task: JoinHandle<()>,
    ) -> Self {
        Self {
            handle,
            scheduler_task,
            timer_task,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Wait for both loops to exit (after the shutdown token fires)
    pub async fn join(&mut self) {
        if let Err(e) = (&mut self.timer_task).await {
            error!(error = %e, "Refresh timer task failed");
        }
        if let Err(e) = (&mut self.scheduler_task).await {
            error!(error = %e, "Scheduler task failed");
        }
    }

    pub fn abort(&self) {
        self.timer_task.abort();
        self.scheduler_task.abort();
    }
}
