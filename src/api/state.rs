use std::sync::Arc;

use crate::observability::Metrics;
use crate::scheduler::SchedulerHandle;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: SchedulerHandle,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(scheduler: SchedulerHandle, metrics: Arc<Metrics>) -> Self {
        Self { scheduler, metrics }
    }
}
