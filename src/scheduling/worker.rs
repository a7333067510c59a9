use async_trait::async_trait;

use super::common::WakeUpContext;

/// The action run when a sunrise ramp starts.
#[async_trait]
pub trait WakeUpWorker {
    async fn handle_wake_up(&self, context: &WakeUpContext) -> anyhow::Result<()>;
}

pub trait WorkerFactory {
    type Worker: WakeUpWorker;

    fn create_worker(&self) -> Self::Worker;
}

pub struct LoggingWakeUpWorker;

#[async_trait]
impl WakeUpWorker for LoggingWakeUpWorker {
    async fn handle_wake_up(&self, context: &WakeUpContext) -> anyhow::Result<()> {
        let plan = &context.plan;
        log::info!(
            "Sunrise starting. Ramping for {} minutes until alarm at {}",
            plan.duration_minutes,
            plan.alarm_at
        );
        Ok(())
    }
}

pub struct LoggingWorkerFactory;

impl WorkerFactory for LoggingWorkerFactory {
    type Worker = LoggingWakeUpWorker;

    fn create_worker(&self) -> Self::Worker {
        LoggingWakeUpWorker
    }
}
