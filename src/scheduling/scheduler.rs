use chrono::NaiveDateTime;
use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use super::{
    calculation::{AlarmPlan, delay_until},
    common::WakeUpContext,
    worker::WakeUpWorker,
};

/// Distinguishes successive wake-up tasks so late notifications can be matched.
pub type Generation = u64;

pub struct ScheduledTask {
    /// Resolves to `true` once the worker has run.
    task_handle: JoinHandle<bool>,
    cancellation_token: CancellationToken,
    plan: AlarmPlan,
    generation: Generation,
}

impl ScheduledTask {
    pub fn new(
        task_handle: JoinHandle<bool>,
        cancellation_token: CancellationToken,
        plan: AlarmPlan,
        generation: Generation,
    ) -> Self {
        Self {
            task_handle,
            cancellation_token,
            plan,
            generation,
        }
    }

    pub fn plan(&self) -> &AlarmPlan {
        &self.plan
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Stops the task and reports whether its wake-up had already run.
    /// A task still busy after `timeout` is counted as having run.
    pub async fn cancel(self, timeout: std::time::Duration) -> bool {
        self.cancellation_token.cancel();
        let cancel_with_timeout = time::timeout(timeout, self.task_handle);
        match cancel_with_timeout.await {
            Ok(Ok(fired)) => fired,
            Ok(Err(error)) => {
                log::warn!(
                    "Wake-up task ended abnormally. error = {}, alarm_at = {}",
                    error,
                    self.plan.alarm_at
                );
                false
            }
            Err(_) => {
                log::warn!(
                    "Wake-up task did not stop within {:?}. [alarm_at = {}]",
                    timeout,
                    self.plan.alarm_at
                );
                true
            }
        }
    }
}

pub struct AlarmScheduler;

impl AlarmScheduler {
    /// Spawns a task that waits until the plan's sunrise start and then runs `worker`.
    /// A sunrise start at or before `now` fires right away.
    pub fn schedule(
        context: WakeUpContext,
        worker: impl WakeUpWorker + Send + Sync + 'static,
        now: NaiveDateTime,
    ) -> ScheduledTask {
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();

        let plan = context.plan;
        let generation = context.generation;
        let delay = delay_until(plan.sunrise_start, now);

        log::info!(
            "[SCHEDULE] Sleeping for {:?} until sunrise start {}. Alarm at {}",
            delay,
            plan.sunrise_start,
            plan.alarm_at
        );

        let task_handle = tokio::spawn(async move {
            let result =
                Self::wake_up_after_delay(task_cancellation_token, &context, delay, worker).await;
            let notified = match result {
                Ok(false) => return false,
                Ok(true) => {
                    context
                        .sender
                        .notify_fired(context.generation, context.plan)
                        .await
                }
                Err(error) => {
                    context
                        .sender
                        .notify_error(error, context.generation, context.plan)
                        .await
                }
            };
            if let Err(error) = notified {
                log::warn!("Could not notify alarm manager. error = {error}");
            }
            true
        });

        ScheduledTask::new(task_handle, cancellation_token, plan, generation)
    }

    /// `Ok(false)` when cancelled before the delay ran out.
    async fn wake_up_after_delay<TWorker: WakeUpWorker + Send + Sync>(
        cancellation_token: CancellationToken,
        ctx: &WakeUpContext,
        delay: std::time::Duration,
        worker: TWorker,
    ) -> anyhow::Result<bool> {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                log::info!("Wake-up task was cancelled. [alarm_at = {}]", ctx.plan.alarm_at);
                Ok(false)
            },
            _ = tokio::time::sleep(delay) => {
                worker.handle_wake_up(ctx).await?;
                Ok(true)
            }
        }
    }
}
