use std::{marker::PhantomData, sync::Arc, time::Duration};

use chrono::NaiveDateTime;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::alarm::AlarmConfig;

use super::{
    calculation::{AlarmPlan, plan_alarm},
    clock::Clock,
    common::{AlarmManagerMessage, AlarmManagerSender, WakeUpContext},
    scheduler::{AlarmScheduler, Generation, ScheduledTask},
    worker::{WakeUpWorker, WorkerFactory},
};

/// Owns the single pending wake-up. Every config change cancels it and
/// schedules a fresh one, so two firings never overlap.
pub struct AlarmManager<TFactory: WorkerFactory> {
    sender: AlarmManagerSender,
    manager_task_handle: JoinHandle<()>,
    _marker: PhantomData<TFactory>,
}

struct ManagerState {
    config: Option<AlarmConfig>,
    task: Option<ScheduledTask>,
    /// Alarm instant of the most recent wake-up that actually ran.
    last_fired: Option<NaiveDateTime>,
    next_generation: Generation,
}

impl ManagerState {
    fn record_fired(&mut self, alarm_at: NaiveDateTime) {
        self.last_fired = Some(self.last_fired.map_or(alarm_at, |last| last.max(alarm_at)));
    }
}

impl<TFactory> AlarmManager<TFactory>
where
    TFactory: WorkerFactory + Send + 'static,
    TFactory::Worker: WakeUpWorker + Send + Sync + 'static,
{
    pub fn create(
        worker_factory: TFactory,
        clock: Arc<dyn Clock>,
        cancel_timeout: Duration,
    ) -> Self {
        let (channel_sender, receiver) = mpsc::channel(64);
        let sender = AlarmManagerSender::new(channel_sender);
        let tasks_sender = sender.clone();
        let manager_task_handle = tokio::spawn(async move {
            Self::handle_messages(worker_factory, clock, cancel_timeout, receiver, tasks_sender)
                .await;
        });

        Self {
            sender,
            manager_task_handle,
            _marker: PhantomData,
        }
    }

    pub async fn reschedule(&self, config: AlarmConfig) -> anyhow::Result<()> {
        self.sender.send_reschedule(config).await
    }

    pub async fn cancel(&self) -> anyhow::Result<()> {
        self.sender.send_cancel().await
    }

    /// The wake-up currently waiting to fire, if any.
    pub async fn next_plan(&self) -> anyhow::Result<Option<AlarmPlan>> {
        self.sender.query().await
    }

    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.sender.send_shutdown().await?;
        self.manager_task_handle.await?;
        Ok(())
    }

    async fn handle_messages(
        worker_factory: TFactory,
        clock: Arc<dyn Clock>,
        cancel_timeout: Duration,
        mut receiver: mpsc::Receiver<AlarmManagerMessage>,
        sender: AlarmManagerSender,
    ) {
        let mut state = ManagerState {
            config: None,
            task: None,
            last_fired: None,
            next_generation: 0,
        };

        while let Some(msg) = receiver.recv().await {
            log::debug!("Alarm manager got message {:?}", msg);
            match msg {
                AlarmManagerMessage::Reschedule(config) => {
                    Self::cancel_pending(&mut state, cancel_timeout).await;
                    state.config = Some(config);
                    Self::schedule_next(&mut state, &worker_factory, clock.now(), sender.clone());
                }
                AlarmManagerMessage::Cancel => {
                    Self::cancel_pending(&mut state, cancel_timeout).await;
                    state.config = None;
                }
                AlarmManagerMessage::Fired(generation, plan) => {
                    state.record_fired(plan.alarm_at);
                    if !Self::is_current(&state, generation) {
                        log::debug!(
                            "Ignoring stale wake-up notification. [alarm_at = {}]",
                            plan.alarm_at
                        );
                        continue;
                    }
                    log::info!("Wake-up finished. [alarm_at = {}]", plan.alarm_at);
                    state.task = None;
                    Self::schedule_next(&mut state, &worker_factory, clock.now(), sender.clone());
                }
                AlarmManagerMessage::FireError(error, generation, plan) => {
                    state.record_fired(plan.alarm_at);
                    if !Self::is_current(&state, generation) {
                        continue;
                    }
                    log::error!(
                        "Error executing wake-up. error = {}, alarm_at = {}",
                        error,
                        plan.alarm_at
                    );
                    state.task = None;
                    Self::schedule_next(&mut state, &worker_factory, clock.now(), sender.clone());
                }
                AlarmManagerMessage::Query(reply) => {
                    let _ = reply.send(state.task.as_ref().map(|task| *task.plan()));
                }
                AlarmManagerMessage::Shutdown => {
                    Self::cancel_pending(&mut state, cancel_timeout).await;
                    log::info!("Alarm manager shutting down");
                    break;
                }
            }
        }
    }

    fn is_current(state: &ManagerState, generation: Generation) -> bool {
        state
            .task
            .as_ref()
            .is_some_and(|task| task.generation() == generation)
    }

    async fn cancel_pending(state: &mut ManagerState, cancel_timeout: Duration) {
        if let Some(task) = state.task.take() {
            let alarm_at = task.plan().alarm_at;
            if task.cancel(cancel_timeout).await {
                state.record_fired(alarm_at);
            }
        }
    }

    /// Plans from `now`, but never earlier than an alarm whose wake-up already ran,
    /// so re-sending a config after its ramp started does not repeat the ramp.
    fn schedule_next(
        state: &mut ManagerState,
        worker_factory: &TFactory,
        now: NaiveDateTime,
        sender: AlarmManagerSender,
    ) {
        let reference = state.last_fired.map_or(now, |last| now.max(last));
        let Some(plan) = state
            .config
            .as_ref()
            .and_then(|config| plan_alarm(config, reference))
        else {
            log::info!("Alarm is disabled, nothing scheduled");
            return;
        };

        log::info!(
            "Next alarm at {}, sunrise starts at {}",
            plan.alarm_at,
            plan.sunrise_start
        );

        let generation = state.next_generation;
        state.next_generation += 1;

        let context = WakeUpContext {
            sender,
            plan,
            generation,
        };
        let worker = worker_factory.create_worker();
        state.task = Some(AlarmScheduler::schedule(context, worker, now));
    }
}
