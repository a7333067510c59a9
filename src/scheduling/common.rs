use tokio::sync::{mpsc, oneshot};

use crate::alarm::AlarmConfig;

use super::{calculation::AlarmPlan, scheduler::Generation};

#[derive(Debug)]
pub enum AlarmManagerMessage {
    Reschedule(AlarmConfig),
    Cancel,
    Fired(Generation, AlarmPlan),
    FireError(anyhow::Error, Generation, AlarmPlan),
    Query(oneshot::Sender<Option<AlarmPlan>>),
    Shutdown,
}

#[derive(Clone)]
pub struct AlarmManagerSender(mpsc::Sender<AlarmManagerMessage>);

impl AlarmManagerSender {
    pub fn new(inner: mpsc::Sender<AlarmManagerMessage>) -> Self {
        AlarmManagerSender(inner)
    }

    pub async fn send_reschedule(&self, config: AlarmConfig) -> anyhow::Result<()> {
        self.0
            .send(AlarmManagerMessage::Reschedule(config))
            .await?;
        Ok(())
    }

    pub async fn send_cancel(&self) -> anyhow::Result<()> {
        self.0.send(AlarmManagerMessage::Cancel).await?;

        Ok(())
    }

    pub async fn send_shutdown(&self) -> anyhow::Result<()> {
        self.0.send(AlarmManagerMessage::Shutdown).await?;

        Ok(())
    }

    pub async fn query(&self) -> anyhow::Result<Option<AlarmPlan>> {
        let (tx, rx) = oneshot::channel();
        self.0.send(AlarmManagerMessage::Query(tx)).await?;

        Ok(rx.await?)
    }

    pub async fn notify_fired(
        &self,
        generation: Generation,
        plan: AlarmPlan,
    ) -> anyhow::Result<()> {
        self.0
            .send(AlarmManagerMessage::Fired(generation, plan))
            .await?;

        Ok(())
    }

    pub async fn notify_error(
        &self,
        error: anyhow::Error,
        generation: Generation,
        plan: AlarmPlan,
    ) -> anyhow::Result<()> {
        self.0
            .send(AlarmManagerMessage::FireError(error, generation, plan))
            .await?;

        Ok(())
    }
}

pub struct WakeUpContext {
    pub sender: AlarmManagerSender,
    pub plan: AlarmPlan,
    pub generation: Generation,
}
