mod calculation;
mod clock;
mod common;
mod manager;
mod scheduler;
mod worker;

pub use calculation::{
    AlarmPlan, calculate_next_alarm, calculate_sunrise_start, delay_until, next_alarm_from_now,
    plan_alarm,
};
pub use clock::{Clock, LocalClock};
pub use common::WakeUpContext;
pub use manager::AlarmManager;
pub use worker::{LoggingWakeUpWorker, LoggingWorkerFactory, WakeUpWorker, WorkerFactory};
