use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct StorageSettings {
    pub config_path: PathBuf,
}

#[derive(Deserialize, Debug)]
pub struct SchedulerSettings {
    pub cancel_timeout_ms: u64,
    /// How often `run` re-reads the stored config to pick up edits.
    pub reload_interval_secs: u64,
}

impl SchedulerSettings {
    pub fn cancel_timeout(&self) -> Duration {
        Duration::from_millis(self.cancel_timeout_ms)
    }

    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_secs.max(1))
    }
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub storage: StorageSettings,
    pub scheduler: SchedulerSettings,
}

impl AppSettings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("storage.config_path", "alarm-config.json")?
            .set_default("scheduler.cancel_timeout_ms", 5000)?
            .set_default("scheduler.reload_interval_secs", 30)?
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
