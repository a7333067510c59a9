use std::{io::ErrorKind, path::PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    alarm::AlarmConfig,
    validation::{default_config, validate_and_fix_config},
};

/// Where the single alarm config lives. Whatever is stored is untrusted:
/// `load` always hands back a repaired config.
#[async_trait]
pub trait ConfigStorage: Send + Sync {
    async fn load(&self) -> anyhow::Result<AlarmConfig>;
    async fn save(&self, config: &AlarmConfig) -> anyhow::Result<()>;
}

pub struct InMemoryConfigStorage {
    store: RwLock<Option<Value>>,
}

impl InMemoryConfigStorage {
    pub fn new() -> Self {
        InMemoryConfigStorage {
            store: RwLock::new(None),
        }
    }

    /// Starts out holding `raw` exactly as given, valid or not.
    pub fn with_raw(raw: Value) -> Self {
        InMemoryConfigStorage {
            store: RwLock::new(Some(raw)),
        }
    }
}

impl Default for InMemoryConfigStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStorage for InMemoryConfigStorage {
    async fn load(&self) -> anyhow::Result<AlarmConfig> {
        let store = self.store.read().await;
        Ok(store
            .as_ref()
            .map(validate_and_fix_config)
            .unwrap_or_else(default_config))
    }

    async fn save(&self, config: &AlarmConfig) -> anyhow::Result<()> {
        let raw = serde_json::to_value(config)?;
        *self.store.write().await = Some(raw);
        Ok(())
    }
}

pub struct JsonFileConfigStorage {
    path: PathBuf,
}

impl JsonFileConfigStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigStorage for JsonFileConfigStorage {
    async fn load(&self) -> anyhow::Result<AlarmConfig> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                log::info!(
                    "No alarm config at {}, using defaults",
                    self.path.display()
                );
                return Ok(default_config());
            }
            Err(error) => {
                log::error!(
                    "Error reading alarm config, using defaults. path = {}, error = {}",
                    self.path.display(),
                    error
                );
                return Ok(default_config());
            }
        };

        let value = serde_json::from_str::<Value>(&raw).unwrap_or_else(|error| {
            log::error!(
                "Alarm config is not valid JSON, using defaults. path = {}, error = {}",
                self.path.display(),
                error
            );
            Value::Null
        });

        Ok(validate_and_fix_config(&value))
    }

    async fn save(&self, config: &AlarmConfig) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Could not create config dir {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Could not write alarm config to {}", self.path.display()))?;

        log::info!("Saved alarm config to {}", self.path.display());
        Ok(())
    }
}
