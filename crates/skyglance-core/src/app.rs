use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::{ApiKeys, Config};

/// Application context: validated configuration plus credentials.
///
/// Passed explicitly to whatever needs settings; nothing reads config from globals.
#[derive(Debug, Clone)]
pub struct App {
    config: Arc<Config>,
    keys: ApiKeys,
}

impl App {
    /// Load and validate the config file, then read API keys from the environment
    pub fn new() -> Result<Self> {
        let (config, _) = Config::load_validated()?;
        Ok(Self::with_config(config, ApiKeys::from_env()))
    }

    /// Same as [`App::new`] with an explicit config file path
    pub fn from_path(config_path: &Path) -> Result<Self> {
        let (config, _) = Config::load_validated_from(config_path)?;
        Ok(Self::with_config(config, ApiKeys::from_env()))
    }

    /// Build a context from already-loaded parts
    pub fn with_config(config: Config, keys: ApiKeys) -> Self {
        tracing::debug!(
            "Application context ready (provider: {:?}, unit: {:?}, keys: {:?})",
            config.weather.provider,
            config.weather.temperature_unit,
            keys
        );
        Self {
            config: Arc::new(config),
            keys,
        }
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the config
    pub fn shared_config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn keys(&self) -> &ApiKeys {
        &self.keys
    }
}
