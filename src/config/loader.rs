//! Configuration loader using figment.
//!
//! Sources, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. Programmatic overrides ([`ConfigLoader::merge`])
//! 3. TOML configuration file
//! 4. Environment variables (`FERROGRAM_*`, `__` as separator, e.g.
//!    `FERROGRAM_BOTS__COMMON__TOKEN` → `bots.common.token`)

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::{debug, warn};

use super::schema::ManagerConfig;
use crate::error::{Error, Result};

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "FERROGRAM_";

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    config_file: Option<PathBuf>,
    load_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            config_file: None,
            load_env: true,
        }
    }

    /// Sets a TOML configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disables the environment variable overlay.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration programmatically.
    pub fn merge(mut self, config: ManagerConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> Result<ManagerConfig> {
        let mut figment = Figment::from(Serialized::defaults(ManagerConfig::default()))
            .merge(self.figment);

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            debug!(path = %path.display(), "loading configuration file");
            figment = figment.merge(Toml::file(path));
        }

        if self.load_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        let config: ManagerConfig = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        if config.default_bot.is_none() && !config.bots.is_empty() {
            warn!("no default bot configured; calls without an explicit bot name will fail");
        }

        Ok(config)
    }
}

// =============================================================================
// Tests
// =============================================================================
