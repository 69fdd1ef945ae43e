// src/utils/config.rs
//! Application configuration
//!
//! Layered with the `config` crate, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. `dispatch.{yaml,toml,json}` in the working directory, or the file
//!    named by `TICK_DISPATCH_CONFIG` (both optional)
//! 3. Environment variables, e.g. `TICK_DISPATCH__QUEUE__MAX_SIZE=512`

use crate::dispatch::config::QueueConfig;
use crate::observability::ObservabilityConfig;
use crate::runtime::tick_loop::HostConfig;
use crate::utils::errors::Result;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Env var naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "TICK_DISPATCH_CONFIG";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "TICK_DISPATCH";

const DEFAULT_CONFIG_NAME: &str = "dispatch";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub queue: QueueConfig,

    pub host: HostConfig,

    pub observability: ObservabilityConfig,
}

impl DispatchConfig {
    /// Load from the default file location and the environment
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from(path),
            Err(_) => Self::build(
                File::with_name(DEFAULT_CONFIG_NAME).required(false),
                Self::environment(),
            ),
        }
    }

    /// Load from an explicit file plus the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(File::from(path.as_ref()), Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }

    fn build<F>(file: F, env: Environment) -> Result<Self>
    where
        F: ::config::Source + Send + Sync + 'static,
    {
        let config: DispatchConfig = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        debug!(queue = %config.queue.name, "Configuration loaded");
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.queue.validate()?;
        self.host.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}
