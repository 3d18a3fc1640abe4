use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Engine registry capacity and reclamation parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegistryConfig {
    /// Maximum number of concurrently registered engines on this node
    /// Creates past this limit fail with ResourceExhausted
    #[serde(default = "default_max_engines")]
    pub max_engines: usize,

    /// Entries idle longer than this are destroyed by the background sweep
    #[serde(default = "default_engine_idle_timeout")]
    pub engine_idle_timeout_in_sec: u64,

    /// Period of the background sweep pass
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_in_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_engines: default_max_engines(),
            engine_idle_timeout_in_sec: default_engine_idle_timeout(),
            sweep_interval_in_ms: default_sweep_interval(),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_engines == 0 {
            return Err(Error::Config(ConfigError::Message(
                "max_engines must be greater than 0".into(),
            )));
        }

        if self.engine_idle_timeout_in_sec == 0 {
            return Err(Error::Config(ConfigError::Message(
                "engine_idle_timeout_in_sec must be greater than 0".into(),
            )));
        }

        if self.sweep_interval_in_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "sweep_interval_in_ms cannot be 0".into(),
            )));
        }

        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_idle_timeout_in_sec)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_in_ms)
    }
}

fn default_max_engines() -> usize {
    1024
}
// on the order of minutes
fn default_engine_idle_timeout() -> u64 {
    600
}
fn default_sweep_interval() -> u64 {
    2000
}
