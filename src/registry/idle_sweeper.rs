//! Background reclamation of abandoned engines.
//!
//! A coordinator that crashes or loses its connection never calls destroy;
//! the sweeper bounds the resulting memory growth by destroying entries idle
//! past the configured timeout. An engine mid-execution is never reclaimed:
//! liveness of the in-flight call takes precedence over its age.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::debug;
use tracing::warn;

use crate::EngineRegistry;
use crate::RegistryConfig;
use crate::Result;

pub struct IdleSweeper {
    registry: Arc<EngineRegistry>,
    sweep_interval: Duration,
    idle_timeout: Duration,
    shutdown_signal: watch::Receiver<()>,
}

impl IdleSweeper {
    pub fn new(
        registry: Arc<EngineRegistry>,
        config: &RegistryConfig,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        Self {
            registry,
            sweep_interval: config.sweep_interval(),
            idle_timeout: config.idle_timeout(),
            shutdown_signal,
        }
    }

    /// Runs sweep passes at the configured interval until the shutdown
    /// signal fires.
    pub async fn run(mut self) -> Result<()> {
        let mut tick = interval(self.sweep_interval);
        loop {
            tokio::select! {
                // Use biased to ensure branch order
                biased;
                // P0: shutdown received;
                _ = self.shutdown_signal.changed() => {
                    warn!("idle sweeper: shutdown signal received.");
                    return Ok(());
                }
                // P1: Tick: reclaim abandoned engines
                _ = tick.tick() => {
                    let reclaimed = self.registry.sweep_expired(self.idle_timeout);
                    if reclaimed > 0 {
                        debug!(reclaimed, "idle sweep pass finished");
                    }
                }
            }
        }
    }
}
