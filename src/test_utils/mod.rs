//! Shared stubs for unit tests.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::EngineError;
use crate::EngineFactory;
use crate::EngineKind;
use crate::GraphEngine;
use crate::RegistryConfig;
use crate::Settings;

/// Engine that echoes every request back and counts its steps.
pub struct EchoEngine {
    pub steps: Arc<AtomicUsize>,
}

#[async_trait]
impl GraphEngine for EchoEngine {
    async fn step(
        &mut self,
        request: Vec<u8>,
    ) -> Result<Vec<u8>, EngineError> {
        self.steps.fetch_add(1, Ordering::SeqCst);
        Ok(request)
    }
}

/// Factory producing [`EchoEngine`]s; rejects empty plans the way a real
/// factory rejects undecodable ones.
pub struct EchoFactory;

#[async_trait]
impl EngineFactory for EchoFactory {
    async fn build(
        &self,
        _kind: EngineKind,
        plan: Vec<u8>,
    ) -> Result<Box<dyn GraphEngine>, EngineError> {
        if plan.is_empty() {
            return Err(EngineError::MalformedPlan("empty plan".to_string()));
        }
        Ok(Box::new(EchoEngine {
            steps: Arc::new(AtomicUsize::new(0)),
        }))
    }
}

/// Engine whose step parks until released, for exclusive-flag tests.
///
/// `entered` fires when a step starts; the step finishes once `release` is
/// notified.
pub struct GateEngine {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[async_trait]
impl GraphEngine for GateEngine {
    async fn step(
        &mut self,
        _request: Vec<u8>,
    ) -> Result<Vec<u8>, EngineError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(b"done".to_vec())
    }
}

/// Factory producing [`GateEngine`]s that share one pair of notifies.
#[derive(Clone)]
pub struct GateFactory {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl GateFactory {
    pub fn new() -> Self {
        Self {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl EngineFactory for GateFactory {
    async fn build(
        &self,
        _kind: EngineKind,
        _plan: Vec<u8>,
    ) -> Result<Box<dyn GraphEngine>, EngineError> {
        Ok(Box::new(GateEngine {
            entered: self.entered.clone(),
            release: self.release.clone(),
        }))
    }
}

/// Engine whose every step fails, for error-propagation tests.
pub struct FailingEngine;

#[async_trait]
impl GraphEngine for FailingEngine {
    async fn step(
        &mut self,
        _request: Vec<u8>,
    ) -> Result<Vec<u8>, EngineError> {
        Err(EngineError::StepFailed("cursor exhausted".to_string()))
    }
}

/// Factory producing [`FailingEngine`]s.
pub struct FailingFactory;

#[async_trait]
impl EngineFactory for FailingFactory {
    async fn build(
        &self,
        _kind: EngineKind,
        _plan: Vec<u8>,
    ) -> Result<Box<dyn GraphEngine>, EngineError> {
        Ok(Box::new(FailingEngine))
    }
}

/// Registry limits small enough to exercise capacity handling.
pub fn test_registry_config(max_engines: usize) -> RegistryConfig {
    RegistryConfig {
        max_engines,
        ..RegistryConfig::default()
    }
}

/// Settings with short reclamation windows for sweeper tests.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.registry.engine_idle_timeout_in_sec = 1;
    settings.registry.sweep_interval_in_ms = 20;
    settings
}
