//! Shared stub collaborators for integration tests.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tengine::EngineError;
use tengine::EngineFactory;
use tengine::EngineKind;
use tengine::GraphEngine;

/// Engine that records call overlap, to prove at most one step runs on one
/// engine at any instant.
pub struct OverlapProbeEngine {
    in_flight: Arc<AtomicUsize>,
    max_overlap: Arc<AtomicUsize>,
    steps: Arc<AtomicUsize>,
}

#[async_trait]
impl GraphEngine for OverlapProbeEngine {
    async fn step(
        &mut self,
        request: Vec<u8>,
    ) -> Result<Vec<u8>, EngineError> {
        let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_overlap.fetch_max(concurrent, Ordering::SeqCst);

        // Long enough for contending calls to pile up
        tokio::time::sleep(Duration::from_millis(25)).await;

        self.steps.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(request)
    }
}

/// Factory whose engines all report into one shared set of probes.
///
/// Rejects empty plans the way a real factory rejects undecodable ones.
#[derive(Clone, Default)]
pub struct OverlapProbeFactory {
    pub in_flight: Arc<AtomicUsize>,
    pub max_overlap: Arc<AtomicUsize>,
    pub steps: Arc<AtomicUsize>,
}

#[async_trait]
impl EngineFactory for OverlapProbeFactory {
    async fn build(
        &self,
        _kind: EngineKind,
        plan: Vec<u8>,
    ) -> Result<Box<dyn GraphEngine>, EngineError> {
        if plan.is_empty() {
            return Err(EngineError::MalformedPlan("empty plan".to_string()));
        }
        Ok(Box::new(OverlapProbeEngine {
            in_flight: self.in_flight.clone(),
            max_overlap: self.max_overlap.clone(),
            steps: self.steps.clone(),
        }))
    }
}
