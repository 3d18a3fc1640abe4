//! The engine boundary: the contract between the registry and the
//! traversal-algorithm collaborator.
//!
//! The registry never interprets plans, requests or responses; it only routes
//! them by kind and manages engine lifetime. Engines are built fully
//! initialized from a serialized plan by an [`EngineFactory`] supplied at node
//! startup, and are driven through repeated [`GraphEngine::step`] calls until
//! destroyed.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::EngineError;

/// Discriminator for the two engine variants a coordinator can push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Traversal,
    ShortestPath,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Traversal => "traversal",
            EngineKind::ShortestPath => "shortest_path",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One traversal or shortest-path computation bound to a dataset snapshot.
///
/// # Contract
/// Implementations MUST guarantee:
/// 1. `step` is safe to call repeatedly
/// 2. No reference to a request outlives the call that carried it
/// 3. All owned resources are released on drop, with no deferred cleanup
///    requiring further calls
///
/// Exclusive use is the registry's job, not the engine's: `step` is only ever
/// invoked by the single caller currently holding the entry's exclusive flag.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GraphEngine: Send + 'static {
    /// Advances the computation by one request/response cycle.
    ///
    /// Request and response payloads are opaque to the registry; their
    /// encoding is owned by the serialization collaborator.
    async fn step(
        &mut self,
        request: Vec<u8>,
    ) -> std::result::Result<Vec<u8>, EngineError>;
}

/// Builds engines from serialized execution plans pushed by coordinators.
///
/// Plan decoding and dataset binding happen here; a build failure means the
/// plan is permanently unusable on this node and nothing is registered.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EngineFactory: Send + Sync + 'static {
    async fn build(
        &self,
        kind: EngineKind,
        plan: Vec<u8>,
    ) -> std::result::Result<Box<dyn GraphEngine>, EngineError>;
}
