//! The long-lived owner of the per-node engine registry.
//!
//! ## Key Responsibilities
//! - Owns the [`EngineRegistry`] shared with the transport handler
//! - Keeps the background idle sweeper alive and joins it on shutdown
//! - Drains remaining engines during teardown
//!
//! The node is constructed once at process startup through [`NodeBuilder`]
//! and torn down once at shutdown; the registry is never modeled as an
//! implicit global.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::info;
use tracing::warn;

use crate::EngineRegistry;
use crate::Result;
use crate::Settings;

pub struct Node {
    pub(crate) node_id: u32,
    pub(crate) registry: Arc<EngineRegistry>,
    pub settings: Arc<Settings>,

    pub(crate) sweeper_handle: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl Node {
    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    /// The registry handle the transport layer dispatches create, execute
    /// and destroy calls against.
    pub fn registry(&self) -> Arc<EngineRegistry> {
        self.registry.clone()
    }

    /// Tears the node down: drains remaining engines and joins the sweeper
    /// task.
    ///
    /// The sweeper only exits once the `watch` shutdown sender has fired, so
    /// this must be called after the application signaled shutdown.
    pub async fn shutdown(&self) -> Result<()> {
        let dropped = self.registry.drain();
        if dropped > 0 {
            info!(dropped, "drained engines during shutdown");
        }

        let handle = self.sweeper_handle.lock().take();
        if let Some(handle) = handle {
            handle.await??;
        }

        warn!("[Node:{}] shutdown complete.", self.node_id);
        Ok(())
    }
}
