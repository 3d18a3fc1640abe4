//! A builder pattern implementation for constructing a [`Node`] instance on a
//! data node.
//!
//! The [`NodeBuilder`] provides a fluent interface to configure and assemble
//! the components of the engine node: the registry, the traversal-algorithm
//! factory, the background idle sweeper and the metrics endpoint.
//!
//! ## Key Design Points
//! - **Required collaborator**: the [`EngineFactory`] has no default; plans
//!   can only be turned into engines by the algorithm collaborator.
//! - **Lifecycle Management**:
//!   - `build()`: assembles the [`Node`] and spawns the idle sweeper.
//!   - `start_metrics_server()`: launches the Prometheus endpoint.
//!   - `ready()`: finalizes construction and returns the initialized [`Node`].
//!
//! ## Example
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(());
//! let node = NodeBuilder::new(None, shutdown_rx)
//!     .factory(my_factory)
//!     .build()
//!     .start_metrics_server(shutdown_tx.subscribe())
//!     .ready()
//!     .unwrap();
//! ```
//!
//! ## Notes
//! - **Resource Cleanup**: Uses `watch::Receiver` for cooperative shutdown
//!   signaling; `Node::shutdown()` joins the sweeper after the signal fired.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::metrics;
use crate::EngineFactory;
use crate::EngineRegistry;
use crate::Error;
use crate::IdleSweeper;
use crate::Node;
use crate::Result;
use crate::Settings;

pub struct NodeBuilder {
    node_id: u32,
    pub(super) settings: Settings,
    pub(super) factory: Option<Arc<dyn EngineFactory>>,
    pub(super) shutdown_signal: watch::Receiver<()>,

    pub(super) node: Option<Arc<Node>>,
}

impl NodeBuilder {
    /// Creates a new NodeBuilder with settings loaded from the environment
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a node-specific configuration file
    /// * `shutdown_signal` - Watch channel for graceful shutdown signaling
    ///
    /// # Panics
    /// Will panic if configuration loading fails (consider returning Result
    /// instead)
    pub fn new(
        config_path: Option<&str>,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        let mut settings = Settings::new().expect("Load settings successfully");
        if let Some(p) = config_path {
            info!("with_override_config from: {}", &p);
            settings = settings
                .with_override_config(p)
                .expect("Overwrite settings successfully.");
        }
        Self::init(settings, shutdown_signal)
    }

    /// Core initialization logic shared by all construction paths
    pub fn init(
        settings: Settings,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        Self {
            node_id: settings.cluster.node_id,
            settings,
            factory: None,
            shutdown_signal,
            node: None,
        }
    }

    /// Sets the traversal-algorithm collaborator used to build engines from
    /// coordinator plans. Required before `build()`.
    pub fn factory(
        mut self,
        factory: Arc<dyn EngineFactory>,
    ) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Replaces the entire node configuration
    pub fn settings(
        mut self,
        settings: Settings,
    ) -> Self {
        self.node_id = settings.cluster.node_id;
        self.settings = settings;
        self
    }

    /// Finalizes the builder and constructs the node instance.
    ///
    /// Validates the settings, constructs the registry around the supplied
    /// factory and spawns the background idle sweeper.
    pub fn build(mut self) -> Self {
        let settings = match self.settings.clone().validate() {
            Ok(settings) => settings,
            Err(e) => {
                error!("settings validation failed: {:?}", e);
                return self;
            }
        };

        let Some(factory) = self.factory.take() else {
            error!("an EngineFactory must be provided before build()");
            return self;
        };

        let registry = Arc::new(EngineRegistry::new(factory, &settings.registry));

        let sweeper = IdleSweeper::new(
            registry.clone(),
            &settings.registry,
            self.shutdown_signal.clone(),
        );
        let sweeper_handle = tokio::spawn(async move { sweeper.run().await });

        let node = Node {
            node_id: self.node_id,
            registry,
            settings: Arc::new(settings),
            sweeper_handle: Mutex::new(Some(sweeper_handle)),
        };

        self.node = Some(Arc::new(node));
        self
    }

    /// Starts the metrics server for monitoring node operations.
    ///
    /// Launches a Prometheus endpoint on the configured port.
    pub fn start_metrics_server(
        self,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        if !self.settings.monitoring.prometheus_enabled {
            debug!("metrics server disabled by configuration");
            return self;
        }

        let port = self.settings.monitoring.prometheus_port;
        tokio::spawn(async move {
            metrics::start_server(port, shutdown_signal).await;
        });
        self
    }

    /// Returns the built node instance after successful construction.
    ///
    /// # Errors
    /// Returns `Error::NodeStartFailed` if build hasn't completed
    pub fn ready(self) -> Result<Arc<Node>> {
        self.node
            .ok_or_else(|| Error::NodeStartFailed("check node ready failed".to_string()))
    }
}
