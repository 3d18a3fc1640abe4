//! Traversal Engine Registry Error Hierarchy
//!
//! Defines error types for the per-node engine registry, categorized by
//! registry protocol concerns and operational failures.

use config::ConfigError;
use tokio::task::JoinError;

use crate::EngineId;
use crate::EngineKind;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Engine registry protocol violations and failures
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Node configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Background task join failures
    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),

    /// Node lifecycle failures
    #[error("Node failed to start: {0}")]
    NodeStartFailed(String),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Failures of the registry operations exposed to the transport handler.
///
/// Retry semantics, for callers deciding what to do with a failed request:
/// - [`RegistryError::InvalidPlan`] is permanent; resubmitting the same plan
///   can never succeed.
/// - [`RegistryError::ResourceExhausted`] and [`RegistryError::EngineBusy`]
///   are transient; callers may retry after backoff.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The execution plan could not be decoded or is structurally
    /// inconsistent (e.g. references a dataset not present on this node).
    /// Nothing was inserted.
    #[error("invalid execution plan: {source}")]
    InvalidPlan {
        #[source]
        source: EngineError,
    },

    /// The node reached its configured maximum concurrent-engine count.
    /// Nothing was inserted.
    #[error("engine limit reached (max_engines: {max})")]
    ResourceExhausted { max: usize },

    /// Unknown identifier: never created, already destroyed, or expired by
    /// the idle sweep.
    #[error("engine {engine_id} not found")]
    NotFound { engine_id: EngineId },

    /// The caller's kind tag disagrees with the stored kind. The engine was
    /// not invoked.
    #[error("engine {engine_id} is a {actual} engine, caller expected {requested}")]
    TypeMismatch {
        engine_id: EngineId,
        requested: EngineKind,
        actual: EngineKind,
    },

    /// The exclusive-use flag is already held by another in-flight call.
    /// Also returned by destroy attempted against a held entry.
    #[error("engine {engine_id} is in use")]
    EngineBusy { engine_id: EngineId },

    /// The engine's own step execution failed. The entry stays registered
    /// and unlocked; destruction is left to an explicit caller decision.
    #[error("engine {engine_id} step execution failed")]
    ExecutionFailed {
        engine_id: EngineId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Errors surfaced by the traversal-algorithm collaborator across the engine
/// boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The serialized plan could not be decoded
    #[error("malformed execution plan: {0}")]
    MalformedPlan(String),

    /// The plan references a dataset shard this node does not hold
    #[error("dataset {0} is not available on this node")]
    DatasetUnavailable(String),

    /// A traversal step failed mid-execution
    #[error("step execution failed: {0}")]
    StepFailed(String),
}
