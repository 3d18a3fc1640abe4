//! Process-wide registry of traversal engines.
//!
//! This module:
//! - Maps opaque engine identifiers to engine entries
//! - Enforces exclusive use of each engine across independent request cycles
//! - Reclaims abandoned engines through a background idle sweep
//! - Keeps identifier generation collision-free for the process lifetime
//!
//! The registry is the single structure shared across all request workers; it
//! is constructed once at node startup, handed by reference to the transport
//! handler, and torn down with the node.

mod engine_entry;
mod engine_id;
mod engine_registry;
mod idle_sweeper;

pub(crate) use engine_entry::*;
pub use engine_id::*;
pub use engine_registry::*;
pub use idle_sweeper::*;

#[cfg(test)]
mod engine_id_test;
