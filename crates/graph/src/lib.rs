//! Explicit dependency graph with memoized derived values.
//!
//! # Invariants
//! - The graph is acyclic; an insertion that would close a cycle is rejected.
//! - A derived value is recomputed only when the version of one of its
//!   dependencies changed since it was last computed.
//! - Compute functions are pure over their declared dependencies.

mod error;
mod graph;

pub use error::GraphError;
pub use graph::{Graph, Inputs, Value};

pub fn crate_info() -> &'static str {
    "sceneview-graph v0.1.0"
}
