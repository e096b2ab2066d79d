//! Dependency tracking for consumers of variables.

mod consumer_state;
mod tracker;

pub use consumer_state::ConsumerState;
pub use tracker::{DependencyTracker, Reaction, StatePaths, VariableUpdate};
