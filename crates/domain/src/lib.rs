//! Cascade Domain - Core variable types
//!
//! This crate defines the domain model for the Cascade variable engine:
//! variable values and options, the value reconciliation state machine,
//! reference extraction and formatting, dependency tracking and the
//! serializable scene definition model.
//! All types here are pure Rust with no I/O dependencies.

pub mod definition;
pub mod dependency;
pub mod error;
pub mod id;
pub mod interpolation;
pub mod recorder;
pub mod time_range;
pub mod variable;

pub use definition::{NodeDefinition, SceneDefinition, StaticOptions, VariableDefinition};
pub use dependency::{ConsumerState, DependencyTracker, StatePaths, VariableUpdate};
pub use error::{DomainError, DomainResult};
pub use id::{NodeId, ScopeId};
pub use recorder::{RecordedValue, ValueRecorder};
pub use time_range::TimeRange;
pub use variable::{
    ALL_VARIABLE_TEXT, ALL_VARIABLE_VALUE, Variable, VariableKind, VariableOption,
    VariableRefresh, VariableValue,
};
