//! The scene: a consumer tree with variable scopes and their scheduler.
//!
//! Nodes and scopes live in arenas owned by [`Scene`] and are addressed by
//! [`NodeId`] and [`ScopeId`]. Revalidations run as tokio tasks in a
//! [`JoinSet`]; their results are applied only inside
//! [`Scene::process_next_completion`], so every scheduling collection is
//! mutated from synchronous code holding `&mut Scene`.

mod macros;
mod notify;
mod resolver;
mod scheduler;
mod tree;
mod variable_set;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::{self, JoinSet};

use cascade_domain::{NodeId, ScopeId, Variable, VariableOption, VariableValue};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{OptionsSource, SourceError};

pub use macros::{MACROS, MacroInfo};

use tree::ConsumerNode;
use variable_set::VariableSet;

const EVENT_CAPACITY: usize = 256;

type FetchResult = Result<Option<Vec<VariableOption>>, SourceError>;

/// Broadcast whenever a variable's value or text changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableChanged {
    /// Scope owning the variable.
    pub scope: ScopeId,
    /// Variable name.
    pub name: String,
    /// New value.
    pub value: VariableValue,
    /// New display text.
    pub text: VariableValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RunKey {
    scope: ScopeId,
    name: String,
}

/// A consumer tree with variable scopes.
pub struct Scene {
    title: String,
    nodes: Vec<ConsumerNode>,
    sets: Vec<VariableSet>,
    sources: HashMap<String, Arc<dyn OptionsSource>>,
    in_flight: JoinSet<FetchResult>,
    runs: HashMap<task::Id, RunKey>,
    events: broadcast::Sender<VariableChanged>,
}

impl Scene {
    /// Creates a scene holding only an inactive root node.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            nodes: vec![ConsumerNode::new(title.clone(), None)],
            title,
            sets: Vec::new(),
            sources: HashMap::new(),
            in_flight: JoinSet::new(),
            runs: HashMap::new(),
            events,
        }
    }

    /// Returns the scene title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Registers an options source under a name for query variables.
    pub fn register_source(&mut self, name: impl Into<String>, source: Arc<dyn OptionsSource>) {
        self.sources.insert(name.into(), source);
    }

    /// Subscribes to value-changed events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<VariableChanged> {
        self.events.subscribe()
    }

    /// Every scope in creation order.
    pub fn scopes(&self) -> impl Iterator<Item = ScopeId> + '_ {
        (0..self.sets.len()).map(ScopeId::new)
    }

    /// The variables of a scope in declaration order.
    ///
    /// # Errors
    /// Returns `UnknownScope` if the scope does not exist.
    pub fn variables(&self, scope: ScopeId) -> ApplicationResult<&[Variable]> {
        Ok(&self.set(scope)?.variables)
    }

    /// Looks up a variable owned by a scope.
    ///
    /// # Errors
    /// Returns `UnknownScope` or `UnknownVariable`.
    pub fn variable(&self, scope: ScopeId, name: &str) -> ApplicationResult<&Variable> {
        self.set(scope)?
            .get(name)
            .ok_or_else(|| ApplicationError::UnknownVariable {
                scope,
                name: name.to_string(),
            })
    }

    /// Returns true if any revalidation is in flight.
    #[must_use]
    pub fn has_pending_updates(&self) -> bool {
        !self.runs.is_empty()
    }

    /// Waits for the next revalidation task to finish and applies it.
    ///
    /// Results of cancelled runs are discarded. Returns false once no task
    /// is left.
    pub async fn process_next_completion(&mut self) -> bool {
        let Some(joined) = self.in_flight.join_next_with_id().await else {
            return false;
        };
        match joined {
            Ok((id, result)) => {
                if let Some(key) = self.runs.remove(&id) {
                    self.handle_completion(key, id, result.map_err(|e| e.to_string()));
                }
            }
            Err(err) if err.is_cancelled() => {
                self.runs.remove(&err.id());
            }
            Err(err) => {
                if let Some(key) = self.runs.remove(&err.id()) {
                    let message = format!("options source panicked: {err}");
                    self.handle_completion(key, err.id(), Err(message));
                }
            }
        }
        true
    }

    /// Processes completions until no revalidation is in flight.
    ///
    /// Variables still queued behind an inactive scope stay queued.
    pub async fn run_until_idle(&mut self) {
        while self.process_next_completion().await {}
    }

    pub(crate) fn set(&self, scope: ScopeId) -> ApplicationResult<&VariableSet> {
        self.sets
            .get(scope.index())
            .ok_or(ApplicationError::UnknownScope(scope))
    }

    pub(crate) fn set_mut(&mut self, scope: ScopeId) -> ApplicationResult<&mut VariableSet> {
        self.sets
            .get_mut(scope.index())
            .ok_or(ApplicationError::UnknownScope(scope))
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("title", &self.title)
            .field("nodes", &self.nodes.len())
            .field("scopes", &self.sets.len())
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .field("in_flight", &self.runs.len())
            .finish_non_exhaustive()
    }
}
