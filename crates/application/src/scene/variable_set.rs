//! The variables owned by one scope and their transient scheduling state.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use tokio::task::AbortHandle;

use cascade_domain::{NodeId, ValueRecorder, Variable, VariableUpdate};

/// A scope: an ordered variable list attached to one consumer node.
///
/// From the scope's viewpoint every variable is exactly one of stable,
/// queued (`to_update`) or updating (`updating`). A name may sit in both
/// collections while its run is in flight; it leaves both on completion.
/// Requeueing a name whose run is in flight cancels that run, so a
/// completion never carries options computed from stale inputs.
#[derive(Debug)]
pub(crate) struct VariableSet {
    pub(crate) node: NodeId,
    pub(crate) variables: Vec<Variable>,
    pub(crate) to_update: IndexSet<String>,
    pub(crate) updating: HashMap<String, AbortHandle>,
    pub(crate) changed: HashSet<String>,
    pub(crate) recorder: ValueRecorder,
    pub(crate) active: bool,
}

impl VariableSet {
    pub(crate) fn new(node: NodeId, variables: Vec<Variable>) -> Self {
        Self {
            node,
            variables,
            to_update: IndexSet::new(),
            updating: HashMap::new(),
            changed: HashSet::new(),
            recorder: ValueRecorder::new(),
            active: false,
        }
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name() == name)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name() == name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name() == name)
    }

    /// Queued or in flight.
    pub(crate) fn is_pending(&self, name: &str) -> bool {
        self.to_update.contains(name) || self.updating.contains_key(name)
    }

    /// Queues a name, cancelling its run if one is in flight.
    ///
    /// Returns the aborted handle so the caller can forget the run.
    pub(crate) fn requeue(&mut self, name: &str) -> Option<AbortHandle> {
        self.to_update.insert(name.to_string());
        let handle = self.updating.remove(name)?;
        handle.abort();
        if let Some(variable) = self.get_mut(name) {
            variable.on_cancel();
        }
        Some(handle)
    }

    /// Requeues every other variable whose definition references `name`.
    ///
    /// Returns the handles of the runs that were cancelled.
    pub(crate) fn add_dependents_to_queue(&mut self, name: &str) -> Vec<AbortHandle> {
        let dependents: Vec<String> = self
            .variables
            .iter_mut()
            .filter_map(|variable| {
                (variable.name() != name && variable.has_dependency_on(name))
                    .then(|| variable.name().to_string())
            })
            .collect();
        dependents
            .iter()
            .filter_map(|dependent| self.requeue(dependent))
            .collect()
    }

    /// Lets every variable's tracker observe a completed update.
    pub(crate) fn forward_to_trackers(&mut self, update: &VariableUpdate) {
        for variable in &mut self.variables {
            if variable.name() == update.name {
                continue;
            }
            let (tracker, definition) = variable.tracker_mut();
            tracker.variable_update_completed(definition, update);
        }
    }

    /// Drops a name from both scheduling collections, aborting its run.
    ///
    /// Returns the aborted handle so the caller can forget the run.
    pub(crate) fn purge(&mut self, name: &str) -> Option<AbortHandle> {
        self.to_update.shift_remove(name);
        self.changed.remove(name);
        let handle = self.updating.remove(name)?;
        handle.abort();
        Some(handle)
    }
}
