//! Consumer tree notification after a variable settles.

use std::collections::HashSet;

use tracing::trace;

use cascade_domain::{NodeId, ScopeId, Variable, VariableUpdate};

use super::Scene;
use super::tree::ConsumerNode;

impl Scene {
    /// Forwards a settled variable to its own scope's trackers and walks the
    /// consumer tree from the scope's node.
    ///
    /// `has_changed` is consumed from the scope's changed set, so a change is
    /// reported once.
    pub(crate) fn notify_dependents(&mut self, scope: ScopeId, name: &str) {
        let set = &mut self.sets[scope.index()];
        let has_changed = set.changed.remove(name);
        let update = VariableUpdate::new(name, has_changed);
        set.forward_to_trackers(&update);

        let node = set.node;
        self.traverse_and_notify(node, scope, &update);
    }

    /// Depth-first walk skipping inactive nodes.
    ///
    /// A nested scope defining the same name stops the descent unless that
    /// variable is a shadow, in which case the walk continues below it. A
    /// shadow whose ancestor is still unsettled reports the update as changed
    /// to everything beneath it.
    fn traverse_and_notify(&mut self, node: NodeId, origin: ScopeId, update: &VariableUpdate) {
        let entry = &self.nodes[node.index()];
        if !entry.active {
            return;
        }

        let nested = entry.scope.filter(|scope| *scope != origin);
        let mut escalated = None;
        if let Some(scope) = nested {
            let shadow = self.sets[scope.index()]
                .get(&update.name)
                .map(Variable::is_shadow);
            match shadow {
                Some(true) => {
                    trace!(node = %node, variable = %update.name, "continuing below shadow");
                    if !update.has_changed
                        && self.is_ancestor_loading(scope, &update.name, &mut HashSet::new())
                    {
                        escalated = Some(VariableUpdate::new(update.name.clone(), true));
                    }
                }
                Some(false) => return,
                None => {}
            }
        }
        let update = escalated.as_ref().unwrap_or(update);

        let ConsumerNode { tracker, state, .. } = &mut self.nodes[node.index()];
        let waiting = tracker.as_mut().is_some_and(|tracker| {
            tracker.variable_update_completed(state, update);
            tracker.is_waiting_for_variables()
        });
        if waiting {
            // a waiting consumer re-evaluates its dependencies on every completion
            let _ = self.has_dependency_in_loading_state(node);
        }

        if let Some(scope) = nested {
            self.handle_parent_update_completed(scope, update);
        }

        let children = self.nodes[node.index()].children.clone();
        for child in children {
            self.traverse_and_notify(child, origin, update);
        }
    }

    /// A variable of an enclosing scope settled.
    fn handle_parent_update_completed(&mut self, scope: ScopeId, update: &VariableUpdate) {
        let set = &mut self.sets[scope.index()];
        let cancelled = if update.has_changed {
            set.add_dependents_to_queue(&update.name)
        } else {
            Vec::new()
        };
        set.forward_to_trackers(update);
        let idle = set.updating.is_empty();
        let queued = !set.to_update.is_empty();
        let restarted = self.forget_runs(scope, cancelled);
        if queued && (idle || restarted) {
            self.update_next_batch(scope);
        }
    }
}
