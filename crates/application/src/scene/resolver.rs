//! Name resolution along the scope chain, interpolation and loading checks.

use std::collections::HashSet;

use cascade_domain::interpolation::{format_variable, interpolate};
use cascade_domain::{NodeId, ScopeId, Variable};

use crate::error::ApplicationResult;

use super::Scene;
use super::macros;
use super::tree::ConsumerNode;

type Visited = HashSet<(ScopeId, String)>;

impl Scene {
    /// Scopes visible from `node`, nearest first.
    pub(crate) fn scope_chain(&self, node: NodeId) -> Vec<ScopeId> {
        self.ancestors(node)
            .filter_map(|id| self.nodes[id.index()].scope)
            .collect()
    }

    /// The first scope in `chain` defining `name`.
    pub(crate) fn find_owner(&self, chain: &[ScopeId], name: &str) -> Option<ScopeId> {
        chain
            .iter()
            .copied()
            .find(|scope| self.sets[scope.index()].get(name).is_some())
    }

    /// Resolves a name to the nearest in-scope variable seen from `node`.
    ///
    /// A nested scope defining the same name shadows its ancestors.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn get_by_name(&self, node: NodeId, name: &str) -> ApplicationResult<Option<&Variable>> {
        self.node(node)?;
        let chain = self.scope_chain(node);
        Ok(self
            .find_owner(&chain, name)
            .and_then(|scope| self.sets[scope.index()].get(name)))
    }

    /// Interpolates every reference in `text` as seen from `node`.
    ///
    /// Stored variables win over macros; unresolved references stay as
    /// written.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn interpolate(&self, node: NodeId, text: &str) -> ApplicationResult<String> {
        self.node(node)?;
        Ok(self.interpolate_from(node, text))
    }

    pub(crate) fn interpolate_from(&self, node: NodeId, text: &str) -> String {
        let chain = self.scope_chain(node);
        interpolate(text, |reference| {
            if let Some(scope) = self.find_owner(&chain, &reference.name) {
                let variable = self.sets[scope.index()].get(&reference.name)?;
                return Some(format_variable(
                    variable,
                    reference.field_path.as_deref(),
                    reference.format.as_deref(),
                ));
            }
            if !reference.is_macro() {
                return None;
            }
            let time_range = self
                .nearest_time_range_owner(node)
                .and_then(|owner| self.nodes[owner.index()].time_range.as_ref());
            macros::resolve(&reference.name, time_range, || self.visible_variables(&chain))
        })
    }

    /// URL-synced variables visible through `chain`, nearest definition of
    /// each name only.
    fn visible_variables(&self, chain: &[ScopeId]) -> Vec<&Variable> {
        let mut seen = HashSet::new();
        chain
            .iter()
            .flat_map(|scope| self.sets[scope.index()].variables.iter())
            .filter(|variable| seen.insert(variable.name()))
            .filter(|variable| !variable.skips_url_sync())
            .collect()
    }

    /// Returns true if the variable is not settled: its scope is inactive,
    /// it is loading or pending, the ancestor it shadows is unsettled, or any
    /// of its dependencies is.
    ///
    /// # Errors
    /// Returns `UnknownScope` or `UnknownVariable`.
    pub fn is_variable_loading_or_waiting_to_update(
        &mut self,
        scope: ScopeId,
        name: &str,
    ) -> ApplicationResult<bool> {
        self.variable(scope, name)?;
        Ok(self.is_loading_or_waiting(scope, name, &mut HashSet::new()))
    }

    pub(crate) fn is_loading_or_waiting(&mut self, scope: ScopeId, name: &str, visited: &mut Visited) -> bool {
        if !visited.insert((scope, name.to_string())) {
            return false;
        }
        let set = &self.sets[scope.index()];
        if !set.active {
            return true;
        }
        let Some(variable) = set.get(name) else {
            return false;
        };
        if variable.is_loading() || set.is_pending(name) {
            return true;
        }
        if variable.is_shadow() && self.is_ancestor_loading(scope, name, visited) {
            return true;
        }
        self.has_variable_dependency_in_loading_state(scope, name, visited)
    }

    /// Returns true if any variable the named variable references is unsettled.
    pub(crate) fn has_variable_dependency_in_loading_state(
        &mut self,
        scope: ScopeId,
        name: &str,
        visited: &mut Visited,
    ) -> bool {
        let set = &mut self.sets[scope.index()];
        let node = set.node;
        let Some(variable) = set.get_mut(name) else {
            return false;
        };
        let is_shadow = variable.is_shadow();
        let dependencies = variable.dependency_names();

        let chain = self.scope_chain(node);
        for dependency in dependencies {
            if dependency == name {
                if is_shadow && self.is_ancestor_loading(scope, name, visited) {
                    return true;
                }
                continue;
            }
            let Some(owner) = self.find_owner(&chain, &dependency) else {
                continue;
            };
            if self.is_loading_or_waiting(owner, &dependency, visited) {
                return true;
            }
        }
        false
    }

    /// For a shadow: is the same-named variable above its scope unsettled?
    pub(crate) fn is_ancestor_loading(&mut self, scope: ScopeId, name: &str, visited: &mut Visited) -> bool {
        let node = self.sets[scope.index()].node;
        let Some(parent) = self.nodes[node.index()].parent else {
            return false;
        };
        let chain = self.scope_chain(parent);
        self.find_owner(&chain, name)
            .is_some_and(|owner| self.is_loading_or_waiting(owner, name, visited))
    }

    /// Checks the names referenced by a node's consumer state and records the
    /// answer as the tracker's waiting flag.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn has_dependency_in_loading_state(&mut self, node: NodeId) -> ApplicationResult<bool> {
        let entry = self.node_mut(node)?;
        let ConsumerNode { tracker, state, .. } = entry;
        let Some(tracker) = tracker.as_mut() else {
            return Ok(false);
        };
        let names = tracker.names(state).clone();

        let chain = self.scope_chain(node);
        let mut visited = HashSet::new();
        let mut waiting = false;
        for name in names {
            if let Some(owner) = self.find_owner(&chain, &name)
                && self.is_loading_or_waiting(owner, &name, &mut visited)
            {
                waiting = true;
                break;
            }
        }

        if let Some(tracker) = self.nodes[node.index()].tracker.as_mut() {
            tracker.set_waiting_for_variables(waiting);
        }
        Ok(waiting)
    }
}
