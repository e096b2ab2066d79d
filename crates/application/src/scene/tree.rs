//! Consumer tree: arena nodes and their lifecycle.

use serde_json::{Map, Value};
use tracing::debug;

use cascade_domain::{ConsumerState, DependencyTracker, NodeId, ScopeId, TimeRange, Variable};

use crate::error::{ApplicationError, ApplicationResult};

use super::Scene;
use super::variable_set::VariableSet;

/// A node of the externally shaped consumer tree.
#[derive(Debug)]
pub(crate) struct ConsumerNode {
    pub(crate) title: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) active: bool,
    pub(crate) auto_activate: bool,
    pub(crate) scope: Option<ScopeId>,
    pub(crate) time_range: Option<TimeRange>,
    pub(crate) state: ConsumerState,
    pub(crate) tracker: Option<DependencyTracker>,
}

impl ConsumerNode {
    pub(crate) fn new(title: String, parent: Option<NodeId>) -> Self {
        Self {
            title,
            parent,
            children: Vec::new(),
            active: false,
            auto_activate: true,
            scope: None,
            time_range: None,
            state: ConsumerState::default(),
            tracker: None,
        }
    }
}

impl Scene {
    /// Adds an inactive child node.
    ///
    /// # Errors
    /// Returns `UnknownNode` if `parent` does not exist.
    pub fn add_node(&mut self, parent: NodeId, title: impl Into<String>) -> ApplicationResult<NodeId> {
        self.node(parent)?;
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(ConsumerNode::new(title.into(), Some(parent)));
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    /// Attaches a scope holding `variables` to a node.
    ///
    /// If the node is already active the scope activates immediately.
    ///
    /// # Errors
    /// Returns `ScopeAlreadyAttached` if the node owns a scope, or a domain
    /// error for an invalid or duplicate variable name.
    pub fn attach_scope(&mut self, node: NodeId, variables: Vec<Variable>) -> ApplicationResult<ScopeId> {
        if self.node(node)?.scope.is_some() {
            return Err(ApplicationError::ScopeAlreadyAttached(node));
        }
        let mut set = VariableSet::new(node, Vec::with_capacity(variables.len()));
        for variable in variables {
            Self::check_insertable(&set, &variable)?;
            set.variables.push(variable);
        }

        let scope = ScopeId::new(self.sets.len());
        self.sets.push(set);
        self.nodes[node.index()].scope = Some(scope);
        if self.nodes[node.index()].active {
            self.activate_scope(scope);
        }
        Ok(scope)
    }

    /// Replaces a node's consumer state.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn set_node_state(&mut self, node: NodeId, fields: Map<String, Value>) -> ApplicationResult<()> {
        self.node_mut(node)?.state.replace(fields);
        Ok(())
    }

    /// Sets one field of a node's consumer state.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn set_state_field(
        &mut self,
        node: NodeId,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> ApplicationResult<()> {
        self.node_mut(node)?.state.set_field(key, value);
        Ok(())
    }

    /// Installs a dependency tracker on a node.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn track(&mut self, node: NodeId, tracker: DependencyTracker) -> ApplicationResult<()> {
        self.node_mut(node)?.tracker = Some(tracker);
        Ok(())
    }

    /// Keeps a node out of [`Scene::activate_subtree`].
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn set_auto_activate(&mut self, node: NodeId, auto_activate: bool) -> ApplicationResult<()> {
        self.node_mut(node)?.auto_activate = auto_activate;
        Ok(())
    }

    /// Activates a node and then its scope.
    ///
    /// Must be called from within a tokio runtime when the scope has
    /// variables to revalidate.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn activate(&mut self, node: NodeId) -> ApplicationResult<()> {
        let entry = self.node_mut(node)?;
        if entry.active {
            return Ok(());
        }
        entry.active = true;
        debug!(node = %node, title = %entry.title, "node activated");
        if let Some(scope) = entry.scope {
            self.activate_scope(scope);
        }
        Ok(())
    }

    /// Activates a node and, parents first, every descendant that has not
    /// opted out of automatic activation.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn activate_subtree(&mut self, node: NodeId) -> ApplicationResult<()> {
        self.activate(node)?;
        let children = self.nodes[node.index()].children.clone();
        for child in children {
            if self.nodes[child.index()].auto_activate {
                self.activate_subtree(child)?;
            }
        }
        Ok(())
    }

    /// Deactivates a node together with its whole subtree, children first.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn deactivate(&mut self, node: NodeId) -> ApplicationResult<()> {
        let children = self.node(node)?.children.clone();
        for child in children {
            self.deactivate(child)?;
        }

        let entry = &mut self.nodes[node.index()];
        if !entry.active {
            return Ok(());
        }
        entry.active = false;
        debug!(node = %node, title = %entry.title, "node deactivated");
        if let Some(scope) = entry.scope {
            self.deactivate_scope(scope);
        }
        Ok(())
    }

    /// Returns true if the node is active.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn is_active(&self, node: NodeId) -> ApplicationResult<bool> {
        Ok(self.node(node)?.active)
    }

    /// Returns the node's title.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn title_of(&self, node: NodeId) -> ApplicationResult<&str> {
        Ok(&self.node(node)?.title)
    }

    /// Returns the node's parent.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn parent_of(&self, node: NodeId) -> ApplicationResult<Option<NodeId>> {
        Ok(self.node(node)?.parent)
    }

    /// Returns the node's children in insertion order.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn children_of(&self, node: NodeId) -> ApplicationResult<&[NodeId]> {
        Ok(&self.node(node)?.children)
    }

    /// Returns the scope attached to a node, if any.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn scope_of(&self, node: NodeId) -> ApplicationResult<Option<ScopeId>> {
        Ok(self.node(node)?.scope)
    }

    /// Returns the node a scope is attached to.
    ///
    /// # Errors
    /// Returns `UnknownScope` if the scope does not exist.
    pub fn node_of(&self, scope: ScopeId) -> ApplicationResult<NodeId> {
        Ok(self.set(scope)?.node)
    }

    /// Returns a node's consumer state.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn state_of(&self, node: NodeId) -> ApplicationResult<&ConsumerState> {
        Ok(&self.node(node)?.state)
    }

    /// Returns a node's dependency tracker.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn tracker(&self, node: NodeId) -> ApplicationResult<Option<&DependencyTracker>> {
        Ok(self.node(node)?.tracker.as_ref())
    }

    /// Sets the time range owned by a node and requeues the variables
    /// refreshing on time range change that see this range as nearest.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn set_time_range(&mut self, node: NodeId, range: TimeRange) -> ApplicationResult<()> {
        self.node_mut(node)?.time_range = Some(range);
        self.refresh_time_range_variables(node);
        Ok(())
    }

    /// Returns the nearest time range, walking from `node` to the root.
    ///
    /// # Errors
    /// Returns `UnknownNode` if the node does not exist.
    pub fn time_range(&self, node: NodeId) -> ApplicationResult<Option<&TimeRange>> {
        self.node(node)?;
        Ok(self.nearest_time_range_owner(node).and_then(|owner| self.nodes[owner.index()].time_range.as_ref()))
    }

    pub(crate) fn nearest_time_range_owner(&self, node: NodeId) -> Option<NodeId> {
        self.ancestors(node)
            .find(|id| self.nodes[id.index()].time_range.is_some())
    }

    /// `node` itself first, then each ancestor up to the root.
    pub(crate) fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(node), |id| self.nodes[id.index()].parent)
    }

    pub(crate) fn node(&self, node: NodeId) -> ApplicationResult<&ConsumerNode> {
        self.nodes
            .get(node.index())
            .ok_or(ApplicationError::UnknownNode(node))
    }

    pub(crate) fn node_mut(&mut self, node: NodeId) -> ApplicationResult<&mut ConsumerNode> {
        self.nodes
            .get_mut(node.index())
            .ok_or(ApplicationError::UnknownNode(node))
    }
}
