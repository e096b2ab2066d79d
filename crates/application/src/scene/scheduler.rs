//! Per-scope update scheduling.
//!
//! A scope queues the variables that need revalidation and starts every one
//! whose dependencies are settled. Completions requeue dependents, notify
//! the consumer tree and start the next batch until the queue drains.

use std::collections::HashSet;

use tokio::task::{self, AbortHandle};
use tracing::{debug, trace, warn};

use cascade_domain::variable::parse_custom_options;
use cascade_domain::{
    DomainError, NodeId, ScopeId, Variable, VariableKind, VariableOption, VariableRefresh,
    VariableValue, interpolation::is_valid_variable_name,
};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::OptionsRequest;

use super::variable_set::VariableSet;
use super::{RunKey, Scene, VariableChanged};

impl Scene {
    /// Adds a variable to a scope.
    ///
    /// In an active scope a variable needing an update is queued; a batch
    /// starts only if nothing was queued before.
    ///
    /// # Errors
    /// Returns `UnknownScope`, or a domain error for an invalid or duplicate
    /// name.
    pub fn add_variable(&mut self, scope: ScopeId, variable: Variable) -> ApplicationResult<()> {
        let set = self.set_mut(scope)?;
        Self::check_insertable(set, &variable)?;

        let queued_before = set.to_update.len();
        let needs_update = set.active
            && variable.needs_update_on_activation()
            && !set.recorder.has_recorded(variable.name());
        if needs_update {
            set.to_update.insert(variable.name().to_string());
        }
        debug!(scope = %scope, variable = variable.name(), "variable added");
        set.variables.push(variable);

        if queued_before == 0 && needs_update {
            self.update_next_batch(scope);
        }
        Ok(())
    }

    /// Removes a variable, cancelling its run and dropping its snapshot.
    ///
    /// # Errors
    /// Returns `UnknownScope` or `UnknownVariable`.
    pub fn remove_variable(&mut self, scope: ScopeId, name: &str) -> ApplicationResult<Variable> {
        self.variable(scope, name)?;
        self.purge(scope, name);

        let set = &mut self.sets[scope.index()];
        set.recorder.forget(name);
        let index = set
            .position(name)
            .ok_or_else(|| ApplicationError::UnknownVariable {
                scope,
                name: name.to_string(),
            })?;
        debug!(scope = %scope, variable = name, "variable removed");
        Ok(set.variables.remove(index))
    }

    /// Cancels a variable's revalidation.
    ///
    /// The variable leaves the loading state without being marked stable,
    /// and the next batch is attempted.
    ///
    /// # Errors
    /// Returns `UnknownScope` or `UnknownVariable`.
    pub fn cancel(&mut self, scope: ScopeId, name: &str) -> ApplicationResult<()> {
        self.variable(scope, name)?;
        self.purge(scope, name);

        let set = &mut self.sets[scope.index()];
        set.recorder.forget(name);
        if let Some(variable) = set.get_mut(name) {
            variable.on_cancel();
        }
        debug!(scope = %scope, variable = name, "revalidation cancelled");

        if set.active {
            self.update_next_batch(scope);
        }
        Ok(())
    }

    /// Changes a variable's selection explicitly.
    ///
    /// Emits a value-changed event if value or text changed. In an active
    /// scope the dependents are then queued and the consumer tree notified.
    /// Returns whether anything changed.
    ///
    /// # Errors
    /// Returns `UnknownScope` or `UnknownVariable`.
    pub fn change_value(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: impl Into<VariableValue>,
        text: Option<VariableValue>,
    ) -> ApplicationResult<bool> {
        let changed = self.variable_mut(scope, name)?.change_value_to(value.into(), text);
        if changed {
            self.on_value_changed(scope, name);
        }
        Ok(changed)
    }

    /// Replaces value and text without emitting anything.
    ///
    /// Meant for external state restoration; while the scope is inactive the
    /// change is detected on reactivation.
    ///
    /// # Errors
    /// Returns `UnknownScope` or `UnknownVariable`.
    pub fn set_variable_value(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: impl Into<VariableValue>,
        text: impl Into<VariableValue>,
    ) -> ApplicationResult<()> {
        self.variable_mut(scope, name)?.set_value(value, text);
        Ok(())
    }

    /// Hydrates a variable from persisted state. The value survives the next
    /// reconciliation.
    ///
    /// # Errors
    /// Returns `UnknownScope` or `UnknownVariable`.
    pub fn apply_persisted_value(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: impl Into<VariableValue>,
        text: Option<VariableValue>,
    ) -> ApplicationResult<()> {
        self.variable_mut(scope, name)?.apply_persisted_value(value, text);
        Ok(())
    }

    pub(crate) fn check_insertable(set: &VariableSet, variable: &Variable) -> Result<(), DomainError> {
        if !is_valid_variable_name(variable.name()) {
            return Err(DomainError::InvalidVariableName(variable.name().to_string()));
        }
        if set.get(variable.name()).is_some() {
            return Err(DomainError::DuplicateVariable(variable.name().to_string()));
        }
        Ok(())
    }

    fn variable_mut(&mut self, scope: ScopeId, name: &str) -> ApplicationResult<&mut Variable> {
        self.set_mut(scope)?
            .get_mut(name)
            .ok_or_else(|| ApplicationError::UnknownVariable {
                scope,
                name: name.to_string(),
            })
    }

    /// Drops a variable from both scheduling collections and forgets its run.
    fn purge(&mut self, scope: ScopeId, name: &str) {
        if let Some(handle) = self.sets[scope.index()].purge(name) {
            self.runs.remove(&handle.id());
        }
    }

    /// Forgets cancelled runs so their late results are never applied.
    ///
    /// Returns true if any run was cancelled.
    pub(crate) fn forget_runs(&mut self, scope: ScopeId, cancelled: Vec<AbortHandle>) -> bool {
        for handle in &cancelled {
            if let Some(RunKey { name, .. }) = self.runs.remove(&handle.id()) {
                debug!(scope = %scope, variable = %name, "stale revalidation cancelled");
            }
        }
        !cancelled.is_empty()
    }

    pub(crate) fn activate_scope(&mut self, scope: ScopeId) {
        let set = &mut self.sets[scope.index()];
        set.active = true;

        let mut cancelled = Vec::new();
        if set.recorder.has_values() {
            let changed: Vec<String> = set
                .variables
                .iter()
                .filter(|variable| set.recorder.has_changed(variable))
                .map(|variable| variable.name().to_string())
                .collect();
            for name in changed {
                debug!(scope = %scope, variable = %name, "changed while inactive");
                cancelled.extend(set.add_dependents_to_queue(&name));
            }
        }

        for variable in &set.variables {
            if variable.needs_update_on_activation() && !set.recorder.has_recorded(variable.name()) {
                set.to_update.insert(variable.name().to_string());
            }
        }

        debug!(scope = %scope, queued = set.to_update.len(), "scope activated");
        self.forget_runs(scope, cancelled);
        self.update_next_batch(scope);
    }

    pub(crate) fn deactivate_scope(&mut self, scope: ScopeId) {
        let set = &mut self.sets[scope.index()];

        for (name, handle) in set.updating.drain() {
            handle.abort();
            self.runs.remove(&handle.id());
            if let Some(variable) = set.variables.iter_mut().find(|v| v.name() == name) {
                variable.on_cancel();
            }
            debug!(scope = %scope, variable = %name, "revalidation cancelled by deactivation");
        }

        for variable in &set.variables {
            if set.to_update.contains(variable.name()) {
                set.recorder.forget(variable.name());
            } else {
                set.recorder.record(variable);
            }
        }

        set.to_update.clear();
        set.changed.clear();
        set.active = false;
        debug!(scope = %scope, "scope deactivated");
    }

    /// Requeues the time-range-driven variables of every active scope whose
    /// nearest time range is owned by `node`. A run still fetching for the
    /// previous range is cancelled and restarted.
    pub(crate) fn refresh_time_range_variables(&mut self, node: NodeId) {
        let scopes: Vec<ScopeId> = self
            .scopes()
            .filter(|scope| {
                let set = &self.sets[scope.index()];
                set.active && self.nearest_time_range_owner(set.node) == Some(node)
            })
            .collect();

        for scope in scopes {
            let set = &mut self.sets[scope.index()];
            let refreshing: Vec<String> = set
                .variables
                .iter()
                .filter(|variable| {
                    variable.kind().refresh() == VariableRefresh::OnTimeRangeChanged
                        && !variable.is_lazy()
                })
                .map(|variable| variable.name().to_string())
                .collect();
            let cancelled: Vec<AbortHandle> = refreshing
                .iter()
                .filter_map(|name| set.requeue(name))
                .collect();
            debug!(scope = %scope, queued = set.to_update.len(), "time range changed");
            self.forget_runs(scope, cancelled);
            self.update_next_batch(scope);
        }
    }

    /// Starts every queued variable whose dependencies are settled.
    pub(crate) fn update_next_batch(&mut self, scope: ScopeId) {
        let set = &self.sets[scope.index()];
        if !set.active {
            return;
        }
        let candidates: Vec<String> = set
            .to_update
            .iter()
            .filter(|name| !set.updating.contains_key(*name))
            .cloned()
            .collect();

        let mut failures = Vec::new();
        for name in candidates {
            if self.has_variable_dependency_in_loading_state(scope, &name, &mut HashSet::new()) {
                trace!(scope = %scope, variable = %name, "waiting for dependencies");
                continue;
            }
            if let Err(message) = self.start_update(scope, &name) {
                failures.push((name, message));
            }
        }

        for (name, message) in failures {
            warn!(scope = %scope, variable = %name, error = %message, "revalidation failed to start");
            if let Some(variable) = self.sets[scope.index()].get_mut(&name) {
                variable.fail_update(message);
            }
            self.finish_update(scope, &name);
        }
    }

    /// Spawns the revalidation task of one variable.
    fn start_update(&mut self, scope: ScopeId, name: &str) -> Result<(), String> {
        let node = self.sets[scope.index()].node;
        let kind = self.sets[scope.index()]
            .get(name)
            .map(|variable| variable.kind().clone())
            .ok_or_else(|| format!("variable {name} vanished from {scope}"))?;

        let handle: AbortHandle = match kind {
            VariableKind::Query { source, query, .. } => {
                let source_name = self.interpolate_from(node, &source);
                let source = self
                    .sources
                    .get(&source_name)
                    .cloned()
                    .ok_or_else(|| ApplicationError::MissingOptionsSource(source_name).to_string())?;
                let request = OptionsRequest {
                    variable: name.to_string(),
                    query: self.interpolate_from(node, &query),
                    time_range: self.nearest_time_range_owner(node).and_then(|owner| {
                        self.nodes[owner.index()].time_range.clone()
                    }),
                };
                debug!(scope = %scope, variable = name, query = %request.query, "starting query");
                self.in_flight.spawn(async move { source.fetch(request).await })
            }
            VariableKind::Custom { query } => {
                let query = self.interpolate_from(node, &query);
                debug!(scope = %scope, variable = name, query = %query, "starting custom");
                self.in_flight
                    .spawn(async move { Ok(Some(parse_custom_options(&query))) })
            }
            other => {
                return Err(format!("{} variables have no options to load", other.type_name()));
            }
        };

        self.runs.insert(
            handle.id(),
            RunKey {
                scope,
                name: name.to_string(),
            },
        );
        let set = &mut self.sets[scope.index()];
        set.updating.insert(name.to_string(), handle);
        if let Some(variable) = set.get_mut(name) {
            variable.begin_update();
        }
        Ok(())
    }

    /// Applies the outcome of a finished run.
    pub(crate) fn handle_completion(
        &mut self,
        key: RunKey,
        id: task::Id,
        outcome: Result<Option<Vec<VariableOption>>, String>,
    ) {
        let RunKey { scope, name } = key;
        let Some(set) = self.sets.get_mut(scope.index()) else {
            return;
        };
        if !set.updating.get(&name).is_some_and(|handle| handle.id() == id) {
            trace!(scope = %scope, variable = %name, "ignoring untracked completion");
            return;
        }
        let Some(variable) = set.get_mut(&name) else {
            return;
        };

        let changed = match outcome {
            Ok(Some(options)) => variable.validate_and_update(options),
            Ok(None) => {
                variable.finish_update();
                false
            }
            Err(message) => {
                warn!(scope = %scope, variable = %name, error = %message, "revalidation failed");
                variable.fail_update(message);
                false
            }
        };
        debug!(scope = %scope, variable = %name, changed, "revalidation completed");

        if changed {
            self.on_value_changed(scope, &name);
        }
        self.finish_update(scope, &name);
    }

    /// Raises the change event, then lets an active scope requeue dependents.
    ///
    /// Outside a run the next batch starts and the consumer tree is notified
    /// right away; inside a run both wait for its completion.
    fn on_value_changed(&mut self, scope: ScopeId, name: &str) {
        let set = &mut self.sets[scope.index()];
        if let Some(variable) = set.get(name) {
            // no receivers is fine
            let _ = self.events.send(VariableChanged {
                scope,
                name: name.to_string(),
                value: variable.value().clone(),
                text: variable.text().clone(),
            });
        }
        if !set.active {
            return;
        }

        set.changed.insert(name.to_string());
        let cancelled = set.add_dependents_to_queue(name);
        let updating = set.updating.contains_key(name);
        self.forget_runs(scope, cancelled);
        if !updating {
            self.update_next_batch(scope);
            self.notify_dependents(scope, name);
        }
    }

    /// Final bookkeeping of a run: leave the scheduling collections, notify,
    /// attempt the next batch.
    fn finish_update(&mut self, scope: ScopeId, name: &str) {
        let set = &mut self.sets[scope.index()];
        set.updating.remove(name);
        set.to_update.shift_remove(name);
        self.notify_dependents(scope, name);
        self.update_next_batch(scope);
    }
}
