//! Per-consumer dependency tracker.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde_json::Value;

use crate::interpolation::{ALL_VARIABLES_MACRO, extract_variable_names};

use super::ConsumerState;

/// Which parts of a consumer's state are scanned for references.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatePaths {
    /// Every field.
    #[default]
    All,
    /// Only the listed top-level fields.
    Fields(Vec<String>),
}

/// Notification that a variable finished revalidating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableUpdate {
    /// Name of the variable as seen by the notified consumer.
    pub name: String,
    /// Whether the variable's value changed during the revalidation.
    pub has_changed: bool,
}

impl VariableUpdate {
    /// Creates an update notification.
    #[must_use]
    pub fn new(name: impl Into<String>, has_changed: bool) -> Self {
        Self {
            name: name.into(),
            has_changed,
        }
    }
}

/// A consumer's reaction to a variable update.
pub type Reaction = Box<dyn FnMut(&VariableUpdate) + Send>;

/// Caches the variable names a consumer depends on and reacts to
/// completed variable updates.
///
/// The name set is rescanned only when the consumer state version moved and,
/// for [`StatePaths::Fields`], one of the registered fields actually changed.
pub struct DependencyTracker {
    state_paths: StatePaths,
    explicit_names: Vec<String>,
    names: BTreeSet<String>,
    scanned_version: Option<u64>,
    scanned_fields: HashMap<String, Value>,
    scan_count: usize,
    waiting_for_variables: bool,
    render_requests: usize,
    on_referenced_variable_value_changed: Option<Reaction>,
    on_variable_update_completed: Option<Reaction>,
    on_any_variable_changed: Option<Reaction>,
}

impl DependencyTracker {
    /// Creates a tracker scanning the given state paths.
    #[must_use]
    pub fn new(state_paths: StatePaths) -> Self {
        Self {
            state_paths,
            explicit_names: Vec::new(),
            names: BTreeSet::new(),
            scanned_version: None,
            scanned_fields: HashMap::new(),
            scan_count: 0,
            waiting_for_variables: false,
            render_requests: 0,
            on_referenced_variable_value_changed: None,
            on_variable_update_completed: None,
            on_any_variable_changed: None,
        }
    }

    /// Adds names the consumer depends on without referencing them in state.
    #[must_use]
    pub fn with_variable_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.explicit_names = names.into_iter().map(Into::into).collect();
        self.scanned_version = None;
        self
    }

    /// Reaction when a referenced variable's value changed.
    #[must_use]
    pub fn on_referenced_variable_value_changed(
        mut self,
        reaction: impl FnMut(&VariableUpdate) + Send + 'static,
    ) -> Self {
        self.on_referenced_variable_value_changed = Some(Box::new(reaction));
        self
    }

    /// Reaction when a referenced variable changed, or on every completion
    /// while the consumer waits for variables.
    #[must_use]
    pub fn on_variable_update_completed(
        mut self,
        reaction: impl FnMut(&VariableUpdate) + Send + 'static,
    ) -> Self {
        self.on_variable_update_completed = Some(Box::new(reaction));
        self
    }

    /// Reaction on every completion, referenced or not.
    #[must_use]
    pub fn on_any_variable_changed(
        mut self,
        reaction: impl FnMut(&VariableUpdate) + Send + 'static,
    ) -> Self {
        self.on_any_variable_changed = Some(Box::new(reaction));
        self
    }

    /// Returns the referenced variable names, rescanning when needed.
    pub fn names(&mut self, state: &ConsumerState) -> &BTreeSet<String> {
        if self.needs_scan(state) {
            self.scan(state);
        }
        self.scanned_version = Some(state.version());
        &self.names
    }

    /// Returns true if the consumer references `name`.
    pub fn has_dependency_on(&mut self, state: &ConsumerState, name: &str) -> bool {
        self.names(state).contains(name)
    }

    /// Number of scans performed so far.
    #[must_use]
    pub const fn scan_count(&self) -> usize {
        self.scan_count
    }

    /// Number of re-renders requested by the default reaction.
    #[must_use]
    pub const fn render_requests(&self) -> usize {
        self.render_requests
    }

    /// Returns true if the consumer last reported a dependency still loading.
    #[must_use]
    pub const fn is_waiting_for_variables(&self) -> bool {
        self.waiting_for_variables
    }

    /// Records whether a dependency is still loading.
    pub const fn set_waiting_for_variables(&mut self, waiting: bool) {
        self.waiting_for_variables = waiting;
    }

    /// Handles a completed variable update.
    ///
    /// Returns true if a referenced variable changed.
    pub fn variable_update_completed(
        &mut self,
        state: &ConsumerState,
        update: &VariableUpdate,
    ) -> bool {
        let names = self.names(state);
        let references = names.contains(&update.name) || names.contains(ALL_VARIABLES_MACRO);
        let dependency_changed = references && update.has_changed;

        if let Some(reaction) = &mut self.on_any_variable_changed {
            reaction(update);
        }

        if self.waiting_for_variables || dependency_changed {
            if let Some(reaction) = &mut self.on_variable_update_completed {
                reaction(update);
            }
        }

        if dependency_changed {
            if let Some(reaction) = &mut self.on_referenced_variable_value_changed {
                reaction(update);
            }
            if self.on_referenced_variable_value_changed.is_none()
                && self.on_variable_update_completed.is_none()
            {
                self.render_requests += 1;
            }
        }

        dependency_changed
    }

    fn needs_scan(&self, state: &ConsumerState) -> bool {
        let Some(version) = self.scanned_version else {
            return true;
        };
        if version == state.version() {
            return false;
        }
        match &self.state_paths {
            StatePaths::All => true,
            StatePaths::Fields(paths) => paths
                .iter()
                .any(|path| self.scanned_fields.get(path) != state.get(path)),
        }
    }

    fn scan(&mut self, state: &ConsumerState) {
        let mut names: BTreeSet<String> = self.explicit_names.iter().cloned().collect();
        self.scanned_fields.clear();

        let mut scan_value = |value: &Value| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            names.extend(extract_variable_names(&text));
        };

        match &self.state_paths {
            StatePaths::All => state.fields().values().for_each(&mut scan_value),
            StatePaths::Fields(paths) => {
                for path in paths {
                    if let Some(value) = state.get(path) {
                        scan_value(value);
                        self.scanned_fields.insert(path.clone(), value.clone());
                    }
                }
            }
        }

        self.names = names;
        self.scan_count += 1;
    }
}

impl Default for DependencyTracker {
    fn default() -> Self {
        Self::new(StatePaths::All)
    }
}

impl fmt::Debug for DependencyTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyTracker")
            .field("state_paths", &self.state_paths)
            .field("names", &self.names)
            .field("scan_count", &self.scan_count)
            .field("waiting_for_variables", &self.waiting_for_variables)
            .field("render_requests", &self.render_requests)
            .finish_non_exhaustive()
    }
}
