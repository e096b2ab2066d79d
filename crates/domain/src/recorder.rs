//! Snapshot of variable values taken when a scope is deactivated.

use std::collections::HashMap;

use crate::variable::{Variable, VariableValue};

/// Value and text of a variable at the time it was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedValue {
    /// Recorded value.
    pub value: VariableValue,
    /// Recorded display text.
    pub text: VariableValue,
}

/// Remembers variable values across deactivation so that reactivation can
/// detect changes made while the scope was inactive.
#[derive(Debug, Clone, Default)]
pub struct ValueRecorder {
    values: HashMap<String, RecordedValue>,
}

impl ValueRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the current value and text of a variable.
    pub fn record(&mut self, variable: &Variable) {
        self.values.insert(
            variable.name().to_string(),
            RecordedValue {
                value: variable.value().clone(),
                text: variable.text().clone(),
            },
        );
    }

    /// Returns true if a snapshot exists for the variable.
    #[must_use]
    pub fn has_recorded(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the snapshot for a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RecordedValue> {
        self.values.get(name)
    }

    /// Returns true if the variable was recorded and its value or text
    /// differs from the snapshot.
    #[must_use]
    pub fn has_changed(&self, variable: &Variable) -> bool {
        self.values.get(variable.name()).is_some_and(|recorded| {
            &recorded.value != variable.value() || &recorded.text != variable.text()
        })
    }

    /// Drops the snapshot for a variable.
    pub fn forget(&mut self, name: &str) {
        self.values.remove(name);
    }

    /// Returns true if any snapshot exists.
    #[must_use]
    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }

    /// Drops every snapshot.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_detect_change() {
        let mut recorder = ValueRecorder::new();
        let mut var = Variable::custom("env", "a,b").with_value("a", "a");
        recorder.record(&var);
        assert!(recorder.has_recorded("env"));
        assert!(!recorder.has_changed(&var));

        var.set_value("b", "b");
        assert!(recorder.has_changed(&var));
    }

    #[test]
    fn test_text_change_counts() {
        let mut recorder = ValueRecorder::new();
        let mut var = Variable::custom("env", "").with_value("a", "a");
        recorder.record(&var);
        var.set_value("a", "Alpha");
        assert!(recorder.has_changed(&var));
    }

    #[test]
    fn test_unrecorded_never_changed() {
        let recorder = ValueRecorder::new();
        let var = Variable::custom("env", "").with_value("a", "a");
        assert!(!recorder.has_changed(&var));
    }

    #[test]
    fn test_forget_and_clear() {
        let mut recorder = ValueRecorder::new();
        recorder.record(&Variable::constant("a", "1"));
        recorder.record(&Variable::constant("b", "2"));
        recorder.forget("a");
        assert!(!recorder.has_recorded("a"));
        assert!(recorder.has_values());
        recorder.clear();
        assert!(!recorder.has_values());
    }
}
