//! Observable consumer state.

use serde_json::{Map, Value};

/// The state of a consumer as seen by its dependency tracker.
///
/// Every mutation bumps `version`, which stands in for object identity:
/// a tracker only rescans after the version moved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumerState {
    version: u64,
    fields: Map<String, Value>,
}

impl ConsumerState {
    /// Creates a state from its fields.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self { version: 0, fields }
    }

    /// Returns the version counter.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns all fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns one field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Sets one field.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
        self.version += 1;
    }

    /// Replaces all fields.
    pub fn replace(&mut self, fields: Map<String, Value>) {
        self.fields = fields;
        self.version += 1;
    }
}
