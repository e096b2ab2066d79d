//! The variable and its value reconciliation state machine.

use std::collections::BTreeSet;

use crate::dependency::{ConsumerState, DependencyTracker, StatePaths};

use super::{ALL_VARIABLE_TEXT, ALL_VARIABLE_VALUE, VariableKind, VariableOption, VariableValue};

/// A named variable owned by one scope.
///
/// Mutated only through its state machine: [`Variable::validate_and_update`]
/// (reconciliation against freshly loaded options), [`Variable::change_value_to`]
/// (explicit change) and the cancellation/error transitions, or by direct
/// state replacement through [`Variable::set_value`].
#[derive(Debug)]
pub struct Variable {
    name: String,
    label: Option<String>,
    kind: VariableKind,
    value: VariableValue,
    text: VariableValue,
    options: Vec<VariableOption>,
    loading: bool,
    error: Option<String>,
    is_multi: bool,
    include_all: bool,
    default_to_all: bool,
    all_value: Option<String>,
    lazy: bool,
    skip_url_sync: bool,
    skip_next_validation: bool,
    definition: ConsumerState,
    tracker: DependencyTracker,
}

impl Variable {
    /// Creates a variable of the given kind with an empty value.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        let definition = ConsumerState::new(kind.referencing_fields());
        Self {
            name: name.into(),
            label: None,
            kind,
            value: VariableValue::default(),
            text: VariableValue::default(),
            options: Vec::new(),
            loading: false,
            error: None,
            is_multi: false,
            include_all: false,
            default_to_all: false,
            all_value: None,
            lazy: false,
            skip_url_sync: false,
            skip_next_validation: false,
            definition,
            tracker: DependencyTracker::new(StatePaths::All),
        }
    }

    /// Creates a query variable backed by the named options source.
    #[must_use]
    pub fn query(
        name: impl Into<String>,
        source: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            VariableKind::Query {
                source: source.into(),
                query: query.into(),
                refresh: super::VariableRefresh::default(),
            },
        )
    }

    /// Creates a custom variable from a comma-separated option list.
    #[must_use]
    pub fn custom(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self::new(
            name,
            VariableKind::Custom {
                query: query.into(),
            },
        )
    }

    /// Creates a constant variable.
    #[must_use]
    pub fn constant(name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        let value = value.into();
        Self::new(name, VariableKind::Constant).with_value(value.clone(), value)
    }

    /// Creates a text box variable.
    #[must_use]
    pub fn text_box(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = VariableValue::Single(value.into());
        Self::new(name, VariableKind::TextBox).with_value(value.clone(), value)
    }

    /// Creates a scope-local shadow with a fixed value and text.
    #[must_use]
    pub fn local(
        name: impl Into<String>,
        value: impl Into<VariableValue>,
        text: impl Into<VariableValue>,
    ) -> Self {
        Self::new(name, VariableKind::Local).with_value(value, text)
    }

    /// Sets the initial value and text.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<VariableValue>, text: impl Into<VariableValue>) -> Self {
        self.value = value.into();
        self.text = text.into();
        self
    }

    /// Sets the initially known options.
    #[must_use]
    pub fn with_options(mut self, options: Vec<VariableOption>) -> Self {
        self.options = options;
        self
    }

    /// Sets a display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the refresh policy of a query variable. Other kinds ignore it.
    #[must_use]
    pub fn with_refresh(mut self, policy: super::VariableRefresh) -> Self {
        if let VariableKind::Query { refresh, .. } = &mut self.kind {
            *refresh = policy;
        }
        self
    }

    /// Allows selecting several values.
    #[must_use]
    pub const fn multi(mut self) -> Self {
        self.is_multi = true;
        self
    }

    /// Offers the All option.
    #[must_use]
    pub const fn include_all(mut self) -> Self {
        self.include_all = true;
        self
    }

    /// Falls back to All instead of the first option.
    #[must_use]
    pub const fn default_to_all(mut self) -> Self {
        self.default_to_all = true;
        self
    }

    /// Interpolates an All selection as this raw value.
    #[must_use]
    pub fn with_all_value(mut self, all_value: impl Into<String>) -> Self {
        self.all_value = Some(all_value.into());
        self
    }

    /// Never revalidates automatically.
    #[must_use]
    pub const fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Excludes the variable from URL state and `__all_variables`.
    #[must_use]
    pub const fn skip_url_sync(mut self) -> Self {
        self.skip_url_sync = true;
        self
    }

    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display label, falling back to the name.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> &VariableKind {
        &self.kind
    }

    /// Returns the current value.
    #[must_use]
    pub const fn value(&self) -> &VariableValue {
        &self.value
    }

    /// Returns the current display text.
    #[must_use]
    pub const fn text(&self) -> &VariableValue {
        &self.text
    }

    /// Returns the options from the last reconciliation.
    #[must_use]
    pub fn options(&self) -> &[VariableOption] {
        &self.options
    }

    /// Returns true while a revalidation is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns the error of the last revalidation, if it failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns true if several values may be selected.
    #[must_use]
    pub const fn is_multi(&self) -> bool {
        self.is_multi
    }

    /// Returns true if the All option is offered.
    #[must_use]
    pub const fn includes_all(&self) -> bool {
        self.include_all
    }

    /// Returns the custom All value, if any.
    #[must_use]
    pub fn all_value(&self) -> Option<&str> {
        self.all_value.as_deref()
    }

    /// Returns true if the variable never revalidates automatically.
    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Returns true if the variable is excluded from URL state.
    #[must_use]
    pub const fn skips_url_sync(&self) -> bool {
        self.skip_url_sync
    }

    /// Returns true for a scope-local shadow.
    #[must_use]
    pub const fn is_shadow(&self) -> bool {
        matches!(self.kind, VariableKind::Local)
    }

    /// Returns true if the variable has a revalidation operation.
    #[must_use]
    pub const fn can_revalidate(&self) -> bool {
        self.kind.has_options()
    }

    /// Returns true if activation of the owning scope should revalidate it.
    #[must_use]
    pub fn needs_update_on_activation(&self) -> bool {
        if self.lazy || !self.can_revalidate() {
            return false;
        }
        !(self.kind.refresh() == super::VariableRefresh::Never && !self.options.is_empty())
    }

    /// Replaces the query of a query or custom variable.
    ///
    /// The dependency names are rescanned on next access.
    pub fn set_query(&mut self, new_query: impl Into<String>) {
        if let VariableKind::Query { query, .. } | VariableKind::Custom { query } = &mut self.kind {
            *query = new_query.into();
            self.definition.replace(self.kind.referencing_fields());
        }
    }

    /// Names of the variables referenced by this variable's definition.
    pub fn dependency_names(&mut self) -> BTreeSet<String> {
        self.tracker.names(&self.definition).clone()
    }

    /// Returns true if the definition references `name`.
    pub fn has_dependency_on(&mut self, name: &str) -> bool {
        self.tracker.has_dependency_on(&self.definition, name)
    }

    /// Returns the dependency tracker together with the state it scans.
    pub fn tracker_mut(&mut self) -> (&mut DependencyTracker, &ConsumerState) {
        (&mut self.tracker, &self.definition)
    }

    /// Enters the loading state.
    pub fn begin_update(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Leaves the loading state without new options.
    pub const fn finish_update(&mut self) {
        self.loading = false;
    }

    /// Records a failed revalidation. The value is left untouched.
    pub fn fail_update(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    /// Cancellation hook: leaves the loading state without marking the
    /// variable stable.
    pub const fn on_cancel(&mut self) {
        self.loading = false;
    }

    /// Replaces value and text directly. Emits nothing.
    pub fn set_value(&mut self, value: impl Into<VariableValue>, text: impl Into<VariableValue>) {
        self.value = value.into();
        self.text = text.into();
    }

    /// Applies a value restored from persisted state.
    ///
    /// The value survives the next reconciliation even when it is absent
    /// from the options loaded at that point.
    pub fn apply_persisted_value(
        &mut self,
        value: impl Into<VariableValue>,
        text: Option<VariableValue>,
    ) {
        let value = value.into();
        let text = text.unwrap_or_else(|| self.text_for(&value));
        self.value = value;
        self.text = text;
        self.skip_next_validation = true;
    }

    /// Reconciles the current selection with freshly loaded options.
    ///
    /// Returns true if a value-changed event must be emitted: the value or
    /// text changed, or the value is All and the option list changed.
    pub fn validate_and_update(&mut self, options: Vec<VariableOption>) -> bool {
        let previous_value = self.value.clone();
        let previous_text = self.text.clone();
        let options_changed = options != self.options;

        let (mut value, mut text) = self.selection_for(&options);

        if self.skip_next_validation {
            let is_all_fix = value.is_all() && self.text.to_string() == ALL_VARIABLE_TEXT;
            if value != self.value && text != self.text && !is_all_fix {
                value = self.value.clone();
                text = self.text.clone();
            }
            self.skip_next_validation = false;
        }

        self.options = options;
        self.value = value;
        self.text = text;
        self.loading = false;
        self.error = None;

        self.value != previous_value
            || self.text != previous_text
            || (self.value.is_all() && options_changed)
    }

    /// Changes the selection explicitly.
    ///
    /// Returns true if value or text changed and a value-changed event must
    /// be emitted.
    pub fn change_value_to(&mut self, value: VariableValue, text: Option<VariableValue>) -> bool {
        if value == self.value && text.as_ref() == Some(&self.text) {
            return false;
        }

        let mut text = text.unwrap_or_else(|| self.text_for(&value));
        let mut value = value;

        if matches!(&value, VariableValue::Multi(values) if values.is_empty()) {
            (value, text) = self.default_multi_state(&self.options);
        }

        if let VariableValue::Multi(values) = &mut value {
            if values.last().is_some_and(|v| v == ALL_VARIABLE_VALUE) {
                *values = vec![ALL_VARIABLE_VALUE.to_string()];
                text = VariableValue::Multi(vec![ALL_VARIABLE_TEXT.to_string()]);
            } else if values.len() > 1 && values[0] == ALL_VARIABLE_VALUE {
                values.remove(0);
                if let VariableValue::Multi(texts) = &mut text
                    && !texts.is_empty()
                {
                    texts.remove(0);
                }
            }
        }

        if value == self.value && text == self.text {
            return false;
        }

        self.value = value;
        self.text = text;
        self.loading = false;
        true
    }

    /// Returns the option currently selected, for single selections.
    #[must_use]
    pub fn selected_option(&self) -> Option<&VariableOption> {
        let current = self.value.first()?;
        self.options.iter().find(|o| o.value == current)
    }

    /// Display text for a value: the All label, a matching option label, or
    /// the value itself.
    fn text_for(&self, value: &VariableValue) -> VariableValue {
        match value {
            VariableValue::Multi(values) => {
                VariableValue::Multi(values.iter().map(|v| self.label_for(v)).collect())
            }
            VariableValue::Single(v) => VariableValue::Single(self.label_for(v)),
            VariableValue::Custom(_) => value.clone(),
        }
    }

    fn label_for(&self, value: &str) -> String {
        if value == ALL_VARIABLE_VALUE {
            return ALL_VARIABLE_TEXT.to_string();
        }
        self.options
            .iter()
            .find(|o| o.value == value)
            .or_else(|| self.options.iter().find(|o| o.label == value))
            .map_or_else(|| value.to_string(), |o| o.label.clone())
    }

    fn selection_for(&self, options: &[VariableOption]) -> (VariableValue, VariableValue) {
        if options.is_empty() {
            if self.default_to_all || self.include_all {
                return (VariableValue::all(), VariableValue::all_text());
            }
            if self.is_multi {
                return (VariableValue::empty_multi(), VariableValue::empty_multi());
            }
            return (VariableValue::default(), VariableValue::default());
        }

        if self.value.is_all() {
            if self.include_all {
                let text = match self.value {
                    VariableValue::Multi(_) => {
                        VariableValue::Multi(vec![ALL_VARIABLE_TEXT.to_string()])
                    }
                    _ => VariableValue::all_text(),
                };
                return (self.value.clone(), text);
            }
            let first = &options[0];
            if self.is_multi {
                return (
                    VariableValue::Multi(vec![first.value.clone()]),
                    VariableValue::Multi(vec![first.label.clone()]),
                );
            }
            return (
                VariableValue::Single(first.value.clone()),
                VariableValue::Single(first.label.clone()),
            );
        }

        if self.is_multi || matches!(self.value, VariableValue::Multi(_)) {
            let mut values = Vec::new();
            let mut texts = Vec::new();
            for current in self.value.to_list() {
                if let Some(option) = options.iter().find(|o| o.value == current) {
                    values.push(option.value.clone());
                    texts.push(option.label.clone());
                }
            }
            if values.is_empty() {
                return self.default_multi_state(options);
            }
            return (VariableValue::Multi(values), VariableValue::Multi(texts));
        }

        match find_option_matching_current(&self.value, &self.text, options) {
            Some(option) => (
                VariableValue::Single(option.value.clone()),
                VariableValue::Single(option.label.clone()),
            ),
            None => self.default_single_state(options),
        }
    }

    fn default_multi_state(&self, options: &[VariableOption]) -> (VariableValue, VariableValue) {
        if self.default_to_all {
            return (
                VariableValue::Multi(vec![ALL_VARIABLE_VALUE.to_string()]),
                VariableValue::Multi(vec![ALL_VARIABLE_TEXT.to_string()]),
            );
        }
        options.first().map_or_else(
            || (VariableValue::empty_multi(), VariableValue::empty_multi()),
            |first| {
                (
                    VariableValue::Multi(vec![first.value.clone()]),
                    VariableValue::Multi(vec![first.label.clone()]),
                )
            },
        )
    }

    fn default_single_state(&self, options: &[VariableOption]) -> (VariableValue, VariableValue) {
        if self.default_to_all {
            return (VariableValue::all(), VariableValue::all_text());
        }
        options.first().map_or_else(
            || (VariableValue::default(), VariableValue::default()),
            |first| {
                (
                    VariableValue::Single(first.value.clone()),
                    VariableValue::Single(first.label.clone()),
                )
            },
        )
    }
}

/// Finds the option matching the current value, or else the current text.
fn find_option_matching_current<'a>(
    value: &VariableValue,
    text: &VariableValue,
    options: &'a [VariableOption],
) -> Option<&'a VariableOption> {
    let value = value.to_string();
    let text = text.to_string();
    let mut text_match = None;
    for option in options {
        if option.value == value {
            return Some(option);
        }
        if option.label == text {
            text_match = Some(option);
        }
    }
    text_match
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::variable::VariableRefresh;
    use pretty_assertions::assert_eq;

    fn options(values: &[&str]) -> Vec<VariableOption> {
        values.iter().map(|v| VariableOption::same(*v)).collect()
    }

    #[test]
    fn test_empty_options_single() {
        let mut var = Variable::custom("env", "").with_value("prod", "prod");
        assert!(var.validate_and_update(Vec::new()));
        assert_eq!(var.value(), &VariableValue::from(""));
    }

    #[test]
    fn test_empty_options_multi() {
        let mut var = Variable::custom("env", "").multi().with_value(vec!["a"], vec!["a"]);
        var.validate_and_update(Vec::new());
        assert_eq!(var.value(), &VariableValue::empty_multi());
        assert_eq!(var.text(), &VariableValue::empty_multi());
    }

    #[test]
    fn test_empty_options_default_to_all_is_idempotent() {
        let mut var = Variable::query("A", "ds", "A.*").default_to_all();
        assert!(var.validate_and_update(Vec::new()));
        assert_eq!(var.value(), &VariableValue::all());
        assert_eq!(var.text(), &VariableValue::all_text());
        assert!(!var.validate_and_update(Vec::new()));
    }

    #[test]
    fn test_single_match_by_value_adopts_label() {
        let mut var = Variable::custom("env", "").with_value("prod", "prod");
        let changed = var.validate_and_update(vec![
            VariableOption::new("Staging", "stg"),
            VariableOption::new("Production", "prod"),
        ]);
        assert!(changed);
        assert_eq!(var.value(), &VariableValue::from("prod"));
        assert_eq!(var.text(), &VariableValue::from("Production"));
    }

    #[test]
    fn test_single_match_by_label() {
        let mut var = Variable::custom("env", "").with_value("Production", "Production");
        var.validate_and_update(vec![VariableOption::new("Production", "prod")]);
        assert_eq!(var.value(), &VariableValue::from("prod"));
    }

    #[test]
    fn test_single_no_match_falls_back_to_first() {
        let mut var = Variable::custom("env", "").with_value("gone", "gone");
        var.validate_and_update(options(&["a", "b"]));
        assert_eq!(var.value(), &VariableValue::from("a"));
    }

    #[test]
    fn test_single_no_match_default_to_all() {
        let mut var = Variable::custom("env", "").default_to_all().with_value("gone", "gone");
        var.validate_and_update(options(&["a", "b"]));
        assert!(var.value().is_all());
    }

    #[test]
    fn test_multi_keeps_valid_subset() {
        let mut var = Variable::custom("host", "")
            .multi()
            .with_value(vec!["a", "gone", "c"], vec!["a", "gone", "c"]);
        var.validate_and_update(vec![
            VariableOption::new("Alpha", "a"),
            VariableOption::same("b"),
            VariableOption::new("Charlie", "c"),
        ]);
        assert_eq!(var.value(), &VariableValue::from(vec!["a", "c"]));
        assert_eq!(var.text(), &VariableValue::from(vec!["Alpha", "Charlie"]));
    }

    #[test]
    fn test_multi_none_valid_falls_back() {
        let mut var = Variable::custom("host", "").multi().with_value(vec!["x"], vec!["x"]);
        var.validate_and_update(options(&["a", "b"]));
        assert_eq!(var.value(), &VariableValue::from(vec!["a"]));
    }

    #[test]
    fn test_all_value_kept_with_include_all() {
        let mut var = Variable::custom("host", "")
            .include_all()
            .with_value(VariableValue::all(), VariableValue::all_text());
        var.validate_and_update(options(&["a"]));
        assert!(var.value().is_all());
        // option list changed while All is selected
        assert!(var.validate_and_update(options(&["a", "b"])));
        assert!(!var.validate_and_update(options(&["a", "b"])));
    }

    #[test]
    fn test_all_value_without_include_all_picks_first() {
        let mut var = Variable::custom("host", "")
            .with_value(VariableValue::all(), VariableValue::all_text());
        var.validate_and_update(options(&["a", "b"]));
        assert_eq!(var.value(), &VariableValue::from("a"));
    }

    #[test]
    fn test_reconciliation_idempotent() {
        let mut var = Variable::custom("env", "").with_value("b", "b");
        var.validate_and_update(options(&["a", "b"]));
        assert!(!var.validate_and_update(options(&["a", "b"])));
        assert!(!var.validate_and_update(options(&["a", "b"])));
    }

    #[test]
    fn test_skip_next_validation_survives_once() {
        let mut var = Variable::custom("env", "");
        var.apply_persisted_value("restored", None);
        var.validate_and_update(options(&["a", "b"]));
        assert_eq!(var.value(), &VariableValue::from("restored"));

        var.validate_and_update(options(&["a", "b"]));
        assert_eq!(var.value(), &VariableValue::from("a"));
    }

    #[test]
    fn test_change_value_to_is_idempotent() {
        let mut var = Variable::custom("env", "").with_options(options(&["a", "b"]));
        assert!(var.change_value_to("b".into(), None));
        assert!(!var.change_value_to("b".into(), None));
        assert!(!var.change_value_to("b".into(), Some("b".into())));
    }

    #[test]
    fn test_change_value_to_clear_uses_default_multi_state() {
        let mut var = Variable::custom("host", "")
            .multi()
            .with_options(options(&["a", "b"]))
            .with_value(vec!["b"], vec!["b"]);
        assert!(var.change_value_to(VariableValue::empty_multi(), None));
        assert_eq!(var.value(), &VariableValue::from(vec!["a"]));
    }

    #[test]
    fn test_change_value_to_all_last_collapses() {
        let mut var = Variable::custom("host", "")
            .multi()
            .include_all()
            .with_options(options(&["a", "b"]));
        var.change_value_to(vec!["a", ALL_VARIABLE_VALUE].into(), None);
        assert_eq!(var.value(), &VariableValue::from(vec![ALL_VARIABLE_VALUE]));
        assert_eq!(var.text(), &VariableValue::from(vec![ALL_VARIABLE_TEXT]));
    }

    #[test]
    fn test_multi_all_text_keeps_list_shape() {
        let mut var = Variable::custom("host", "")
            .multi()
            .include_all()
            .with_options(options(&["a", "b"]));
        var.change_value_to(vec![ALL_VARIABLE_VALUE].into(), None);
        assert_eq!(var.text(), &VariableValue::from(vec![ALL_VARIABLE_TEXT]));

        assert!(!var.validate_and_update(options(&["a", "b"])));
        assert_eq!(var.value(), &VariableValue::from(vec![ALL_VARIABLE_VALUE]));
        assert_eq!(var.text(), &VariableValue::from(vec![ALL_VARIABLE_TEXT]));
    }

    #[test]
    fn test_change_value_to_drops_leading_all() {
        let mut var = Variable::custom("host", "")
            .multi()
            .include_all()
            .with_options(vec![VariableOption::new("Alpha", "a")]);
        var.change_value_to(vec![ALL_VARIABLE_VALUE, "a"].into(), None);
        assert_eq!(var.value(), &VariableValue::from(vec!["a"]));
        assert_eq!(var.text(), &VariableValue::from(vec!["Alpha"]));
    }

    #[test]
    fn test_fail_update_keeps_value() {
        let mut var = Variable::custom("env", "").with_value("a", "a");
        var.begin_update();
        var.fail_update("boom");
        assert!(!var.is_loading());
        assert_eq!(var.error(), Some("boom"));
        assert_eq!(var.value(), &VariableValue::from("a"));
    }

    #[test]
    fn test_dependency_names_follow_query() {
        let mut var = Variable::query("C", "ds", "A.$A.${B}.*");
        let names: Vec<String> = var.dependency_names().into_iter().collect();
        assert_eq!(names, vec!["A", "B"]);

        var.set_query("[[D]]");
        assert!(var.has_dependency_on("D"));
        assert!(!var.has_dependency_on("A"));
    }

    #[test]
    fn test_needs_update_on_activation() {
        assert!(Variable::query("A", "ds", "q").needs_update_on_activation());
        assert!(!Variable::query("A", "ds", "q").lazy().needs_update_on_activation());
        assert!(!Variable::constant("A", "x").needs_update_on_activation());

        let loaded = Variable::query("A", "ds", "q")
            .with_refresh(VariableRefresh::Never)
            .with_options(options(&["a"]));
        assert!(!loaded.needs_update_on_activation());
    }
}
