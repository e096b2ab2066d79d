//! Parser for custom variable option lists.

use std::sync::LazyLock;

use regex::Regex;

use super::VariableOption;

static ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\\,|[^,])+").expect("valid regex"));

static KEY_VALUE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(.+)\s:\s(.+)$").expect("valid regex"));

/// Parses a custom option list.
///
/// Items are comma separated; `\,` escapes a literal comma. An item of the
/// form `label : value` yields distinct label and value, otherwise both are
/// the trimmed item. Blank items are skipped.
#[must_use]
pub fn parse_custom_options(query: &str) -> Vec<VariableOption> {
    ITEM_REGEX
        .find_iter(query)
        .filter_map(|item| {
            let text = item.as_str().replace("\\,", ",");
            if let Some(caps) = KEY_VALUE_REGEX.captures(&text) {
                let label = caps.get(1).map_or("", |m| m.as_str()).trim();
                let value = caps.get(2).map_or("", |m| m.as_str()).trim();
                return Some(VariableOption::new(label, value));
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| VariableOption::same(trimmed))
        })
        .collect()
}
