//! Variable reference parser
//!
//! Recognizes the three reference syntaxes with a single shared pattern:
//! `$name`, `[[name]]` / `[[name:format]]` and `${name}` / `${name.path}` /
//! `${name:format}`.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Macro name standing for "every variable in scope".
pub const ALL_VARIABLES_MACRO: &str = "__all_variables";

static VARIABLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$(\w+)|\[\[(\w+?)(?::(\w+))?\]\]|\$\{(\w+)(?:\.([^:^\}]+))?(?::([^\}]+))?\}",
    )
    .expect("valid regex")
});

static VARIABLE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("valid regex"));

/// The syntax a reference was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSyntax {
    /// `$name`
    Sigil,
    /// `[[name]]` or `[[name:format]]`
    Bracket,
    /// `${name}`, `${name.path}` or `${name:format}`
    Brace,
}

/// Represents a parsed variable reference in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    /// The variable name.
    pub name: String,

    /// Field path after a dot (brace syntax only).
    pub field_path: Option<String>,

    /// Format name after a colon.
    pub format: Option<String>,

    /// Syntax used.
    pub syntax: ReferenceSyntax,

    /// Byte range in the original string where this reference appears.
    pub span: Range<usize>,
}

impl VariableReference {
    /// Returns true for reserved macro names (`__from`, `__all_variables`, ...).
    #[must_use]
    pub fn is_macro(&self) -> bool {
        self.name.starts_with("__")
    }
}

/// Parses a string and extracts all variable references.
///
/// # Examples
///
/// ```
/// use cascade_domain::interpolation::parse_variables;
///
/// let refs = parse_variables("rate($metric[$__interval]) by [[group:csv]]");
/// assert_eq!(refs.len(), 3);
/// assert_eq!(refs[0].name, "metric");
/// assert_eq!(refs[2].format.as_deref(), Some("csv"));
/// ```
#[must_use]
pub fn parse_variables(input: &str) -> Vec<VariableReference> {
    VARIABLE_REGEX
        .captures_iter(input)
        .filter_map(|caps| {
            let span = caps.get(0)?.range();
            let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

            let (name, field_path, format, syntax) = if let Some(name) = group(1) {
                (name, None, None, ReferenceSyntax::Sigil)
            } else if let Some(name) = group(2) {
                (name, None, group(3), ReferenceSyntax::Bracket)
            } else {
                (group(4)?, group(5), group(6), ReferenceSyntax::Brace)
            };

            Some(VariableReference {
                name,
                field_path,
                format,
                syntax,
                span,
            })
        })
        .collect()
}

/// Validates a variable name: word characters only, at least one.
#[must_use]
pub fn is_valid_variable_name(name: &str) -> bool {
    VARIABLE_NAME_REGEX.is_match(name)
}

/// Returns true if the input string contains any variable references.
#[must_use]
pub fn has_variables(input: &str) -> bool {
    VARIABLE_REGEX.is_match(input)
}

/// Extracts just the variable names from the input without full parsing info.
#[must_use]
pub fn extract_variable_names(input: &str) -> Vec<String> {
    parse_variables(input)
        .into_iter()
        .map(|r| r.name)
        .collect()
}

/// Replaces every reference for which `lookup` returns a value.
///
/// References the lookup cannot resolve are kept verbatim.
pub fn interpolate<F>(input: &str, mut lookup: F) -> String
where
    F: FnMut(&VariableReference) -> Option<String>,
{
    let references = parse_variables(input);
    if references.is_empty() {
        return input.to_string();
    }

    let mut result = String::with_capacity(input.len());
    let mut last_end = 0;

    for reference in &references {
        result.push_str(&input[last_end..reference.span.start]);
        match lookup(reference) {
            Some(value) => result.push_str(&value),
            None => result.push_str(&input[reference.span.clone()]),
        }
        last_end = reference.span.end;
    }

    result.push_str(&input[last_end..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sigil() {
        let refs = parse_variables("$name");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "name");
        assert_eq!(refs[0].syntax, ReferenceSyntax::Sigil);
        assert_eq!(refs[0].span, 0..5);
    }

    #[test]
    fn test_parse_bracket_with_format() {
        let refs = parse_variables("[[host:csv]]");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "host");
        assert_eq!(refs[0].format.as_deref(), Some("csv"));
        assert_eq!(refs[0].syntax, ReferenceSyntax::Bracket);
    }

    #[test]
    fn test_parse_brace_forms() {
        let refs = parse_variables("${a} ${b.meta.id} ${c:pipe}");
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].name, "a");
        assert_eq!(refs[1].field_path.as_deref(), Some("meta.id"));
        assert_eq!(refs[2].format.as_deref(), Some("pipe"));
        assert!(refs.iter().all(|r| r.syntax == ReferenceSyntax::Brace));
    }

    #[test]
    fn test_parse_multiple_variables() {
        let refs = parse_variables("A.$A.$B.*");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "A");
        assert_eq!(refs[1].name, "B");
    }

    #[test]
    fn test_no_variables() {
        assert!(parse_variables("Hello, World!").is_empty());
        assert!(parse_variables("costs $ 5").is_empty());
    }

    #[test]
    fn test_macro_detection() {
        let refs = parse_variables("${__from} $env");
        assert!(refs[0].is_macro());
        assert!(!refs[1].is_macro());
    }

    #[test]
    fn test_valid_variable_names() {
        assert!(is_valid_variable_name("name"));
        assert!(is_valid_variable_name("my_var2"));
        assert!(is_valid_variable_name("__all_variables"));
        assert!(!is_valid_variable_name(""));
        assert!(!is_valid_variable_name("var-name"));
        assert!(!is_valid_variable_name("a b"));
    }

    #[test]
    fn test_has_variables() {
        assert!(has_variables("$a"));
        assert!(has_variables("[[a]]"));
        assert!(has_variables("x ${a} y"));
        assert!(!has_variables("plain"));
    }

    #[test]
    fn test_extract_variable_names() {
        let names = extract_variable_names("$a and [[b]] and ${c}");
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_interpolate_keeps_unresolved() {
        let out = interpolate("A.$A.$missing.*", |r| (r.name == "A").then(|| "AA".to_string()));
        assert_eq!(out, "A.AA.$missing.*");
    }

    #[test]
    fn test_span_positions() {
        let input = "Hello ${name}, welcome!";
        let refs = parse_variables(input);
        assert_eq!(&input[refs[0].span.clone()], "${name}");
    }
}
