//! Variable references: extraction, substitution and formatting.

mod format;
mod parser;

pub use format::{VariableFormat, format_variable};
pub use parser::{
    ALL_VARIABLES_MACRO, ReferenceSyntax, VariableReference, extract_variable_names,
    has_variables, interpolate, is_valid_variable_name, parse_variables,
};
