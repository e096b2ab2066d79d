//! Variables: values, options, kinds and the reconciliation state machine.

mod custom_options;
mod kind;
mod model;
mod option;
mod value;

pub use custom_options::parse_custom_options;
pub use kind::{VariableKind, VariableRefresh};
pub use model::Variable;
pub use option::VariableOption;
pub use value::{ALL_VARIABLE_TEXT, ALL_VARIABLE_VALUE, VariableValue};
