//! Options source adapters.

mod static_options;

pub use static_options::{StaticOptionsSource, static_sources};
