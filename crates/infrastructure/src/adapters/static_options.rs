//! Options source backed by a fixed table.
//!
//! Scene files declare static sources as a map from query to options. The
//! query received is already interpolated, so a table can answer differently
//! depending on the values of upstream variables.

use std::sync::Arc;

use async_trait::async_trait;
use cascade_application::ports::{OptionsRequest, OptionsSource, SourceError};
use cascade_domain::{SceneDefinition, StaticOptions, VariableOption};
use tracing::trace;

/// Answers queries from a table. Unknown queries yield no options.
#[derive(Debug, Clone, Default)]
pub struct StaticOptionsSource {
    options: StaticOptions,
}

impl StaticOptionsSource {
    /// Creates a source serving the given table.
    #[must_use]
    pub const fn new(options: StaticOptions) -> Self {
        Self { options }
    }

    /// Adds or replaces the options for one query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>, options: Vec<VariableOption>) -> Self {
        self.options.insert(query.into(), options);
        self
    }
}

#[async_trait]
impl OptionsSource for StaticOptionsSource {
    async fn fetch(
        &self,
        request: OptionsRequest,
    ) -> Result<Option<Vec<VariableOption>>, SourceError> {
        let options = self.options.get(&request.query).cloned();
        trace!(
            variable = %request.variable,
            query = %request.query,
            hit = options.is_some(),
            "static options lookup"
        );
        Ok(Some(options.unwrap_or_default()))
    }
}

/// Builds one static source per entry of the scene's `sources` table.
#[must_use]
pub fn static_sources(definition: &SceneDefinition) -> Vec<(String, Arc<dyn OptionsSource>)> {
    definition
        .sources
        .iter()
        .map(|(name, options)| {
            let source: Arc<dyn OptionsSource> =
                Arc::new(StaticOptionsSource::new(options.clone()));
            (name.clone(), source)
        })
        .collect()
}
