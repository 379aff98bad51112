//! Shared application state

use crate::config::{Config, QuerierSettings};
use crate::services::Querier;
use crate::Result;
use lensing_index::{
    load_documents, FieldAliases, IndexEngine, MemoryIndex, Schema, SimpleTextParser,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub querier: Arc<Querier>,
}

impl AppState {
    /// Load the corpus named in the configuration and build the querier.
    pub async fn new(config: Config) -> Result<Self> {
        let querier = open_querier(&config).await?;
        Ok(Self::from_parts(config, querier))
    }

    pub fn from_parts(config: Config, querier: Querier) -> Self {
        Self {
            config: Arc::new(config),
            querier: Arc::new(querier),
        }
    }
}

/// Load the configured corpus into a [`MemoryIndex`] and build a querier
/// over it.
pub async fn open_querier(config: &Config) -> Result<Querier> {
    let path = config.index.path.clone();
    let documents = tokio::task::spawn_blocking(move || load_documents(path))
        .await
        .map_err(|e| crate::Error::Internal(format!("corpus loader panicked: {e}")))??;

    let schema = Schema::new(config.index.text_fields.iter().cloned());
    let index = MemoryIndex::new(documents, schema.clone());
    Ok(build_querier(config.querier.clone(), Arc::new(index), schema))
}

/// A querier over `engine` whose free-text parser shares the configured
/// aliases and the engine's text fields.
pub fn build_querier(
    settings: QuerierSettings,
    engine: Arc<dyn IndexEngine>,
    schema: Schema,
) -> Querier {
    let aliases = FieldAliases::new(settings.alias_map());
    let parser = SimpleTextParser::new(
        aliases.clone(),
        schema,
        settings.fields_for_text_searches.clone(),
    );
    Querier::new(settings, engine, aliases, Arc::new(parser))
}
