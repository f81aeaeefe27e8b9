//! Wiring shared by the CLI commands.
//!
//! Loads configuration, opens the vector store and assembles the services
//! each subcommand needs.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::adapters::embeddings::OpenAiEmbeddingProvider;
use crate::adapters::sqlite::{initialize_database, SqliteVectorStore};
use crate::adapters::JsonProgressStore;
use crate::domain::models::Config;
use crate::domain::ports::{EmbeddingProvider, NullEmbeddingProvider};
use crate::infrastructure::config::ConfigLoader;
use crate::services::{EmbeddingService, VectorIndex};

/// Load the layered configuration, or a single file when `--config` is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Loaded configuration plus factories for the runtime components.
pub struct AppContext {
    pub config: Config,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Embedding provider backed by the OpenAI API. Fails without an API key.
    pub fn openai_embeddings(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let provider = OpenAiEmbeddingProvider::from_config(&self.config.openai)
            .context("Failed to configure the OpenAI embedding provider")?;
        Ok(Arc::new(provider))
    }

    /// Open the configured collection with the given embedding provider.
    pub async fn open_index(&self, provider: Arc<dyn EmbeddingProvider>) -> Result<Arc<VectorIndex>> {
        let store_config = &self.config.store;
        let database_url = store_config.database_url();

        let pool = initialize_database(&database_url)
            .await
            .with_context(|| format!("Failed to open vector store at {}", store_config.database_path))?;

        let store = SqliteVectorStore::new(pool, store_config.collection.clone(), store_config.distance);
        let progress = JsonProgressStore::new(&store_config.progress_file);

        Ok(Arc::new(VectorIndex::new(
            Arc::new(store),
            Arc::new(progress),
            EmbeddingService::new(provider),
            self.config.ingestion.batch_size,
        )))
    }

    /// Open the collection for commands that never embed (export).
    pub async fn open_index_readonly(&self) -> Result<Arc<VectorIndex>> {
        self.open_index(Arc::new(NullEmbeddingProvider::new())).await
    }
}
