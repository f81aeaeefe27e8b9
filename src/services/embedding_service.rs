//! Embedding service.
//!
//! Wraps an `EmbeddingProvider` so callers never see an error: any failure
//! becomes the empty vector, which downstream code treats as "no embedding".

use std::sync::Arc;
use tracing::warn;

use crate::domain::models::document::preview;
use crate::domain::ports::EmbeddingProvider;

/// Embedding service that reduces provider failures to the empty sentinel.
#[derive(Clone)]
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingService {
    /// Service over `provider`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Provider name for diagnostics.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Embedding dimension.
    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    /// Embed `text`, or return an empty vector on any failure.
    ///
    /// Empty input, provider errors and vectors with non-finite components
    /// all yield `vec![]`.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if text.trim().is_empty() {
            warn!("Refusing to embed empty text");
            return Vec::new();
        }

        match self.provider.embed(text).await {
            Ok(vector) if vector.iter().all(|x| x.is_finite()) => vector,
            Ok(_) => {
                warn!(
                    provider = self.provider.name(),
                    text = %preview(text, 100),
                    "Embedding contains non-finite values"
                );
                Vec::new()
            }
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    text = %preview(text, 100),
                    error = %e,
                    "Embedding failed"
                );
                Vec::new()
            }
        }
    }
}
