//! OpenAI embedding provider adapter.
//!
//! Calls the `/v1/embeddings` endpoint. Compatible with any
//! OpenAI-compatible embedding API (e.g., Azure OpenAI, local servers).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::OpenAiConfig;
use crate::domain::ports::EmbeddingProvider;
use crate::infrastructure::openai::{OpenAiClient, OpenAiError};

/// OpenAI embedding provider.
pub struct OpenAiEmbeddingProvider {
    client: OpenAiClient,
    model: String,
    dimension: usize,
}

impl OpenAiEmbeddingProvider {
    pub fn new(client: OpenAiClient, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimension,
        }
    }

    pub fn from_config(config: &OpenAiConfig) -> DomainResult<Self> {
        let client = OpenAiClient::from_config(config)?;
        Ok(Self::new(
            client,
            config.embedding_model.clone(),
            config.embedding_dimension,
        ))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        let request = EmbeddingsRequest {
            model: &self.model,
            input: vec![text],
        };

        let response: EmbeddingsResponse = self.client.post_json("embeddings", &request).await?;

        // Sort by index to maintain input order
        let mut data = response.data;
        data.sort_by_key(|d| d.index);

        data.into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| DomainError::from(OpenAiError::EmptyResponse("no embedding data".to_string())))
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::openai::RequestPolicy;

    fn provider_for(server: &mockito::ServerGuard) -> OpenAiEmbeddingProvider {
        let client =
            OpenAiClient::new(&server.url(), "test-key", 5, RequestPolicy::single_attempt()).unwrap();
        OpenAiEmbeddingProvider::new(client, "text-embedding-3-small", 3)
    }

    #[tokio::test]
    async fn test_embed_parses_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/embeddings")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"embedding":[0.1,0.2,0.3],"index":0}]}"#)
            .create_async()
            .await;

        let provider = provider_for(&server);
        let vector = provider.embed("환불 규정").await.unwrap();

        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        assert_eq!(provider.dimension(), 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_surfaces_http_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let provider = provider_for(&server);
        let err = provider.embed("text").await.unwrap_err();
        assert!(matches!(err, DomainError::ExecutionFailed(_)));
    }

    #[tokio::test]
    async fn test_embed_rejects_empty_data() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let provider = provider_for(&server);
        assert!(provider.embed("text").await.is_err());
    }

    #[test]
    fn test_from_config_requires_key() {
        temp_env::with_var_unset("OPENAI_API_KEY", || {
            let config = OpenAiConfig::default();
            let err = OpenAiEmbeddingProvider::from_config(&config).err().unwrap();
            assert!(matches!(err, DomainError::Configuration(_)));
        });
    }
}
