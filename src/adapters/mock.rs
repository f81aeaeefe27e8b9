//! Mock providers for testing.
//!
//! `MockEmbeddingProvider` is deterministic and offline: it hashes character
//! unigrams and bigrams into a fixed number of buckets and L2-normalizes the
//! result, so texts sharing characters land close together.
//! `MockLanguageModel` replays scripted responses and records every call.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{ChatMessage, EmbeddingProvider, LanguageModel};

/// Default bucket count for the mock embedding.
pub const MOCK_EMBEDDING_DIMENSION: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Deterministic character n-gram embedding.
pub struct MockEmbeddingProvider {
    dimension: usize,
    failing_texts: Arc<RwLock<HashSet<String>>>,
    overrides: Arc<RwLock<HashMap<String, Vec<f32>>>>,
    calls: Arc<RwLock<usize>>,
}

impl MockEmbeddingProvider {
    /// Provider with `MOCK_EMBEDDING_DIMENSION` buckets.
    pub fn new() -> Self {
        Self::with_dimension(MOCK_EMBEDDING_DIMENSION)
    }

    /// Provider with `dimension` buckets (at least one).
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            failing_texts: Arc::new(RwLock::new(HashSet::new())),
            overrides: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Make `embed` fail for exactly this text.
    pub async fn fail_on(&self, text: impl Into<String>) {
        self.failing_texts.write().await.insert(text.into());
    }

    /// Return `vector` verbatim for exactly this text.
    pub async fn set_vector(&self, text: impl Into<String>, vector: Vec<f32>) {
        self.overrides.write().await.insert(text.into(), vector);
    }

    /// Number of `embed` calls so far.
    /// Number of `generate` calls so far.
    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }

    /// The embedding without any overrides or failures applied.
    pub fn hashed_embedding(&self, text: &str) -> Option<Vec<f32>> {
        let chars: Vec<String> = text
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .map(String::from)
            .collect();

        if chars.is_empty() {
            return None;
        }

        let mut vector = vec![0.0_f32; self.dimension];
        let buckets = self.dimension as u64;

        for unigram in &chars {
            vector[(fnv1a(unigram) % buckets) as usize] += 1.0;
        }
        for pair in chars.windows(2) {
            let bigram = format!("{}{}", pair[0], pair[1]);
            vector[(fnv1a(&bigram) % buckets) as usize] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        for x in &mut vector {
            *x /= norm;
        }
        Some(vector)
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        *self.calls.write().await += 1;

        if self.failing_texts.read().await.contains(text) {
            return Err(DomainError::ExecutionFailed(format!(
                "mock embedding failure for {text:?}"
            )));
        }

        if let Some(vector) = self.overrides.read().await.get(text) {
            return Ok(vector.clone());
        }

        self.hashed_embedding(text).ok_or_else(|| {
            DomainError::ValidationFailed("text has no alphanumeric characters".to_string())
        })
    }
}

/// Scripted reply for `MockLanguageModel`.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Successful completion text.
    Text(String),
    /// Provider error with this message.
    Failure(String),
}

impl MockReply {
    /// Reply with `output`.
    pub fn text(output: impl Into<String>) -> Self {
        Self::Text(output.into())
    }

    /// Fail with `error`.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure(error.into())
    }
}

/// Language model that replays a queue of replies in order.
///
/// Once the queue is empty every further call fails, which makes
/// unexpected calls visible in tests.
pub struct MockLanguageModel {
    replies: Arc<RwLock<VecDeque<MockReply>>>,
    calls: Arc<RwLock<Vec<Vec<ChatMessage>>>>,
}

impl MockLanguageModel {
    /// Model with an empty queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(RwLock::new(VecDeque::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Model that answers with these texts, one per call.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue: VecDeque<MockReply> = texts.into_iter().map(|t| MockReply::Text(t.into())).collect();
        Self {
            replies: Arc::new(RwLock::new(queue)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue one more reply.
    pub async fn push(&self, reply: MockReply) {
        self.replies.write().await.push_back(reply);
    }

    /// Messages of every call so far, in call order.
    pub async fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, messages: &[ChatMessage]) -> DomainResult<String> {
        self.calls.write().await.push(messages.to_vec());

        match self.replies.write().await.pop_front() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Failure(error)) => Err(DomainError::ExecutionFailed(error)),
            None => Err(DomainError::ExecutionFailed(
                "mock language model has no scripted reply".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{score_from_distance, DistanceMetric};

    fn score(provider: &MockEmbeddingProvider, a: &str, b: &str) -> f32 {
        let va = provider.hashed_embedding(a).unwrap();
        let vb = provider.hashed_embedding(b).unwrap();
        score_from_distance(DistanceMetric::L2.distance(&va, &vb))
    }

    #[tokio::test]
    async fn test_embedding_is_deterministic_and_normalized() {
        let provider = MockEmbeddingProvider::new();
        let a = provider.embed("환불 절차").await.unwrap();
        let b = provider.embed("환불 절차").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), MOCK_EMBEDDING_DIMENSION);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_characters_score_higher() {
        let provider = MockEmbeddingProvider::new();
        let doc = "Q: 환불 절차\nA: 환불은 7일 이내...";
        let related = score(&provider, "환불 어떻게 하나요?", doc);
        let unrelated = score(&provider, "오늘 날씨 알려줘", doc);

        assert!(related >= 0.35, "related score {related}");
        assert!(unrelated < 0.35, "unrelated score {unrelated}");
    }

    #[tokio::test]
    async fn test_punctuation_only_text_fails() {
        let provider = MockEmbeddingProvider::new();
        assert!(provider.embed("?!").await.is_err());
    }

    #[tokio::test]
    async fn test_fail_on_and_overrides() {
        let provider = MockEmbeddingProvider::new();
        provider.fail_on("bad").await;
        provider.set_vector("short", vec![1.0]).await;

        assert!(provider.embed("bad").await.is_err());
        assert_eq!(provider.embed("short").await.unwrap(), vec![1.0]);
        assert_eq!(provider.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_language_model_replays_in_order() {
        let model = MockLanguageModel::with_texts(["first", "second"]);
        model.push(MockReply::failure("down")).await;

        let msgs = [ChatMessage::user("q")];
        assert_eq!(model.generate(&msgs).await.unwrap(), "first");
        assert_eq!(model.generate(&msgs).await.unwrap(), "second");
        assert!(model.generate(&msgs).await.is_err());
        assert!(model.generate(&msgs).await.is_err());
        assert_eq!(model.call_count().await, 4);
    }
}
