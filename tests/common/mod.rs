//! Common test utilities for integration tests
//!
//! An in-memory vector index over the deterministic mock embedding, a store
//! wrapper that can fail chosen batches, and orchestrator builders.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use faqbot::adapters::mock::{MockEmbeddingProvider, MockLanguageModel};
use faqbot::adapters::sqlite::{create_migrated_test_pool, SqliteVectorStore};
use faqbot::adapters::{HeuristicTokenCounter, JsonProgressStore};
use faqbot::domain::errors::{DomainError, DomainResult};
use faqbot::domain::models::{
    ChainConfig, ChunkingConfig, DistanceMetric, Document, EmbeddedDocument, FaqEntry, Neighbor,
};
use faqbot::domain::ports::VectorStoreBackend;
use faqbot::services::{
    EmbeddingService, FaqTextSplitter, IngestionService, QaOrchestrator, Retriever, VectorIndex,
};

pub const REFUND_QUESTION: &str = "환불 절차";
pub const REFUND_ANSWER: &str = "환불은 7일 이내...";

pub fn refund_entry() -> FaqEntry {
    FaqEntry::new(REFUND_QUESTION, REFUND_ANSWER)
}

pub fn sample_entries() -> Vec<FaqEntry> {
    vec![
        refund_entry(),
        FaqEntry::new("배송 기간", "배송은 주문 후 2~3일 이내에 완료됩니다."),
        FaqEntry::new("상품 등록 방법", "판매자센터에서 상품관리 메뉴를 선택해 상품을 등록합니다."),
        FaqEntry::new("정산 주기", "정산은 구매확정 후 1영업일 뒤에 진행됩니다."),
    ]
}

/// Vector store that refuses to commit any batch containing a chosen id.
pub struct FailingVectorStore {
    inner: SqliteVectorStore,
    fail_ids: Mutex<HashSet<String>>,
}

impl FailingVectorStore {
    pub fn new(inner: SqliteVectorStore) -> Self {
        Self {
            inner,
            fail_ids: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_batches_containing(&self, id: &str) {
        self.fail_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn heal(&self) {
        self.fail_ids.lock().unwrap().clear();
    }

    fn should_fail(&self, batch: &[EmbeddedDocument]) -> bool {
        let fail_ids = self.fail_ids.lock().unwrap();
        batch.iter().any(|d| fail_ids.contains(&d.document.id))
    }
}

#[async_trait]
impl VectorStoreBackend for FailingVectorStore {
    fn collection(&self) -> &str {
        self.inner.collection()
    }

    async fn existing_ids(&self, ids: &[String]) -> DomainResult<HashSet<String>> {
        self.inner.existing_ids(ids).await
    }

    async fn add(&self, batch: &[EmbeddedDocument]) -> DomainResult<()> {
        if self.should_fail(batch) {
            return Err(DomainError::DatabaseError("injected commit failure".to_string()));
        }
        self.inner.add(batch).await
    }

    async fn nearest(&self, embedding: &[f32], n: usize) -> DomainResult<Vec<Neighbor>> {
        self.inner.nearest(embedding, n).await
    }

    async fn all_documents(&self) -> DomainResult<Vec<Document>> {
        self.inner.all_documents().await
    }

    async fn count(&self) -> DomainResult<usize> {
        self.inner.count().await
    }
}

/// A vector index over an in-memory store and a temp checkpoint file.
pub struct TestIndex {
    pub index: Arc<VectorIndex>,
    pub store: Arc<FailingVectorStore>,
    pub embeddings: Arc<MockEmbeddingProvider>,
    pub progress_path: PathBuf,
    pub batch_size: usize,
    _dir: TempDir,
}

impl TestIndex {
    pub async fn new(batch_size: usize) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let pool = create_migrated_test_pool().await.expect("Failed to create test pool");
        let store = Arc::new(FailingVectorStore::new(SqliteVectorStore::new(
            pool,
            "faq_collection",
            DistanceMetric::L2,
        )));
        let embeddings = Arc::new(MockEmbeddingProvider::new());
        let progress_path = dir.path().join("progress.json");

        let index = build_index(&store, &embeddings, &progress_path, batch_size);
        Self {
            index,
            store,
            embeddings,
            progress_path,
            batch_size,
            _dir: dir,
        }
    }

    /// A fresh index over the same store and checkpoint, as after a restart.
    pub fn reopen(&self) -> Arc<VectorIndex> {
        build_index(&self.store, &self.embeddings, &self.progress_path, self.batch_size)
    }

    pub fn ingestion(&self) -> IngestionService {
        IngestionService::new(self.index.clone(), splitter())
    }

    pub async fn seeded(entries: &[FaqEntry]) -> Self {
        let test_index = Self::new(1).await;
        test_index
            .ingestion()
            .ingest_entries(entries)
            .await
            .expect("Failed to seed index");
        test_index
    }
}

fn build_index(
    store: &Arc<FailingVectorStore>,
    embeddings: &Arc<MockEmbeddingProvider>,
    progress_path: &Path,
    batch_size: usize,
) -> Arc<VectorIndex> {
    Arc::new(VectorIndex::new(
        store.clone(),
        Arc::new(JsonProgressStore::new(progress_path)),
        EmbeddingService::new(embeddings.clone()),
        batch_size,
    ))
}

pub fn splitter() -> FaqTextSplitter {
    FaqTextSplitter::new(ChunkingConfig::default()).expect("Default chunking is valid")
}

pub fn orchestrator(
    index: Arc<VectorIndex>,
    model: Arc<MockLanguageModel>,
    threshold: f32,
    chain: &ChainConfig,
) -> QaOrchestrator {
    orchestrator_with_budget(index, model, threshold, chain, 2048)
}

/// Orchestrator whose history is budgeted with `HeuristicTokenCounter`.
pub fn orchestrator_with_budget(
    index: Arc<VectorIndex>,
    model: Arc<MockLanguageModel>,
    threshold: f32,
    chain: &ChainConfig,
    max_history_tokens: usize,
) -> QaOrchestrator {
    QaOrchestrator::from_config(
        Arc::new(Retriever::new(index, threshold)),
        model,
        Arc::new(HeuristicTokenCounter),
        chain,
        max_history_tokens,
    )
}
