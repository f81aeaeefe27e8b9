//! Corpus ingestion: load, clean, split and index a FAQ file.

use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FaqEntry, IngestionReport};
use crate::services::faq_loader::load_faq_file;
use crate::services::splitter::FaqTextSplitter;
use crate::services::vector_index::VectorIndex;

/// Loads a FAQ corpus and feeds its chunks to the vector index.
pub struct IngestionService {
    index: Arc<VectorIndex>,
    splitter: FaqTextSplitter,
}

impl IngestionService {
    /// Service writing into `index`.
    pub fn new(index: Arc<VectorIndex>, splitter: FaqTextSplitter) -> Self {
        Self { index, splitter }
    }

    /// Split `entries` and insert the chunks with ids `"0".."n-1"`.
    ///
    /// Ids follow chunk order, so re-running on the same corpus resumes
    /// instead of duplicating.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn ingest_entries(&self, entries: &[FaqEntry]) -> DomainResult<IngestionReport> {
        let corpus = self.splitter.split(entries);
        if corpus.is_empty() {
            return Err(DomainError::ValidationFailed(
                "FAQ corpus produced no chunks".to_string(),
            ));
        }

        let ids = corpus.sequential_ids();
        let report = self
            .index
            .insert(&corpus.documents, Some(&corpus.metadatas), Some(&ids))
            .await?;

        info!(
            chunks = corpus.len(),
            committed = report.committed,
            skipped = report.skipped_existing,
            failed_batches = report.failed_batches,
            last_index = report.last_index,
            "Corpus ingested"
        );
        Ok(report)
    }

    /// Load, clean and ingest the FAQ file at `path`.
    pub async fn ingest_file(&self, path: impl AsRef<Path>) -> DomainResult<IngestionReport> {
        let entries = load_faq_file(path).await?;
        self.ingest_entries(&entries).await
    }
}
