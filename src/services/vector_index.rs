//! Vector index service
//!
//! Incremental, resumable ingestion on top of a `VectorStoreBackend`, plus
//! thresholded similarity queries.
//!
//! Ingestion resumes at the durable checkpoint, skips ids the store already
//! holds, embeds and commits in batches, and only advances the checkpoint
//! after a batch transaction commits. Once a batch fails the checkpoint is
//! frozen for the rest of the run, so it never moves past uncommitted data.

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::document::preview;
use crate::domain::models::{
    score_from_distance, Document, DocumentMetadata, EmbeddedDocument, IngestionProgress,
    IngestionReport, RetrievedResult,
};
use crate::domain::ports::{ProgressStore, VectorStoreBackend};
use crate::services::embedding_service::EmbeddingService;

/// A pending item: absolute offset in the input plus the document to store.
struct Candidate {
    offset: usize,
    document: Document,
}

/// Document index with resumable batched ingestion and similarity search.
///
/// Progress is checkpointed after every committed batch, so an interrupted
/// `insert` picks up where it stopped.
pub struct VectorIndex {
    store: Arc<dyn VectorStoreBackend>,
    progress: Arc<dyn ProgressStore>,
    embeddings: EmbeddingService,
    batch_size: usize,
}

impl VectorIndex {
    /// Index over `store`. A `batch_size` of 0 is treated as 1.
    pub fn new(
        store: Arc<dyn VectorStoreBackend>,
        progress: Arc<dyn ProgressStore>,
        embeddings: EmbeddingService,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            progress,
            embeddings,
            batch_size: batch_size.max(1),
        }
    }

    /// Collection name of the backing store.
    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    /// Insert `documents`, resuming from the stored checkpoint.
    ///
    /// Fails only on invalid input, before anything is written. Embedding and
    /// commit failures are logged and reported in the returned
    /// `IngestionReport`; a failed batch is retried by the next run.
    #[instrument(skip_all, fields(collection = %self.store.collection(), total = documents.len()))]
    pub async fn insert(
        &self,
        documents: &[String],
        metadatas: Option<&[DocumentMetadata]>,
        ids: Option<&[String]>,
    ) -> DomainResult<IngestionReport> {
        validate_input(documents, metadatas, ids)?;

        let mut progress = match self.progress.load().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Unreadable ingestion checkpoint, starting from 0");
                IngestionProgress::default()
            }
        };

        let total = documents.len();
        let start = progress.last_index.min(total);
        let mut report = IngestionReport {
            resumed_from: start,
            attempted: total - start,
            last_index: progress.last_index,
            ..Default::default()
        };

        if start > 0 {
            info!(resumed_from = start, "Resuming ingestion");
        }

        let candidates: Vec<Candidate> = (start..total)
            .map(|offset| {
                let id = ids.map_or_else(|| offset.to_string(), |ids| ids[offset].clone());
                let metadata = metadatas.map(|m| m[offset].clone()).unwrap_or_default();
                Candidate {
                    offset,
                    document: Document::new(id, documents[offset].clone()).with_metadata(metadata),
                }
            })
            .collect();

        let candidate_ids: Vec<String> = candidates.iter().map(|c| c.document.id.clone()).collect();
        let existing = match self.store.existing_ids(&candidate_ids).await {
            Ok(existing) => existing,
            Err(e) => {
                // Upserts keep one row per id, so proceeding is still safe.
                warn!(error = %e, "Existing-id check failed, re-embedding every candidate");
                Default::default()
            }
        };

        let pending: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| !existing.contains(&c.document.id))
            .collect();
        report.skipped_existing = report.attempted - pending.len();

        if report.skipped_existing > 0 {
            debug!(skipped = report.skipped_existing, "Skipping already committed ids");
        }

        let mut frozen = false;

        for batch in pending.chunks(self.batch_size) {
            let (first, last) = match (batch.first(), batch.last()) {
                (Some(first), Some(last)) => (first.offset, last.offset),
                _ => continue,
            };

            let embedded = self.embed_batch(batch, &mut report).await;

            if embedded.is_empty() {
                error!(first, last, "Batch has no valid embeddings, not committing");
                report.failed_batches += 1;
                frozen = true;
                continue;
            }

            if let Err(e) = self.store.add(&embedded).await {
                error!(first, last, error = %e, "Batch commit failed");
                report.failed_batches += 1;
                frozen = true;
                continue;
            }

            report.committed += embedded.len();
            report.committed_batches += 1;
            info!(first, last, items = embedded.len(), "Committed batch");

            if !frozen {
                self.checkpoint(&mut progress, last + 1).await;
            }
        }

        // Everything after the last new item was already committed.
        if !frozen {
            self.checkpoint(&mut progress, total).await;
        }

        report.last_index = progress.last_index;
        info!(
            committed = report.committed,
            skipped = report.skipped_existing,
            rejected = report.rejected_embeddings,
            failed_batches = report.failed_batches,
            last_index = report.last_index,
            "Ingestion finished"
        );
        Ok(report)
    }

    async fn embed_batch(&self, batch: &[Candidate], report: &mut IngestionReport) -> Vec<EmbeddedDocument> {
        let mut embedded: Vec<EmbeddedDocument> = Vec::with_capacity(batch.len());
        // The provider's declared dimension wins; providers that declare 0
        // fall back to the first valid vector of the batch.
        let declared = self.embeddings.dimension();
        let mut dimension: Option<usize> = (declared > 0).then_some(declared);

        for candidate in batch {
            let vector = self.embeddings.embed(&candidate.document.text).await;

            if vector.is_empty() {
                warn!(
                    id = %candidate.document.id,
                    text = %candidate.document.preview(),
                    "Skipping document without embedding"
                );
                report.rejected_embeddings += 1;
                continue;
            }

            let expected = *dimension.get_or_insert(vector.len());
            if vector.len() != expected {
                warn!(
                    id = %candidate.document.id,
                    expected,
                    actual = vector.len(),
                    "Skipping document with inconsistent embedding dimension"
                );
                report.rejected_embeddings += 1;
                continue;
            }

            embedded.push(EmbeddedDocument {
                document: candidate.document.clone(),
                embedding: vector,
            });
        }

        embedded
    }

    async fn checkpoint(&self, progress: &mut IngestionProgress, offset: usize) {
        if !progress.advance_to(offset) {
            return;
        }
        if let Err(e) = self.progress.save(progress).await {
            // The batch is committed; the next run skips it by id.
            error!(offset, error = %e, "Failed to persist ingestion checkpoint");
        }
    }

    /// Nearest documents to `text` with a similarity score of at least
    /// `threshold`, best first. Any failure yields an empty list.
    #[instrument(skip(self), fields(collection = %self.store.collection()))]
    pub async fn query(&self, text: &str, n_results: usize, threshold: f32) -> Vec<RetrievedResult> {
        if n_results == 0 {
            return Vec::new();
        }

        let embedding = self.embeddings.embed(text).await;
        if embedding.is_empty() {
            warn!("Query could not be embedded");
            return Vec::new();
        }

        let neighbors = match self.store.nearest(&embedding, n_results).await {
            Ok(neighbors) => neighbors,
            Err(e) => {
                error!(error = %e, "Similarity search failed");
                return Vec::new();
            }
        };

        neighbors
            .into_iter()
            .filter_map(|n| {
                let score = score_from_distance(n.distance);
                debug!(id = %n.id, score, text = %preview(&n.text, 100), "Candidate");
                (score >= threshold).then_some(RetrievedResult { text: n.text, score })
            })
            .collect()
    }

    /// Every stored text. Failures yield an empty list.
    pub async fn load_all(&self) -> Vec<String> {
        match self.store.all_documents().await {
            Ok(docs) => docs.into_iter().map(|d| d.text).collect(),
            Err(e) => {
                error!(error = %e, "Failed to load documents");
                Vec::new()
            }
        }
    }

    /// Every stored document with its metadata.
    pub async fn export(&self) -> DomainResult<Vec<Document>> {
        self.store.all_documents().await
    }

    /// Number of stored documents.
    pub async fn count(&self) -> DomainResult<usize> {
        self.store.count().await
    }

    /// Current ingestion checkpoint.
    pub async fn progress(&self) -> DomainResult<IngestionProgress> {
        self.progress.load().await
    }
}

fn validate_input(
    documents: &[String],
    metadatas: Option<&[DocumentMetadata]>,
    ids: Option<&[String]>,
) -> DomainResult<()> {
    if documents.is_empty() {
        return Err(DomainError::ValidationFailed("no documents to insert".to_string()));
    }

    if let Some(pos) = documents.iter().position(|d| d.trim().is_empty()) {
        return Err(DomainError::ValidationFailed(format!("document {pos} is empty")));
    }

    if let Some(m) = metadatas {
        if m.len() != documents.len() {
            return Err(DomainError::ValidationFailed(format!(
                "{} metadatas for {} documents",
                m.len(),
                documents.len()
            )));
        }
    }

    if let Some(ids) = ids {
        if ids.len() != documents.len() {
            return Err(DomainError::ValidationFailed(format!(
                "{} ids for {} documents",
                ids.len(),
                documents.len()
            )));
        }
    }

    Ok(())
}
