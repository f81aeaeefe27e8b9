//! Vector store port.
//!
//! The persistent collection behind `VectorIndex`: documents with their
//! embeddings, an id membership check, transactional batch upsert and
//! nearest-neighbour search.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Document, EmbeddedDocument, Neighbor};

/// Persistent document collection with nearest-neighbour search.
#[async_trait]
pub trait VectorStoreBackend: Send + Sync {
    /// Name of the collection this backend reads and writes.
    fn collection(&self) -> &str;

    /// Subset of `ids` already present in the collection.
    async fn existing_ids(&self, ids: &[String]) -> DomainResult<HashSet<String>>;

    /// Upsert a batch in one transaction; either every item lands or none.
    async fn add(&self, batch: &[EmbeddedDocument]) -> DomainResult<()>;

    /// Up to `n` stored documents ordered by ascending distance.
    async fn nearest(&self, embedding: &[f32], n: usize) -> DomainResult<Vec<Neighbor>>;

    /// Every stored document in insertion order.
    async fn all_documents(&self) -> DomainResult<Vec<Document>>;

    /// Number of stored documents.
    async fn count(&self) -> DomainResult<usize>;
}
