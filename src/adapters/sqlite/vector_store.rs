//! SQLite implementation of the VectorStoreBackend.
//!
//! Embeddings are stored as little-endian `f32` BLOBs. Nearest-neighbour
//! search is a brute-force scan of the collection with the distance
//! computed in Rust.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DistanceMetric, Document, DocumentMetadata, EmbeddedDocument, Neighbor};
use crate::domain::ports::VectorStoreBackend;

/// SQLite's default host-parameter limit is 999; stay well below it.
const ID_LOOKUP_CHUNK: usize = 500;

/// `VectorStoreBackend` over one SQLite table, keyed by collection.
///
/// Embeddings are stored as little-endian `f32` BLOBs and searched by
/// brute force.
#[derive(Clone)]
pub struct SqliteVectorStore {
    pool: SqlitePool,
    collection: String,
    metric: DistanceMetric,
}

impl SqliteVectorStore {
    /// Store bound to `collection` in `pool`. The schema must already be migrated.
    pub fn new(pool: SqlitePool, collection: impl Into<String>, metric: DistanceMetric) -> Self {
        Self {
            pool,
            collection: collection.into(),
            metric,
        }
    }

    /// Distance metric used by `nearest`.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }
}

/// Serialize embedding vector to bytes for storage
pub(crate) fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding vector from bytes
pub(crate) fn bytes_to_embedding(bytes: &[u8]) -> DomainResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(DomainError::MalformedEmbedding(format!(
            "stored embedding has {} bytes, not a multiple of 4",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[async_trait]
impl VectorStoreBackend for SqliteVectorStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn existing_ids(&self, ids: &[String]) -> DomainResult<HashSet<String>> {
        let mut found = HashSet::new();

        for chunk in ids.chunks(ID_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT id FROM documents WHERE collection = ? AND id IN ({placeholders})"
            );

            let mut query = sqlx::query(&sql).bind(&self.collection);
            for id in chunk {
                query = query.bind(id);
            }

            for row in query.fetch_all(&self.pool).await? {
                found.insert(row.get::<String, _>("id"));
            }
        }

        Ok(found)
    }

    async fn add(&self, batch: &[EmbeddedDocument]) -> DomainResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        // Start transaction for all inserts
        let mut tx = self.pool.begin().await?;

        for item in batch {
            let metadata_json = serde_json::to_string(&item.document.metadata)?;
            let embedding_bytes = embedding_to_bytes(&item.embedding);

            sqlx::query(
                r#"INSERT INTO documents (collection, id, text, metadata, embedding, dimension)
                   VALUES (?, ?, ?, ?, ?, ?)
                   ON CONFLICT(collection, id) DO UPDATE SET
                       text = excluded.text,
                       metadata = excluded.metadata,
                       embedding = excluded.embedding,
                       dimension = excluded.dimension"#,
            )
            .bind(&self.collection)
            .bind(&item.document.id)
            .bind(&item.document.text)
            .bind(&metadata_json)
            .bind(&embedding_bytes)
            .bind(item.embedding.len() as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(collection = %self.collection, items = batch.len(), "Committed batch");
        Ok(())
    }

    async fn nearest(&self, embedding: &[f32], n: usize) -> DomainResult<Vec<Neighbor>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query("SELECT id, text, embedding FROM documents WHERE collection = ?")
            .bind(&self.collection)
            .fetch_all(&self.pool)
            .await?;

        let mut neighbors = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let bytes: Vec<u8> = row.get("embedding");

            let stored = match bytes_to_embedding(&bytes) {
                Ok(v) => v,
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping unreadable embedding");
                    continue;
                }
            };

            if stored.len() != embedding.len() {
                warn!(
                    id = %id,
                    stored = stored.len(),
                    query = embedding.len(),
                    "Skipping embedding with mismatched dimension"
                );
                continue;
            }

            neighbors.push(Neighbor {
                distance: self.metric.distance(embedding, &stored),
                text: row.get("text"),
                id,
            });
        }

        // Sort by distance (ascending) and take top results
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(n);

        Ok(neighbors)
    }

    async fn all_documents(&self) -> DomainResult<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT id, text, metadata FROM documents WHERE collection = ? ORDER BY rowid",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let metadata_json: String = row.get("metadata");
                let metadata: DocumentMetadata = serde_json::from_str(&metadata_json)?;
                Ok(Document {
                    id: row.get("id"),
                    text: row.get("text"),
                    metadata,
                })
            })
            .collect()
    }

    async fn count(&self) -> DomainResult<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use proptest::prelude::*;

    fn item(id: &str, text: &str, embedding: Vec<f32>) -> EmbeddedDocument {
        EmbeddedDocument {
            document: Document::new(id, text),
            embedding,
        }
    }

    async fn store() -> SqliteVectorStore {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteVectorStore::new(pool, "faq_collection", DistanceMetric::L2)
    }

    #[tokio::test]
    async fn test_add_and_count() {
        let store = store().await;
        store
            .add(&[item("0", "a", vec![1.0, 0.0]), item("1", "b", vec![0.0, 1.0])])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_keeps_single_row_per_id() {
        let store = store().await;
        store.add(&[item("0", "old", vec![1.0, 0.0])]).await.unwrap();
        store.add(&[item("0", "new", vec![0.0, 1.0])]).await.unwrap();

        let docs = store.all_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "new");
    }

    #[tokio::test]
    async fn test_existing_ids_returns_subset() {
        let store = store().await;
        store.add(&[item("0", "a", vec![1.0]), item("2", "c", vec![1.0])]).await.unwrap();

        let ids: Vec<String> = ["0", "1", "2", "3"].iter().map(ToString::to_string).collect();
        let existing = store.existing_ids(&ids).await.unwrap();

        assert_eq!(existing.len(), 2);
        assert!(existing.contains("0"));
        assert!(existing.contains("2"));
    }

    #[tokio::test]
    async fn test_existing_ids_handles_many_ids() {
        let store = store().await;
        store.add(&[item("1200", "x", vec![1.0])]).await.unwrap();

        let ids: Vec<String> = (0..1500).map(|i| i.to_string()).collect();
        let existing = store.existing_ids(&ids).await.unwrap();
        assert_eq!(existing.len(), 1);
    }

    #[tokio::test]
    async fn test_nearest_orders_by_distance() {
        let store = store().await;
        store
            .add(&[
                item("far", "far", vec![10.0, 10.0]),
                item("near", "near", vec![1.0, 1.0]),
                item("mid", "mid", vec![3.0, 3.0]),
            ])
            .await
            .unwrap();

        let hits = store.nearest(&[1.0, 1.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "near");
        assert_eq!(hits[1].id, "mid");
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let pool = create_migrated_test_pool().await.unwrap();
        let a = SqliteVectorStore::new(pool.clone(), "a", DistanceMetric::L2);
        let b = SqliteVectorStore::new(pool, "b", DistanceMetric::L2);

        a.add(&[item("0", "only in a", vec![1.0])]).await.unwrap();

        assert_eq!(a.count().await.unwrap(), 1);
        assert_eq!(b.count().await.unwrap(), 0);
        assert!(b.nearest(&[1.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_round_trips_through_export() {
        let store = store().await;
        let mut metadata = DocumentMetadata::new();
        metadata.insert("question".to_string(), "환불은 어떻게 하나요?".to_string());

        let doc = EmbeddedDocument {
            document: Document::new("0", "Q: 환불").with_metadata(metadata.clone()),
            embedding: vec![0.5],
        };
        store.add(&[doc]).await.unwrap();

        let docs = store.all_documents().await.unwrap();
        assert_eq!(docs[0].metadata, metadata);
    }

    #[test]
    fn test_invalid_bytes_length() {
        assert!(bytes_to_embedding(&[0, 1, 2]).is_err());
    }

    proptest! {
        #[test]
        fn proptest_embedding_bytes_round_trip(v in prop::collection::vec(-1.0e6f32..1.0e6f32, 0..64)) {
            let decoded = bytes_to_embedding(&embedding_to_bytes(&v)).unwrap();
            prop_assert_eq!(decoded, v);
        }
    }
}
