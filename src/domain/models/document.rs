//! Document and retrieval domain models
//!
//! Documents are the stored unit of the vector index: one chunk of a
//! combined FAQ question/answer text plus its embedding.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String metadata attached to a stored document (e.g. originating question).
pub type DocumentMetadata = BTreeMap<String, String>;

/// A chunk of FAQ text as stored in the vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique, stable identifier
    pub id: String,

    /// Chunk text (never empty)
    pub text: String,

    /// Free-form string metadata
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Document without metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: DocumentMetadata::new(),
        }
    }

    /// Replace the metadata.
    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// First 100 characters of the text, for log lines.
    pub fn preview(&self) -> String {
        preview(&self.text, 100)
    }
}

/// A document paired with its embedding, ready to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedDocument {
    /// The stored document.
    pub document: Document,
    /// Its embedding; never empty once validated.
    pub embedding: Vec<f32>,
}

/// A nearest-neighbour candidate as returned by the vector store.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// Stored document id.
    pub id: String,
    /// Stored chunk text.
    pub text: String,
    /// Distance under the store metric; smaller is closer.
    pub distance: f32,
}

/// A query hit that survived the similarity threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedResult {
    /// Matched chunk text.
    pub text: String,
    /// Similarity in (0, 1]; higher is more relevant
    pub score: f32,
}

/// Convert a store distance into a similarity score.
///
/// `1 / (1 + d)` is strictly decreasing in `d` and lies in (0, 1] for any
/// non-negative distance. Negative or NaN distances (which a well-behaved
/// store never returns) are clamped to zero.
pub fn score_from_distance(distance: f32) -> f32 {
    let d = if distance.is_nan() { 0.0 } else { distance.max(0.0) };
    1.0 / (1.0 + d)
}

/// Distance metric used by the vector store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Squared euclidean distance
    #[default]
    L2,
    /// 1 - cosine similarity
    Cosine,
}

impl DistanceMetric {
    /// Name used in config and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L2 => "l2",
            Self::Cosine => "cosine",
        }
    }

    /// Distance between two vectors of equal length.
    ///
    /// Returns `f32::MAX` when the lengths differ (or for cosine, when either
    /// vector has zero magnitude) so such rows sort last.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return f32::MAX;
        }

        match self {
            Self::L2 => a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum(),
            Self::Cosine => {
                let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
                let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

                if mag_a == 0.0 || mag_b == 0.0 {
                    return f32::MAX;
                }

                1.0 - (dot / (mag_a * mag_b))
            }
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Durable ingestion checkpoint.
///
/// `last_index` is the exclusive end of the contiguous prefix of the input
/// sequence that is known to be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IngestionProgress {
    /// Exclusive end of the committed prefix.
    #[serde(default)]
    pub last_index: usize,
}

impl IngestionProgress {
    /// Checkpoint at `last_index`.
    pub fn new(last_index: usize) -> Self {
        Self { last_index }
    }

    /// Advance to `offset`, never moving backwards.
    pub fn advance_to(&mut self, offset: usize) -> bool {
        if offset > self.last_index {
            self.last_index = offset;
            true
        } else {
            false
        }
    }
}

/// Outcome of one `VectorIndex::insert` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    /// Offset the run resumed from
    pub resumed_from: usize,
    /// Items in the suffix that was looked at
    pub attempted: usize,
    /// Items skipped because their id was already committed
    pub skipped_existing: usize,
    /// Items dropped for an empty or inconsistent embedding
    pub rejected_embeddings: usize,
    /// Items written to the store
    pub committed: usize,
    /// Batches that committed successfully
    pub committed_batches: usize,
    /// Batches that failed to commit (retried on the next run)
    pub failed_batches: usize,
    /// Checkpoint after the run
    pub last_index: usize,
}

impl IngestionReport {
    /// `true` when no batch failed.
    pub fn is_complete(&self) -> bool {
        self.failed_batches == 0
    }
}

pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
