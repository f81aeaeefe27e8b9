//! Text chunking domain models
//!
//! Models for splitting FAQ entries into chunks for embedding.
//! Sizes are measured in characters, not bytes, so Hangul text is
//! never split inside a code point.

use serde::{Deserialize, Serialize};

use super::document::DocumentMetadata;

/// Configuration for FAQ chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum size of each chunk in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters carried over from the end of one chunk into the next
    #[serde(default)]
    pub chunk_overlap: usize,

    /// Separator used to split a combined entry (paragraph break by default)
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_chunk_size() -> usize {
    256
}

fn default_separator() -> String {
    "\n\n".to_string()
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: 0,
            separator: default_separator(),
        }
    }
}

impl ChunkingConfig {
    /// Validate the chunking configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err("chunk_overlap must be less than chunk_size".to_string());
        }

        if self.separator.is_empty() {
            return Err("separator cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Output of splitting a corpus: parallel text and metadata sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitCorpus {
    /// Chunk texts.
    pub documents: Vec<String>,
    /// Metadata per chunk, parallel to `documents`.
    pub metadatas: Vec<DocumentMetadata>,
}

impl SplitCorpus {
    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// `true` when there are no chunks.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Sequential ids `"0".."n-1"`, stable across runs for the same corpus.
    pub fn sequential_ids(&self) -> Vec<String> {
        (0..self.documents.len()).map(|i| i.to_string()).collect()
    }
}
