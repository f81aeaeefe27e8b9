//! FAQ text splitter.
//!
//! Each entry becomes `Q: <question>\nA: <answer>`, split on the configured
//! separator and packed greedily into chunks of at most `chunk_size`
//! characters. Pieces longer than a chunk are cut into overlapping windows.
//! Every chunk carries the originating question as metadata.

use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChunkingConfig, DocumentMetadata, FaqEntry, SplitCorpus};

/// Metadata key holding the originating question of a chunk.
pub const QUESTION_METADATA_KEY: &str = "question";

/// Splits combined question/answer texts into bounded chunks.
#[derive(Debug, Clone)]
pub struct FaqTextSplitter {
    config: ChunkingConfig,
}

impl FaqTextSplitter {
    /// Fails when `chunk_overlap` is not smaller than `chunk_size`.
    pub fn new(config: ChunkingConfig) -> DomainResult<Self> {
        config.validate().map_err(DomainError::ValidationFailed)?;
        Ok(Self { config })
    }

    /// Active chunking settings.
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split every entry, keeping entry order and chunk order.
    pub fn split(&self, entries: &[FaqEntry]) -> SplitCorpus {
        let mut corpus = SplitCorpus::default();

        for entry in entries {
            let mut metadata = DocumentMetadata::new();
            metadata.insert(QUESTION_METADATA_KEY.to_string(), entry.question.clone());

            for chunk in self.split_text(&entry.combined_text()) {
                corpus.documents.push(chunk);
                corpus.metadatas.push(metadata.clone());
            }
        }

        debug!(entries = entries.len(), chunks = corpus.len(), "Split FAQ corpus");
        corpus
    }

    /// Split one text into chunks of at most `chunk_size` characters.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let size = self.config.chunk_size;
        let separator = self.config.separator.as_str();
        let separator_len = separator.chars().count();

        let pieces: Vec<String> = text
            .split(separator)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .flat_map(|p| self.windows(p))
            .collect();

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for piece in pieces {
            let piece_len = piece.chars().count();

            if current.is_empty() {
                current = piece;
                current_len = piece_len;
            } else if current_len + separator_len + piece_len <= size {
                current.push_str(separator);
                current.push_str(&piece);
                current_len += separator_len + piece_len;
            } else {
                let carried = self.overlap_tail(&current, size.saturating_sub(piece_len + separator_len));
                chunks.push(std::mem::take(&mut current));

                if carried.is_empty() {
                    current = piece;
                    current_len = piece_len;
                } else {
                    current_len = carried.chars().count() + separator_len + piece_len;
                    current = format!("{carried}{separator}{piece}");
                }
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    /// Cut an oversized piece into windows that overlap by `chunk_overlap`.
    fn windows(&self, piece: &str) -> Vec<String> {
        let chars: Vec<char> = piece.chars().collect();
        let size = self.config.chunk_size;

        if chars.len() <= size {
            return vec![piece.to_string()];
        }

        let step = size - self.config.chunk_overlap;
        let mut out = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + size).min(chars.len());
            out.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        out
    }

    /// Last `chunk_overlap` characters of `chunk`, capped at `room`.
    fn overlap_tail(&self, chunk: &str, room: usize) -> String {
        let take = self.config.chunk_overlap.min(room);
        if take == 0 {
            return String::new();
        }

        let chars: Vec<char> = chunk.chars().collect();
        chars[chars.len().saturating_sub(take)..].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> FaqTextSplitter {
        FaqTextSplitter::new(ChunkingConfig {
            chunk_size,
            chunk_overlap,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(FaqTextSplitter::new(ChunkingConfig {
            chunk_size: 0,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_short_entry_is_one_chunk_with_question_metadata() {
        let corpus = splitter(256, 0).split(&[FaqEntry::new("환불 절차", "환불은 7일 이내...")]);

        assert_eq!(corpus.documents, vec!["Q: 환불 절차\nA: 환불은 7일 이내..."]);
        assert_eq!(
            corpus.metadatas[0].get(QUESTION_METADATA_KEY).map(String::as_str),
            Some("환불 절차")
        );
    }

    #[test]
    fn test_paragraphs_are_packed_up_to_chunk_size() {
        let s = splitter(12, 0);
        let chunks = s.split_text("aaaa\n\nbbbb\n\ncccc\n\ndddd");

        assert_eq!(chunks, vec!["aaaa\n\nbbbb", "cccc\n\ndddd"]);
    }

    #[test]
    fn test_long_piece_is_windowed_with_overlap() {
        let s = splitter(10, 3);
        let text = "가".repeat(25);
        let chunks = s.split_text(&text);

        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.len(), 4);
        let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert_eq!(total, 25 + 3 * 3);
    }

    #[test]
    fn test_chunks_never_exceed_size() {
        let s = splitter(20, 5);
        let text = "첫 문단입니다.\n\n두 번째 문단은 조금 더 깁니다 아주 많이.\n\n셋\n\n넷째 문단";
        for chunk in s.split_text(text) {
            assert!(chunk.chars().count() <= 20, "{chunk:?}");
        }
    }

    #[test]
    fn test_chunks_keep_entry_order() {
        let corpus = splitter(256, 0).split(&[FaqEntry::new("q1", "a1"), FaqEntry::new("q2", "a2")]);
        assert_eq!(corpus.len(), 2);
        assert!(corpus.documents[0].starts_with("Q: q1"));
        assert!(corpus.documents[1].starts_with("Q: q2"));
    }
}
