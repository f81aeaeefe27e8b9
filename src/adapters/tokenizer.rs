//! Token counters for history budgeting.

use tiktoken_rs::CoreBPE;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::TokenCounter;

/// Counts tokens with a tiktoken BPE encoding.
pub struct TiktokenCounter {
    tokenizer: CoreBPE,
}

impl TiktokenCounter {
    /// Load the named encoding (`cl100k_base`, `o200k_base`, `p50k_base`, `r50k_base`).
    pub fn new(encoding: &str) -> DomainResult<Self> {
        let tokenizer = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(DomainError::Configuration(format!(
                    "unknown tokenizer encoding: {other}"
                )))
            }
        }
        .map_err(|e| DomainError::Configuration(format!("failed to load {encoding}: {e}")))?;

        Ok(Self { tokenizer })
    }

    /// The `cl100k_base` encoding used by the chat models.
    pub fn cl100k() -> DomainResult<Self> {
        Self::new("cl100k_base")
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.tokenizer.encode_with_special_tokens(text).len()
    }
}

/// Roughly four characters per token. Used in tests and when no BPE table
/// is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}
