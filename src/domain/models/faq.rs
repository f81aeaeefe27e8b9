//! FAQ corpus entries.

use serde::{Deserialize, Serialize};

/// One question/answer pair from the FAQ corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    /// Question text after cleanup.
    pub question: String,
    /// Answer text after cleanup.
    pub answer: String,
}

impl FaqEntry {
    /// Entry from a question and its answer.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Combined text stored in the index: `Q: <question>\nA: <answer>`.
    pub fn combined_text(&self) -> String {
        format!("Q: {}\nA: {}", self.question, self.answer)
    }
}
