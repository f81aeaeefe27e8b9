//! Per-session conversation history.
//!
//! History is an ordered list of tagged lines. Rendering drops repeated
//! lines, keeping the first occurrence, and truncation keeps the newest
//! lines that fit a token budget.

use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::TokenCounter;

/// Prefix of a recorded question line.
pub const QUESTION_TAG: &str = "question: ";
/// Prefix of a recorded answer line.
pub const ANSWER_TAG: &str = "answer: ";
/// Header line preceding the retrieved documents of a turn.
pub const DOCUMENTS_TAG: &str = "retrieved-documents:";

/// Conversation state for one chat session.
#[derive(Debug, Clone)]
pub struct ConversationState {
    session_id: Uuid,
    lines: Vec<String>,
}

impl ConversationState {
    /// Empty history with a fresh session id.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            lines: Vec::new(),
        }
    }

    /// Identifier used in log spans.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Raw history lines, oldest first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `true` before the first completed turn.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Record one completed turn.
    pub fn append(&mut self, query: &str, answer: &str, retrieved_documents: Option<&[String]>) {
        self.push_text(&format!("{QUESTION_TAG}{query}"));
        self.push_text(&format!("{ANSWER_TAG}{answer}"));

        if let Some(docs) = retrieved_documents.filter(|d| !d.is_empty()) {
            let joined = dedup_ordered(docs.iter().map(String::as_str)).join("\n");
            self.push_text(&format!("{DOCUMENTS_TAG}\n{joined}"));
        }
    }

    fn push_text(&mut self, text: &str) {
        self.lines.extend(text.split('\n').map(str::to_string));
    }

    /// Unique lines in first-seen order, joined by `\n`.
    pub fn render(&self) -> String {
        render_lines(&self.lines)
    }

    /// Tokens of the rendered history.
    pub fn token_count(&self, counter: &dyn TokenCounter) -> usize {
        counter.count(&self.render())
    }

    /// Drop the oldest lines until the rendered history fits `max_tokens`.
    ///
    /// Keeps the longest suffix of lines whose rendering fits. When even the
    /// newest line alone is over budget, exactly that line is kept.
    pub fn truncate(&mut self, max_tokens: usize, counter: &dyn TokenCounter) {
        if self.lines.is_empty() || counter.count(&self.render()) <= max_tokens {
            return;
        }

        let newest = self.lines.len() - 1;
        let mut keep_from = newest;

        while keep_from > 0 && counter.count(&render_lines(&self.lines[keep_from - 1..])) <= max_tokens {
            keep_from -= 1;
        }

        let dropped = keep_from;
        self.lines.drain(..keep_from);

        debug!(
            session_id = %self.session_id,
            dropped,
            kept = self.lines.len(),
            max_tokens,
            "Truncated conversation history"
        );
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

fn render_lines(lines: &[String]) -> String {
    dedup_ordered(lines.iter().map(String::as_str)).join("\n")
}

/// Remove repeated items, keeping the first occurrence of each.
pub fn dedup_ordered<'a, I>(items: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(*item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::HeuristicTokenCounter;

    #[test]
    fn test_append_tags_lines() {
        let mut state = ConversationState::new();
        let docs = vec!["doc a".to_string(), "doc b".to_string(), "doc a".to_string()];
        state.append("배송은 얼마나 걸리나요?", "2~3일 걸립니다.", Some(&docs));

        assert_eq!(
            state.lines(),
            &[
                "question: 배송은 얼마나 걸리나요?",
                "answer: 2~3일 걸립니다.",
                "retrieved-documents:",
                "doc a",
                "doc b",
            ]
        );
    }

    #[test]
    fn test_append_without_documents() {
        let mut state = ConversationState::new();
        state.append("q", "a", None);
        state.append("q2", "a2", Some(&[]));
        assert_eq!(state.lines().len(), 4);
    }

    #[test]
    fn test_render_keeps_first_occurrence_order() {
        let mut state = ConversationState::new();
        let docs = vec!["shared doc".to_string()];
        state.append("first", "one", Some(&docs));
        state.append("second", "two", Some(&docs));

        assert_eq!(
            state.render(),
            "question: first\nanswer: one\nretrieved-documents:\nshared doc\nquestion: second\nanswer: two"
        );
    }

    #[test]
    fn test_truncate_keeps_newest_lines() {
        let counter = HeuristicTokenCounter;
        let mut state = ConversationState::new();
        for i in 0..20 {
            state.append(&format!("question number {i}"), &format!("answer number {i}"), None);
        }

        state.truncate(20, &counter);

        assert!(state.token_count(&counter) <= 20);
        assert_eq!(state.lines().last().map(String::as_str), Some("answer: answer number 19"));
    }

    #[test]
    fn test_truncate_within_budget_is_noop() {
        let counter = HeuristicTokenCounter;
        let mut state = ConversationState::new();
        state.append("q", "a", None);
        let before = state.lines().to_vec();

        state.truncate(2048, &counter);
        assert_eq!(state.lines(), before.as_slice());
    }

    #[test]
    fn test_oversized_newest_line_is_kept_alone() {
        let counter = HeuristicTokenCounter;
        let mut state = ConversationState::new();
        state.append("short", &"long answer ".repeat(50), None);

        state.truncate(5, &counter);

        assert_eq!(state.lines().len(), 1);
        assert!(state.lines()[0].starts_with(ANSWER_TAG));
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(ConversationState::new().session_id(), ConversationState::new().session_id());
    }
}
