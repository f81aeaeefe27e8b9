//! Answer chain outcomes
//!
//! A query either runs to completion, escapes as out-of-domain, degrades to
//! the fallback message, or suspends waiting for the user to pick between
//! candidate labels.

use serde::Serialize;

/// Stage of the chain that asked for a human selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisambiguationStage {
    /// Choosing the FAQ category.
    Category,
    /// Choosing the intent within a category.
    Intent,
}

impl std::fmt::Display for DisambiguationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Category => write!(f, "category"),
            Self::Intent => write!(f, "intent"),
        }
    }
}

/// A suspended chain. Hand it back to `QaOrchestrator::resume` with the
/// user's selection, or to `QaOrchestrator::abandon`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingDisambiguation {
    /// Stage that suspended.
    pub stage: DisambiguationStage,
    /// Original user query.
    pub query: String,
    /// Retrieved context carried across the pause
    pub documents: Option<Vec<String>>,
    /// Resolved category when suspended at the intent stage
    pub category: Option<String>,
    /// Raw model text listing the options
    pub prompt_text: String,
    /// Candidate labels, in the order offered.
    pub options: Vec<String>,
}

/// Completed answer with the labels that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainAnswer {
    /// Resolved category label.
    pub category: String,
    /// Resolved intent label.
    pub intent: String,
    /// Model answer.
    pub answer: String,
}

impl ChainAnswer {
    /// `Category: <c>\nIntent: <i>\n\n<answer>`
    pub fn formatted(&self) -> String {
        format!(
            "Category: {}\nIntent: {}\n\n{}",
            self.category, self.intent, self.answer
        )
    }
}

/// Result of running (or resuming) the chain for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChainOutcome {
    /// All three stages finished.
    Completed(ChainAnswer),
    /// The query falls outside the FAQ.
    OutOfDomain { message: String },
    /// Suspended until the user picks a label.
    AwaitingSelection(PendingDisambiguation),
    /// A step failed and the fallback message was used.
    Degraded { message: String },
}

impl ChainOutcome {
    /// Text to show the user, if this outcome is final.
    pub fn final_text(&self) -> Option<String> {
        match self {
            Self::Completed(answer) => Some(answer.formatted()),
            Self::OutOfDomain { message } | Self::Degraded { message } => Some(message.clone()),
            Self::AwaitingSelection(_) => None,
        }
    }

    /// `false` only while awaiting a selection.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::AwaitingSelection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_answer() {
        let answer = ChainAnswer {
            category: "환불".to_string(),
            intent: "환불 절차 문의".to_string(),
            answer: "7일 이내 신청하세요.".to_string(),
        };
        assert_eq!(
            answer.formatted(),
            "Category: 환불\nIntent: 환불 절차 문의\n\n7일 이내 신청하세요."
        );
    }

    #[test]
    fn test_final_text() {
        let outcome = ChainOutcome::OutOfDomain {
            message: "sorry".to_string(),
        };
        assert_eq!(outcome.final_text().as_deref(), Some("sorry"));
        assert!(outcome.is_final());
    }
}
