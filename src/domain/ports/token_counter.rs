//! Token counting port used to budget conversation history.

/// Counts the tokens a text costs against the history budget.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens `text` encodes to.
    fn count(&self, text: &str) -> usize;
}
