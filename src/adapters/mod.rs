//! Infrastructure adapters for external systems.

pub mod embeddings;
pub mod llm;
pub mod mock;
pub mod progress_file;
pub mod sqlite;
pub mod tokenizer;

pub use progress_file::JsonProgressStore;
pub use tokenizer::{HeuristicTokenCounter, TiktokenCounter};
