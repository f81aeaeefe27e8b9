//! Port trait definitions (Hexagonal Architecture)
//!
//! Interfaces the services depend on and the adapters implement:
//! - EmbeddingProvider: text to vector
//! - LanguageModel: chat completions
//! - VectorStoreBackend: the persistent document collection
//! - ProgressStore: durable ingestion checkpoint
//! - TokenCounter: history budgeting

pub mod embedding;
pub mod language_model;
pub mod null_embedding;
pub mod progress;
pub mod token_counter;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use language_model::{ChatMessage, ChatRole, LanguageModel};
pub use null_embedding::NullEmbeddingProvider;
pub use progress::ProgressStore;
pub use token_counter::TokenCounter;
pub use vector_store::VectorStoreBackend;
