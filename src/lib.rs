//! faqbot - retrieval-augmented FAQ chatbot
//!
//! FAQ entries are split, embedded and stored in a SQLite-backed vector
//! index. Each user query runs through a staged chain: retrieve, classify
//! the category, resolve the intent (pausing for the user when the model
//! offers several options), answer, and record the turn in a token-bounded
//! conversation history.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Service Layer** (`services`): ingestion, retrieval and the answer chain
//! - **Adapters** (`adapters`): SQLite store, OpenAI clients, tokenizers, mocks
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, HTTP
//! - **CLI Layer** (`cli`): `ingest`, `chat`, `search` and `export`

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{ChainOutcome, Config, FaqEntry, IngestionReport, RetrievedResult};
pub use domain::ports::{EmbeddingProvider, LanguageModel, ProgressStore, TokenCounter, VectorStoreBackend};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ConversationState, IngestionService, QaOrchestrator, Retriever, VectorIndex};
