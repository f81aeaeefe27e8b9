//! Application services for the FAQ pipeline.

pub mod conversation;
pub mod embedding_service;
pub mod faq_loader;
pub mod ingestion;
pub mod prompts;
pub mod qa_chain;
pub mod retriever;
pub mod splitter;
pub mod vector_index;

pub use conversation::ConversationState;
pub use embedding_service::EmbeddingService;
pub use faq_loader::{clean_text, load_faq_file, parse_faq_json};
pub use ingestion::IngestionService;
pub use prompts::{PromptSet, PromptTemplate};
pub use qa_chain::{ChainSettings, QaOrchestrator};
pub use retriever::Retriever;
pub use splitter::FaqTextSplitter;
pub use vector_index::VectorIndex;
