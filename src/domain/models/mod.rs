//! Domain models for the FAQ pipeline.

pub mod chain;
pub mod chunking;
pub mod config;
pub mod document;
pub mod faq;
pub mod labels;

pub use chain::{ChainAnswer, ChainOutcome, DisambiguationStage, PendingDisambiguation};
pub use chunking::{ChunkingConfig, SplitCorpus};
pub use config::{
    ChainConfig, Config, ConversationConfig, IngestionConfig, LoggingConfig, OpenAiConfig,
    PromptOverrides, RetrievalConfig, StoreConfig,
};
pub use document::{
    score_from_distance, DistanceMetric, Document, DocumentMetadata, EmbeddedDocument,
    IngestionProgress, IngestionReport, Neighbor, RetrievedResult,
};
pub use faq::FaqEntry;
pub use labels::{DisambiguationDetection, LabelResolution, OPTIONS_MARKER};
