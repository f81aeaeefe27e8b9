use serde::{Deserialize, Serialize};

use super::chunking::ChunkingConfig;
use super::document::DistanceMetric;
use super::labels::DisambiguationDetection;

/// Main configuration structure for faqbot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// OpenAI API configuration (chat and embeddings)
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Vector store and checkpoint locations
    #[serde(default)]
    pub store: StoreConfig,

    /// Ingestion batching and chunking
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Retriever policy
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Conversation history budget
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Answer chain behaviour and fixed texts
    #[serde(default)]
    pub chain: ChainConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// OpenAI API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OpenAiConfig {
    /// API key. Falls back to `OPENAI_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for the API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Chat model used for every chain stage
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum completion tokens per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Embedding model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Expected embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional attempts after a failed call (0 = single attempt)
    #[serde(default)]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Client-side request rate limit (unlimited when unset)
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

const fn default_temperature() -> f32 {
    0.125
}

const fn default_max_tokens() -> u32 {
    500
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

const fn default_embedding_dimension() -> usize {
    1536
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    10_000
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            requests_per_second: None,
        }
    }
}

impl OpenAiConfig {
    /// API key from config or the `OPENAI_API_KEY` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    /// Path to the `SQLite` database file holding the collection
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Collection name inside the database
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Distance metric for nearest-neighbour search
    #[serde(default)]
    pub distance: DistanceMetric,

    /// Ingestion checkpoint file
    #[serde(default = "default_progress_file")]
    pub progress_file: String,
}

fn default_database_path() -> String {
    ".faqbot/faq.db".to_string()
}

fn default_collection() -> String {
    "faq_collection".to_string()
}

fn default_progress_file() -> String {
    ".faqbot/progress.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            collection: default_collection(),
            distance: DistanceMetric::default(),
            progress_file: default_progress_file(),
        }
    }
}

impl StoreConfig {
    /// sqlx connection URL for the database path.
    pub fn database_url(&self) -> String {
        if self.database_path.starts_with("sqlite:") {
            self.database_path.clone()
        } else {
            format!("sqlite:{}", self.database_path)
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IngestionConfig {
    /// Items committed per batch; small values give finer resume points
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Chunking parameters
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

const fn default_batch_size() -> usize {
    1
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            chunking: ChunkingConfig::default(),
        }
    }
}

/// Retriever configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrievalConfig {
    /// Default number of results
    #[serde(default = "default_k")]
    pub k: usize,

    /// Minimum similarity score (0.0-1.0)
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

const fn default_k() -> usize {
    3
}

const fn default_threshold() -> f32 {
    0.5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            threshold: default_threshold(),
        }
    }
}

/// Conversation history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConversationConfig {
    /// Token budget for the rendered history
    #[serde(default = "default_max_history_tokens")]
    pub max_history_tokens: usize,

    /// tiktoken encoding used to count history tokens
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

const fn default_max_history_tokens() -> usize {
    2048
}

fn default_encoding() -> String {
    "cl100k_base".to_string()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_history_tokens: default_max_history_tokens(),
            encoding: default_encoding(),
        }
    }
}

/// Answer chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChainConfig {
    /// Documents retrieved per query
    #[serde(default = "default_chain_top_k")]
    pub top_k: usize,

    /// Sentinel returned by the model (and to the user) for off-topic queries
    #[serde(default = "default_out_of_domain_message")]
    pub out_of_domain_message: String,

    /// Polite response when a model call fails
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// Context text used when nothing was retrieved
    #[serde(default = "default_no_context_placeholder")]
    pub no_context_placeholder: String,

    /// REPL greeting
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Answer with the out-of-domain message, without any model call,
    /// when retrieval finds nothing relevant
    #[serde(default = "default_true")]
    pub short_circuit_on_no_match: bool,

    /// Fallback detection for multi-option responses
    #[serde(default)]
    pub disambiguation: DisambiguationDetection,

    /// Seconds to wait for a disambiguation selection (no limit when unset)
    #[serde(default)]
    pub selection_timeout_secs: Option<u64>,

    /// Optional replacements for the built-in prompt templates
    #[serde(default)]
    pub prompts: PromptOverrides,
}

/// Prompt template overrides; `{placeholder}` syntax as the built-ins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PromptOverrides {
    /// Category stage template.
    #[serde(default)]
    pub category: Option<String>,
    /// Intent stage template.
    #[serde(default)]
    pub intent: Option<String>,
    /// Answer stage template.
    #[serde(default)]
    pub answer: Option<String>,
}

const fn default_chain_top_k() -> usize {
    5
}

fn default_out_of_domain_message() -> String {
    "저는 스마트 스토어 FAQ를 위한 챗봇입니다. 스마트 스토어에 대한 질문을 부탁드립니다.".to_string()
}

fn default_fallback_message() -> String {
    "알 수 없는 오류가 발생했습니다.".to_string()
}

fn default_no_context_placeholder() -> String {
    "해당 카테고리에 대한 추가 정보는 제공되지 않습니다.".to_string()
}

fn default_greeting() -> String {
    "안녕하세요! 네이버 스마트스토어에 관한 질문을 도와드리는 챗봇입니다. 궁금하신 내용을 물어보세요."
        .to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            top_k: default_chain_top_k(),
            out_of_domain_message: default_out_of_domain_message(),
            fallback_message: default_fallback_message(),
            no_context_placeholder: default_no_context_placeholder(),
            greeting: default_greeting(),
            short_circuit_on_no_match: true,
            disambiguation: DisambiguationDetection::default(),
            selection_timeout_secs: None,
            prompts: PromptOverrides::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation for file output: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
