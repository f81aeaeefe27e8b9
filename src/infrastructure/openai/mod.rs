//! OpenAI REST plumbing shared by the chat and embedding adapters.

pub mod client;
pub mod errors;
pub mod policy;

pub use client::OpenAiClient;
pub use errors::OpenAiError;
pub use policy::RequestPolicy;
