//! Infrastructure layer module
//!
//! Configuration loading, logging setup and the shared OpenAI HTTP client.
//! Adapters in `crate::adapters` build on these to satisfy the domain ports.

pub mod config;
pub mod logging;
pub mod openai;
