//! CLI command implementations.

pub mod chat;
pub mod export;
pub mod ingest;
pub mod search;
