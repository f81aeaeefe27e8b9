//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::chat::ChatArgs;
use super::commands::export::ExportArgs;
use super::commands::ingest::IngestArgs;
use super::commands::search::SearchArgs;

#[derive(Parser)]
#[command(name = "faqbot")]
#[command(about = "faqbot - retrieval-augmented FAQ chatbot", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .faqbot/config.yaml and .faqbot/local.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load, split, embed and store a FAQ corpus (resumes an interrupted run)
    Ingest(IngestArgs),

    /// Interactive question answering over the stored FAQ
    Chat(ChatArgs),

    /// Similarity search against the stored FAQ
    Search(SearchArgs),

    /// Print every stored document
    Export(ExportArgs),
}
