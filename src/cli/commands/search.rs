//! Implementation of the `faqbot search` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{format_results_table, output, CommandOutput};
use crate::domain::models::RetrievedResult;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text
    pub query: String,

    /// Number of results (defaults to retrieval.k)
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Minimum similarity score (defaults to retrieval.threshold)
    #[arg(short, long)]
    pub threshold: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub threshold: f32,
    pub results: Vec<RetrievedResult>,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        if self.results.is_empty() {
            return format!("No documents scored at least {:.2}.", self.threshold);
        }
        format_results_table(&self.results)
    }
}

pub async fn execute(args: SearchArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let k = args.k.unwrap_or(ctx.config.retrieval.k);
    let threshold = args.threshold.unwrap_or(ctx.config.retrieval.threshold);
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("--threshold must be between 0.0 and 1.0, got {threshold}");
    }

    let index = ctx.open_index(ctx.openai_embeddings()?).await?;
    let results = index.query(&args.query, k, threshold).await;

    output(
        &SearchOutput {
            query: args.query,
            threshold,
            results,
        },
        json_mode,
    );
    Ok(())
}
