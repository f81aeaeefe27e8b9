//! Implementation of the `faqbot ingest` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::context::AppContext;
use crate::cli::output::{create_spinner, output, CommandOutput, ProgressBarExt};
use crate::domain::models::IngestionReport;
use crate::services::{load_faq_file, FaqTextSplitter, IngestionService};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// FAQ corpus file: a JSON object of question -> answer, or an array of {question, answer}
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct IngestOutput {
    pub file: PathBuf,
    pub collection: String,
    pub entries: usize,
    pub stored_documents: usize,
    pub report: IngestionReport,
}

impl CommandOutput for IngestOutput {
    fn to_human(&self) -> String {
        let r = &self.report;
        let mut lines = vec![
            format!("Ingested {} into '{}'", self.file.display(), self.collection),
            format!("  FAQ entries:        {}", self.entries),
            format!("  Resumed from:       {}", r.resumed_from),
            format!("  Already stored:     {}", r.skipped_existing),
            format!("  Committed:          {}", r.committed),
            format!("  Rejected embeddings: {}", r.rejected_embeddings),
            format!("  Checkpoint:         {}", r.last_index),
            format!("  Documents in store: {}", self.stored_documents),
        ];

        if !r.is_complete() {
            lines.push(format!(
                "\n{} batch(es) failed to commit. Run the command again to resume.",
                r.failed_batches
            ));
        }

        lines.join("\n")
    }
}

pub async fn execute(args: IngestArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let entries = load_faq_file(&args.file)
        .await
        .with_context(|| format!("Failed to load FAQ corpus from {}", args.file.display()))?;

    let index = ctx.open_index(ctx.openai_embeddings()?).await?;
    let splitter = FaqTextSplitter::new(ctx.config.ingestion.chunking.clone())
        .context("Invalid chunking configuration")?;
    let service = IngestionService::new(index.clone(), splitter);

    let spinner = create_spinner(format!("Embedding {} FAQ entries", entries.len()), json_mode);
    let report = match service.ingest_entries(&entries).await {
        Ok(report) => report,
        Err(e) => {
            spinner.finish_error("Ingestion failed");
            return Err(e).context("Ingestion failed");
        }
    };

    if report.is_complete() {
        spinner.finish_success(format!("{} chunks committed", report.committed));
    } else {
        spinner.finish_warning(format!("{} batch(es) failed", report.failed_batches));
    }

    let stored_documents = index.count().await.context("Failed to count stored documents")?;

    output(
        &IngestOutput {
            file: args.file,
            collection: index.collection().to_string(),
            entries: entries.len(),
            stored_documents,
            report,
        },
        json_mode,
    );
    Ok(())
}
