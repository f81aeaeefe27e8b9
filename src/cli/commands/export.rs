//! Implementation of the `faqbot export` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{format_documents_table, output, CommandOutput};
use crate::domain::models::Document;

#[derive(Args, Debug)]
pub struct ExportArgs {}

#[derive(Debug, Serialize)]
pub struct ExportOutput {
    pub collection: String,
    pub documents: Vec<Document>,
}

impl CommandOutput for ExportOutput {
    fn to_human(&self) -> String {
        if self.documents.is_empty() {
            return format!("Collection '{}' is empty.", self.collection);
        }

        format!(
            "{}\n\n{} document(s) in '{}'",
            format_documents_table(&self.documents),
            self.documents.len(),
            self.collection
        )
    }
}

pub async fn execute(_args: ExportArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let index = ctx.open_index_readonly().await?;
    let documents = index.export().await.context("Failed to read stored documents")?;

    output(
        &ExportOutput {
            collection: index.collection().to_string(),
            documents,
        },
        json_mode,
    );
    Ok(())
}
