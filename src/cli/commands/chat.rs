//! Implementation of the `faqbot chat` command: an interactive REPL over
//! the answer chain.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::info;

use crate::adapters::llm::OpenAiChatModel;
use crate::adapters::TiktokenCounter;
use crate::cli::context::AppContext;
use crate::domain::models::ChainOutcome;
use crate::services::{ConversationState, QaOrchestrator, Retriever};

const EXIT_COMMAND: &str = "exit";

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Seconds to wait for a category/intent selection before dropping the question
    #[arg(long)]
    pub selection_timeout: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ReplOptions {
    pub greeting: String,
    pub selection_timeout: Option<Duration>,
    /// Print each final outcome as one JSON line instead of plain text
    pub json: bool,
}

enum Selection {
    Line(String),
    TimedOut,
    Closed,
}

pub async fn execute(args: ChatArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    let config = &ctx.config;

    let model = OpenAiChatModel::from_config(&config.openai)
        .context("Failed to configure the OpenAI chat model")?;
    let counter = TiktokenCounter::new(&config.conversation.encoding)
        .context("Failed to load the history tokenizer")?;
    let index = ctx.open_index(ctx.openai_embeddings()?).await?;

    let stored = index.count().await.context("Failed to read the vector store")?;
    if stored == 0 {
        anyhow::bail!(
            "Vector store '{}' is empty. Run `faqbot ingest --file <faq.json>` first.",
            index.collection()
        );
    }

    let retriever = Arc::new(Retriever::new(index, config.retrieval.threshold));
    let orchestrator = QaOrchestrator::from_config(
        retriever,
        Arc::new(model),
        Arc::new(counter),
        &config.chain,
        config.conversation.max_history_tokens,
    );

    let options = ReplOptions {
        greeting: config.chain.greeting.clone(),
        selection_timeout: args
            .selection_timeout
            .or(config.chain.selection_timeout_secs)
            .map(Duration::from_secs),
        json: json_mode,
    };

    info!(documents = stored, "Starting chat session");
    let stdin = BufReader::new(tokio::io::stdin());
    run_repl(&orchestrator, stdin, &mut std::io::stdout(), &options).await?;
    Ok(())
}

/// Read queries line by line until `exit` or end of input.
///
/// Returns the session so callers can inspect the history.
pub async fn run_repl<R, W>(
    orchestrator: &QaOrchestrator,
    input: R,
    out: &mut W,
    options: &ReplOptions,
) -> Result<ConversationState>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut session = ConversationState::new();

    writeln!(out, "{}", options.greeting)?;

    loop {
        write!(out, "{} ", style(">").cyan().bold())?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case(EXIT_COMMAND) {
            break;
        }

        let mut outcome = orchestrator.ask(&mut session, query).await;
        let finished = loop {
            match outcome {
                ChainOutcome::AwaitingSelection(pending) => {
                    writeln!(out, "{}", pending.prompt_text)?;
                    write!(out, "{} ", style("select>").yellow())?;
                    out.flush()?;

                    match read_selection(&mut lines, options.selection_timeout).await? {
                        Selection::Line(selection) => {
                            outcome = orchestrator.resume(&mut session, pending, &selection).await;
                        }
                        Selection::TimedOut => {
                            orchestrator.abandon(pending);
                            writeln!(out, "\nNo selection received; the question was dropped.")?;
                            break None;
                        }
                        Selection::Closed => {
                            orchestrator.abandon(pending);
                            return Ok(session);
                        }
                    }
                }
                done => break Some(done),
            }
        };

        if let Some(done) = finished {
            print_outcome(out, &done, options.json)?;
        }
    }

    Ok(session)
}

async fn read_selection<R>(lines: &mut Lines<R>, timeout: Option<Duration>) -> Result<Selection>
where
    R: AsyncBufRead + Unpin,
{
    let next = match timeout {
        Some(limit) => match tokio::time::timeout(limit, lines.next_line()).await {
            Ok(line) => line?,
            Err(_) => return Ok(Selection::TimedOut),
        },
        None => lines.next_line().await?,
    };

    Ok(next.map_or(Selection::Closed, Selection::Line))
}

fn print_outcome<W: Write>(out: &mut W, outcome: &ChainOutcome, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(outcome)?)?;
    } else if let Some(text) = outcome.final_text() {
        writeln!(out, "{text}\n")?;
    }
    Ok(())
}
