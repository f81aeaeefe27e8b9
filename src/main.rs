//! faqbot CLI entry point.

use anyhow::Context;
use clap::Parser;

use faqbot::cli::{handle_error, load_config, AppContext, Cli, Commands};
use faqbot::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LogConfig::try_from(&config.logging)
        .map_err(anyhow::Error::msg)
        .and_then(|log_config| LoggerImpl::init(&log_config))
        .context("Failed to initialize logging")
    {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let ctx = AppContext::new(config);

    let result = match cli.command {
        Commands::Ingest(args) => faqbot::cli::commands::ingest::execute(args, &ctx, cli.json).await,
        Commands::Chat(args) => faqbot::cli::commands::chat::execute(args, &ctx, cli.json).await,
        Commands::Search(args) => faqbot::cli::commands::search::execute(args, &ctx, cli.json).await,
        Commands::Export(args) => faqbot::cli::commands::export::execute(args, &ctx, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
