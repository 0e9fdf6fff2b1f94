//! ShopAgent - conversational shopping assistant
//!
//! CLI entry point for the interactive chat and one-shot queries.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use shopagent::api::{HttpShopApi, ModelChoice, ShopApi};
use shopagent::cli::{Cli, Command};
use shopagent::config::Config;
use shopagent::controller::{ControllerConfig, ConversationController};
use shopagent::repl;

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shopagent")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("shopagent.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "ShopAgent loaded config: base_url={}, model={}",
        config.api.base_url, config.chat.model
    );

    // Dispatch command
    match cli.command {
        Some(Command::Chat { query }) => cmd_chat(&config, query).await,
        Some(Command::Ask { query, model }) => cmd_ask(&config, &query, model).await,
        None => cmd_chat(&config, None).await,
    }
}

/// Build a controller wired to the configured service
fn build_controller(config: &Config) -> Result<Arc<ConversationController>> {
    let api: Arc<dyn ShopApi> =
        Arc::new(HttpShopApi::from_config(&config.api).context("Failed to create service client")?);

    Ok(Arc::new(ConversationController::new(
        api,
        ControllerConfig::from_config(config),
    )))
}

/// Run the interactive chat
async fn cmd_chat(config: &Config, query: Option<String>) -> Result<()> {
    let controller = build_controller(config)?;
    repl::run_interactive(controller, query).await
}

/// Submit one query, print the result, exit non-zero on dispatch failure
async fn cmd_ask(config: &Config, query: &str, model: Option<ModelChoice>) -> Result<()> {
    let controller = build_controller(config)?;

    // No session exists yet, so this only records the choice
    if let Some(model) = model {
        controller.switch_model(model).await?;
    }

    let snapshot = repl::run_once(controller, query).await;
    if snapshot.last_error.is_some() {
        std::process::exit(1);
    }

    Ok(())
}
