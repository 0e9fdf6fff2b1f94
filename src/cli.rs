//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::ModelChoice;

/// ShopAgent - conversational shopping assistant
#[derive(Parser)]
#[command(
    name = "shopagent",
    about = "Conversational shopping assistant client",
    version,
    after_help = "Logs are written to: ~/.local/share/shopagent/logs/shopagent.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Start an interactive shopping chat (default)
    Chat {
        /// Opening query to submit immediately
        #[arg(value_name = "QUERY")]
        query: Option<String>,
    },

    /// Submit a single query and print the recommendations
    Ask {
        /// The shopping query
        #[arg(value_name = "QUERY")]
        query: String,

        /// Model to use (perplexity, openai, hybrid)
        #[arg(short, long)]
        model: Option<ModelChoice>,
    },
}

/// Path of the log file the binary writes to
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shopagent")
        .join("logs")
        .join("shopagent.log")
}
