//! DocPortal CLI: the main entry point.
//!
//! Commands:
//! - `analyze`: Extract structured metadata from a document
//! - `compare`: Page-wise comparison of two documents
//! - `chat`: Ask questions about documents (interactive or single-message)
//! - `onboard`: Initialize config directory
//! - `doctor`: Diagnose configuration and provider health

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docportal_config::AppConfig;
use tracing::info;

mod commands;
mod loader;
mod logging;

#[derive(Parser)]
#[command(
    name = "docportal",
    about = "DocPortal — document analysis, comparison and chat",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract metadata and a summary from a document
    Analyze {
        /// Plain-text document (pages separated by form feeds)
        file: PathBuf,

        /// Print the metadata record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two versions of a document page by page
    Compare {
        /// The reference (original) document
        reference: PathBuf,

        /// The actual (revised) document
        actual: PathBuf,

        /// Print the rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask questions about one or more documents
    Chat {
        /// Documents to answer from
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Conversation session id (a new one is generated if omitted)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Initialize configuration
    Onboard,

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = AppConfig::load();
    let log_config = config
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    let _log_guard = logging::init(cli.verbose, &log_config);

    let config_path = AppConfig::config_path();
    if !config_path.exists() {
        info!(path = %config_path.display(), "No config file found, using defaults");
    }

    match cli.command {
        Commands::Analyze { file, json } => {
            commands::analyze::run(commands::require_api_key(config)?, &file, json).await?
        }
        Commands::Compare {
            reference,
            actual,
            json,
        } => {
            commands::compare::run(commands::require_api_key(config)?, &reference, &actual, json)
                .await?
        }
        Commands::Chat {
            files,
            message,
            session,
        } => commands::chat::run(commands::require_api_key(config)?, &files, message, session).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Doctor => commands::doctor::run(config).await?,
    }

    Ok(())
}
