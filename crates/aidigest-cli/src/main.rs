use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aidigest_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "aidigest")]
#[command(author, version, about = "Generate concise AI news digests with Gemini")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a title and summary for a piece of content
    Digest {
        /// Title of the content
        #[arg(short, long)]
        title: String,
        /// Kind of content, e.g. article, video, paper
        #[arg(short = 'k', long = "type", default_value = "article")]
        article_type: String,
        /// Read content from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,
        /// Override the configured temperature
        #[arg(long)]
        temperature: Option<f32>,
        /// Print the digest as JSON
        #[arg(long)]
        json: bool,
    },
    /// Database connection utilities
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// Configuration file utilities
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Print the resolved connection URL (password redacted)
    Url,
    /// Connect and run a trivial query
    Check,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Load configuration and install the log subscriber
fn init_runtime() -> Result<AppConfig> {
    let config = AppConfig::load()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Config commands never load the file, so a broken one can still be replaced
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config::path(),
            ConfigAction::Init { force } => commands::config::init(force),
        },
        Commands::Digest {
            title,
            article_type,
            file,
            model,
            temperature,
            json,
        } => {
            let config = init_runtime()?;
            let args = commands::digest::DigestArgs {
                title,
                article_type,
                file,
                model,
                temperature,
                json,
            };
            commands::digest::run(&config, args).await
        }
        Commands::Db { action } => {
            let config = init_runtime()?;
            match action {
                DbAction::Url => commands::db::url(&config),
                DbAction::Check => commands::db::check(&config).await,
            }
        }
    }
}
