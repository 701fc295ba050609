use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use headliner_core::{storage::Database, AppConfig, IngestionService};

mod commands;

#[derive(Parser)]
#[command(name = "headliner")]
#[command(author, version, about = "Top-headline ingestion from NewsAPI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API and the background scheduler
    Serve,
    /// Fetch top headlines once and store the new ones
    Fetch {
        /// Two-letter country code
        #[arg(long)]
        country: Option<String>,
        /// Category, e.g. business or technology
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated source identifiers (excludes country and category)
        #[arg(long)]
        sources: Option<String>,
    },
    /// Fetch the upstream source list once and store new sources
    Sources,
    /// List stored articles, newest first
    List {
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Fetch headlines for every stored source
    Refresh {
        /// Fetch one source at a time instead of concurrently
        #[arg(long)]
        sequential: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Arc::new(AppConfig::load()?);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let db = Database::new(&config).await?;

    match cli.command {
        Commands::Serve => commands::serve::run(ingestion(&config, &db)?, config).await,
        Commands::Fetch {
            country,
            category,
            sources,
        } => commands::fetch::run(&*ingestion(&config, &db)?, country, category, sources).await,
        Commands::Sources => commands::sources::run(&*ingestion(&config, &db)?).await,
        Commands::List { limit, offset } => commands::list::run(&db, limit, offset).await,
        Commands::Refresh { sequential } => {
            commands::refresh::run(ingestion(&config, &db)?, &config, sequential).await
        }
    }
}

/// Pipeline for commands that talk to the News API; requires the API key
fn ingestion(config: &AppConfig, db: &Database) -> Result<Arc<IngestionService>> {
    Ok(Arc::new(IngestionService::from_config(config, db)?))
}
