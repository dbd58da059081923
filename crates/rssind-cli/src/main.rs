use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rssind_core::{
    storage::{Database, EntryStore},
    AppConfig, FeedRepository, HttpFeedSource,
};

mod commands;
mod opml;

#[derive(Parser)]
#[command(name = "rssind")]
#[command(version, about = "Polls news feeds and reports the ones with unread entries")]
struct Cli {
    /// Database file to use instead of the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Subscribe to a feed
    Subscribe {
        /// Feed URL
        url: String,
        /// Display name (read from the feed when omitted)
        #[arg(short = 'n', long)]
        name: Option<String>,
    },
    /// Subscribe to every RSS outline of an OPML file
    Import {
        /// Path to the OPML file
        file: PathBuf,
    },
    /// List all subscriptions
    List,
    /// Show unread entries of a feed
    Entries {
        /// Feed URL
        url: String,
        /// Include entries that were already read
        #[arg(long)]
        all: bool,
    },
    /// Mark a feed as read
    MarkRead {
        /// Feed URL
        url: String,
        /// Read watermark (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Check all feeds once and show the ones with new entries
    Check,
    /// Keep checking feeds on an interval until interrupted
    Watch {
        /// Minutes between checks (defaults to the configured interval)
        #[arg(short, long)]
        interval: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load()?;
    if let Some(db) = cli.db {
        config.general.database_path = Some(db);
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Initialize database
    let db = Database::new(&config).await?;
    let source = Arc::new(HttpFeedSource::new(&config.sync)?);
    let repo = Arc::new(FeedRepository::open(EntryStore::new(db.clone()), source).await?);

    let result = match cli.command {
        Commands::Subscribe { url, name } => {
            commands::subscribe::run(&repo, &url, name.as_deref()).await
        }
        Commands::Import { file } => commands::import::run(&repo, &file).await,
        Commands::List => commands::list::run(&repo).await,
        Commands::Entries { url, all } => commands::entries::run(&repo, &url, all).await,
        Commands::MarkRead { url, at } => commands::mark_read::run(&repo, &url, at).await,
        Commands::Check => commands::check::run(&repo).await,
        Commands::Watch { interval } => {
            let interval = interval.unwrap_or(config.sync.check_interval_mins);
            commands::watch::run(repo, interval).await
        }
    };

    db.close().await;
    result
}
