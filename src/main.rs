use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use feedhook::config::{Config, FeedConfig};
use feedhook::feed::HttpFetcher;
use feedhook::{log_author_and_link, FeedDescriptor, Scheduler};

/// Get the config directory path (~/.config/feedhook/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("feedhook"))
}

#[derive(Parser, Debug)]
#[command(
    name = "feedhook",
    about = "Poll RSS/Atom feeds and log every new item"
)]
struct Args {
    /// Config file (default: ~/.config/feedhook/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Additional feed URL to poll (repeatable)
    #[arg(long = "feed", value_name = "URL")]
    feeds: Vec<String>,

    /// Refresh interval in seconds for feeds without their own setting
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Head store database path (overrides the config file)
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,
}

fn build_feeds(config: &Config) -> Result<Vec<FeedDescriptor>> {
    config
        .feeds
        .iter()
        .map(|feed| {
            let descriptor = FeedDescriptor::new(feed.url.as_str(), log_author_and_link)?
                .with_refresh_period(config.refresh_period(feed))?;
            Ok(descriptor)
        })
        .collect::<Result<Vec<_>>>()
        .context("Invalid feed configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    if let Some(secs) = args.interval {
        config.refresh_interval_secs = secs;
    }
    config.feeds.extend(args.feeds.iter().map(|url| FeedConfig {
        url: url.clone(),
        refresh_interval_secs: None,
    }));

    if config.feeds.is_empty() {
        eprintln!("Error: No feeds configured.");
        eprintln!();
        eprintln!("Add [[feeds]] entries to {}", config_path.display());
        eprintln!("or pass them on the command line:");
        eprintln!("  feedhook --feed https://example.com/feed.xml");
        std::process::exit(1);
    }

    let feeds = build_feeds(&config)?;

    let db_path = match args.database.or_else(|| config.database.clone()) {
        Some(path) => path,
        None => {
            if !config_dir.exists() {
                std::fs::create_dir_all(&config_dir)
                    .context("Failed to create config directory")?;
            }
            config_dir.join("heads.db")
        }
    };
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("feedhook/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .context("Failed to build HTTP client")?;

    // Feeds are validated before the database file is opened
    let scheduler = Scheduler::with_store_path(db_path_str, feeds)
        .await
        .with_context(|| format!("Failed to start polling with {}", db_path.display()))?
        .with_fetcher(Arc::new(HttpFetcher::with_client(client)));
    for feed in scheduler.feeds() {
        tracing::info!(
            feed = %feed.url(),
            every = ?feed.refresh_period(),
            "Watching feed"
        );
    }

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            shutdown.cancel();
        }
    });

    if let Err(e) = scheduler.run(cancel).await {
        tracing::error!(error = %e, "Polling failed");
        return Err(e).context("Polling stopped");
    }

    Ok(())
}
