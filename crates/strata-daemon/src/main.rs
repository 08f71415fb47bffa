// crates/strata-daemon/src/main.rs
//
// Binary entrypoint for the Strata daemon.
//
// Parses CLI arguments, loads configuration, initializes tracing, opens the
// RocksDB state store, applies genesis on first start, validates routes, and
// runs the sync loop until the feed ends or ctrl-c.

mod config;
mod error;
mod feed;
mod state;
mod sync_loop;

use std::sync::Arc;

use clap::Parser;
use config::{expand_tilde, load_genesis, DaemonConfig};
use feed::JsonLinesFeed;
use state::{NodeState, NodeStateMachine};
use sync_loop::SyncLoop;

use strata_engine::BlockProcessor;
use strata_store::RocksStore;

/// Strata daemon: applies a block feed to the local state store.
#[derive(Parser, Debug)]
#[command(name = "strata-daemon", version = "0.1.0", about = "Strata state-transition node")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.strata/config.toml")]
    config: String,

    /// Override the feed path from the config file.
    #[arg(long)]
    feed: Option<String>,

    /// Override the data directory from the config file.
    #[arg(long)]
    data_dir: Option<String>,

    /// Keep polling the feed after reaching its end.
    #[arg(long)]
    follow: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Configuration is loaded before tracing so its log level can seed the
    // filter; a load failure is reported once tracing is up.
    let config_path = expand_tilde(&args.config);
    let loaded = DaemonConfig::load(&config_path);
    let mut daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", config_path),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    if let Some(feed) = args.feed {
        daemon_config.feed_path = feed;
    }
    if let Some(data_dir) = args.data_dir {
        daemon_config.data_dir = data_dir;
    }
    daemon_config.follow |= args.follow;

    tracing::info!("Strata Daemon v0.1.0");
    tracing::info!("Data directory: {}", daemon_config.data_dir);
    tracing::info!("Feed: {}", daemon_config.feed_path);

    let mut state_machine = NodeStateMachine::new();

    let data_dir = expand_tilde(&daemon_config.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let db_path = format!("{}/state_rocksdb", data_dir);
    let store = Arc::new(RocksStore::open(&db_path)?);
    tracing::info!("State store opened at {}", db_path);

    let mut processor = BlockProcessor::open(store.clone())?;
    if let Some(path) = &daemon_config.genesis_path {
        let genesis = load_genesis(&expand_tilde(path))?;
        if processor.apply_genesis(&genesis)? {
            tracing::info!(
                "Genesis applied from {} ({} balances)",
                path,
                genesis.balances.len()
            );
        } else {
            tracing::info!("Genesis already applied, ignoring {}", path);
        }
    }
    processor.validate_startup()?;

    let feed_path = expand_tilde(&daemon_config.feed_path);
    let feed = JsonLinesFeed::open(&feed_path, daemon_config.follow).await?;
    state_machine.transition(NodeState::Syncing)?;

    let mut sync = SyncLoop::new(processor, feed, state_machine, &daemon_config);
    let result = sync
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;
    tracing::info!("Sync loop stopped in state {}", sync.state());
    sync.shutdown();
    store.flush()?;

    let summary = result?;
    tracing::info!(
        "Processed {} blocks ({} skipped), {} operations applied, {} rejected, last block {}",
        summary.blocks,
        summary.skipped,
        summary.applied,
        summary.rejected,
        summary
            .last_block
            .map_or("none".to_string(), |b| b.to_string())
    );
    if let Some(digest) = &summary.last_digest {
        tracing::info!("Last state digest {}", digest);
    }
    tracing::info!("Strata daemon shut down gracefully");

    Ok(())
}
