// crates/strata-cli/src/main.rs
//
// CLI entrypoint for the Strata operator tools.
//
// Every command opens the node's RocksDB read-only, so it can run next to a
// live daemon.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use output::OutputFormat;

/// Strata CLI: inspect a node's ledger, staking pools and transitions.
#[derive(Parser, Debug)]
#[command(name = "strata", version = "0.1.0", about = "Strata state inspection CLI")]
struct Cli {
    /// Daemon data directory (contains state_rocksdb).
    #[arg(long, global = true, default_value = "~/.strata/data")]
    data_dir: String,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Every token balance of an account.
    Balance {
        account: String,
    },

    /// Total supply and holders of a token.
    Supply {
        token: String,
    },

    /// Balance history of one account and token, oldest first.
    History {
        account: String,
        token: String,
        /// Show only the most recent entries.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Staking pools with their accumulator state.
    Pools,

    /// Transition points: scheduled height and when each was applied.
    Transitions,

    /// Last processed block and store summary.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let format = OutputFormat::from_json_flag(cli.json);
    let mut processor = commands::open_state(&cli.data_dir)?;

    match &cli.command {
        Commands::Balance { account } => {
            commands::balance::run(&mut processor, account, format).await?
        }
        Commands::Supply { token } => commands::supply::run(&mut processor, token, format).await?,
        Commands::History { account, token, limit } => {
            commands::history::run(&mut processor, account, token, *limit, format).await?
        }
        Commands::Pools => commands::pools::run(&mut processor, format).await?,
        Commands::Transitions => commands::transitions::run(&mut processor, format).await?,
        Commands::Status => commands::status::run(&mut processor, format).await?,
    }

    Ok(())
}
