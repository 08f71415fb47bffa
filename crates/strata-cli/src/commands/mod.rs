// crates/strata-cli/src/commands/mod.rs
//
// Command module declarations for the Strata CLI, plus opening the state
// store they all read.

pub mod balance;
pub mod history;
pub mod pools;
pub mod status;
pub mod supply;
pub mod transitions;

use std::sync::Arc;

use strata_core::error::StrataError;
use strata_engine::BlockProcessor;
use strata_store::RocksStore;

/// Open `<data_dir>/state_rocksdb` read-only behind a processor, so commands
/// read through the same snapshot and transaction paths as the engine.
pub fn open_state(data_dir: &str) -> Result<BlockProcessor, StrataError> {
    let path = format!("{}/state_rocksdb", expand_tilde(data_dir));
    let store = RocksStore::open_read_only(&path)?;
    BlockProcessor::open(Arc::new(store))
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
