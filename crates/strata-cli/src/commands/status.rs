// crates/strata-cli/src/commands/status.rs
//
// `strata status` - last processed block and a few store facts.

use serde::Serialize;

use strata_core::error::StrataError;
use strata_core::operation::BlockHeader;
use strata_economics::pool::load_pools;
use strata_engine::BlockProcessor;
use strata_store::keys;

use crate::output::{format_json, OutputFormat};

#[derive(Debug, Serialize)]
pub struct Status {
    pub last_block: Option<BlockHeader>,
    pub genesis_applied: bool,
    pub config_groups: Vec<String>,
    pub pools: usize,
}

pub fn status(processor: &mut BlockProcessor) -> Result<Status, StrataError> {
    let config = processor.config();
    let genesis_applied = processor.view(|tx| Ok(tx.get_json::<u64>(keys::GENESIS)?.is_some()))?;
    Ok(Status {
        last_block: config.last_block().cloned(),
        genesis_applied,
        config_groups: config.group_names(),
        pools: load_pools(&config)?.len(),
    })
}

/// Run the status command.
pub async fn run(
    processor: &mut BlockProcessor,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = status(processor)?;
    match format {
        OutputFormat::Json => println!("{}", format_json(&status)),
        OutputFormat::Table => {
            println!("Strata node status");
            println!("------------------");
            match &status.last_block {
                Some(h) => println!(
                    "  Last block:     {} ({}) at {}",
                    h.block_num, h.block_id, h.block_time
                ),
                None => println!("  Last block:     none"),
            }
            let genesis = if status.genesis_applied {
                "applied"
            } else {
                "missing"
            };
            println!("  Genesis:        {}", genesis);
            println!("  Config groups:  {}", status.config_groups.join(", "));
            println!("  Staking pools:  {}", status.pools);
        }
    }
    Ok(())
}
