// crates/strata-cli/src/commands/pools.rs
//
// `strata pools` - configured staking pools joined with their accumulator
// state. A pool nobody has touched yet shows no accumulator columns.

use serde::Serialize;
use tabled::Tabled;

use strata_core::error::StrataError;
use strata_economics::accumulator::load_state;
use strata_economics::pool::{load_pools, EmissionRule};
use strata_engine::BlockProcessor;

use crate::output::{print_rows, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
pub struct PoolRow {
    #[tabled(rename = "Pool")]
    pub id: String,
    #[tabled(rename = "Stake")]
    pub staking: String,
    #[tabled(rename = "Reward")]
    pub reward_token: String,
    #[tabled(rename = "Emission")]
    pub emission: String,
    #[tabled(rename = "Total staked")]
    pub total_staked: String,
    #[tabled(rename = "Emitted")]
    pub total_emitted: String,
    #[tabled(rename = "Last reward block")]
    pub last_reward_block: String,
    #[tabled(rename = "Stopped at")]
    pub stop_block: String,
}

fn describe(rule: &EmissionRule) -> String {
    match rule {
        EmissionRule::Fixed { tokens_per_block } => format!("fixed {}/block", tokens_per_block),
        EmissionRule::CappedDynamic { tokens_per_block } => {
            format!("capped {}/block", tokens_per_block)
        }
    }
}

pub fn rows(processor: &mut BlockProcessor) -> Result<Vec<PoolRow>, StrataError> {
    let pools = load_pools(&processor.config())?;
    let mut rows = Vec::with_capacity(pools.len());
    for pool in pools {
        let state = processor.view(|tx| load_state(tx, &pool.id))?;
        let dash = || "-".to_string();
        let (total_staked, total_emitted, last_reward_block, stop_block) = match &state {
            Some(s) => (
                s.total_staked.to_string(),
                s.total_emitted.to_string(),
                s.last_reward_block.to_string(),
                s.stop_block.map_or_else(dash, |b| b.to_string()),
            ),
            None => (dash(), dash(), dash(), dash()),
        };
        rows.push(PoolRow {
            staking: format!("{} -> {}", pool.staked_token, pool.stake_token),
            reward_token: pool.reward_token.clone(),
            emission: describe(&pool.emission),
            total_staked,
            total_emitted,
            last_reward_block,
            stop_block,
            id: pool.id,
        });
    }
    Ok(rows)
}

/// Run the pools command.
pub async fn run(
    processor: &mut BlockProcessor,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = rows(processor)?;
    print_rows(format, &rows, "No staking pools configured");
    Ok(())
}
