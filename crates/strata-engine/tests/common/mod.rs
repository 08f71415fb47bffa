// Shared chain fixtures for the engine integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use strata_core::account::{MINTING_ACCOUNT, STAKE_ISSUER_ACCOUNT};
use strata_core::amount::Amount;
use strata_core::operation::{AuthLevel, Block, BlockHeader, Operation};
use strata_core::traits::KvStore;
use strata_economics::ledger;
use strata_economics::pool::{EmissionRule, StakingPoolConfig};
use strata_engine::{BlockOutcome, BlockProcessor, Genesis, GenesisBalance, OpStatus};
use strata_store::MemoryStore;

pub const REWARDS: &str = "$REWARD_POOLS_STAKING";

pub fn amt(s: &str) -> Amount {
    s.parse().unwrap()
}

pub fn time(block: u64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + block as i64 * 3, 0).unwrap()
}

pub fn sps_pool() -> StakingPoolConfig {
    StakingPoolConfig {
        id: "sps".to_string(),
        staked_token: "SPS".to_string(),
        stake_token: "SPSP".to_string(),
        reward_token: "SPS".to_string(),
        reward_account: REWARDS.to_string(),
        emission: EmissionRule::Fixed {
            tokens_per_block: amt("10"),
        },
        start_block: 20,
        stop_block: None,
        stop_date: None,
        unstaking_interval_blocks: 10,
        unstaking_periods: 4,
    }
}

/// Genesis with a governance admin, an oracle, one SPS staking pool funded
/// from a bookkeeping reward account, and 1000 SPS for alice, bob and carol.
///
/// Transition points: replay_keys at 100, bookkeeping_update at 150,
/// capped_emission at 200. Staking opens at block 20.
pub fn standard_genesis() -> Genesis {
    let mut config: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
    let mut set = |group: &str, key: &str, value: Value| {
        config
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value);
    };
    set("ledger", "bookkeeping_accounts", json!([MINTING_ACCOUNT, STAKE_ISSUER_ACCOUNT, REWARDS]));
    set("governance", "admins", json!(["gov"]));
    set("prices", "oracles", json!(["oracle"]));
    set("staking", "reward_start_block", json!(20));
    set("staking_pools", "sps", serde_json::to_value(sps_pool()).unwrap());
    set("transitions", "replay_keys", json!(100));
    set("transitions", "bookkeeping_update", json!(150));
    set("transitions", "capped_emission", json!(200));

    let balances = ["alice", "bob", "carol"]
        .iter()
        .map(|account| GenesisBalance {
            account: account.to_string(),
            token: "SPS".to_string(),
            amount: amt("1000"),
        })
        .collect();
    Genesis { config, balances }
}

pub fn processor_on(store: Arc<dyn KvStore>, genesis: &Genesis) -> BlockProcessor {
    let mut processor = BlockProcessor::open(store).unwrap();
    processor.apply_genesis(genesis).unwrap();
    processor.validate_startup().unwrap();
    processor
}

pub fn new_chain() -> BlockProcessor {
    processor_on(Arc::new(MemoryStore::new()), &standard_genesis())
}

pub fn op(block: u64, index: u32, account: &str, name: &str, payload: Value) -> Operation {
    Operation {
        account: account.to_string(),
        name: name.to_string(),
        id: format!("{}-{}", block, index),
        payload,
        block_num: block,
        block_time: time(block),
        trx_id: format!("trx-{}-{}", block, index),
        index,
        auth: AuthLevel::Active,
    }
}

/// A block of active-authority operations given as (account, name, payload).
pub fn block(num: u64, ops: Vec<(&str, &str, Value)>) -> Block {
    Block {
        header: BlockHeader {
            block_num: num,
            block_time: time(num),
            block_id: format!("block-{}", num),
        },
        operations: ops
            .into_iter()
            .enumerate()
            .map(|(i, (account, name, payload))| op(num, i as u32, account, name, payload))
            .collect(),
    }
}

pub fn run(
    processor: &mut BlockProcessor,
    num: u64,
    ops: Vec<(&str, &str, Value)>,
) -> BlockOutcome {
    processor.process_block(&block(num, ops)).unwrap()
}

pub fn transfer(to: &str, qty: &str) -> Value {
    json!({"to": to, "qty": qty, "token": "SPS"})
}

pub fn balance(processor: &mut BlockProcessor, account: &str, token: &str) -> Amount {
    processor
        .view(|tx| ledger::get_balance(tx, account, token))
        .unwrap()
}

pub fn supply(processor: &mut BlockProcessor, token: &str) -> Amount {
    processor.view(|tx| ledger::token_supply(tx, token)).unwrap()
}

pub fn is_rejected(outcome: &BlockOutcome, index: usize) -> bool {
    matches!(outcome.outcomes[index].status, OpStatus::Rejected { .. })
}

pub fn rejection(outcome: &BlockOutcome, index: usize) -> String {
    match &outcome.outcomes[index].status {
        OpStatus::Rejected { reason } => reason.clone(),
        OpStatus::Applied { .. } => panic!("operation {} was applied", index),
    }
}
