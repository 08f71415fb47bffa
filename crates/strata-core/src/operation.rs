// crates/strata-core/src/operation.rs
//
// Inbound operations and blocks as delivered by the blockchain client.
//
// The feed is strictly ordered by (block_num, index) and replayable from
// genesis. Operations are opaque JSON payloads tagged with the submitting
// account and the authority level the chain verified for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authority level under which the chain accepted an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthLevel {
    /// Low-privilege key: may claim, vote, report prices.
    Posting,
    /// High-privilege key: required for anything that moves value.
    Active,
}

/// A single operation submitted to the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Account that signed the operation.
    pub account: String,
    /// Operation name (e.g. `token_transfer`), used for routing.
    pub name: String,
    /// Chain-assigned operation id, unique across the chain.
    pub id: String,
    /// Raw JSON payload.
    #[serde(default)]
    pub payload: serde_json::Value,
    pub block_num: u64,
    pub block_time: DateTime<Utc>,
    /// Id of the chain transaction that carried this operation.
    pub trx_id: String,
    /// Position of the operation within its block.
    #[serde(default)]
    pub index: u32,
    pub auth: AuthLevel,
}

/// Header fields of a block that the engine caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub block_num: u64,
    pub block_time: DateTime<Utc>,
    #[serde(default)]
    pub block_id: String,
}

/// A block of ordered operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub operations: Vec<Operation>,
}

impl Block {
    pub fn block_num(&self) -> u64 {
        self.header.block_num
    }
}

/// Where in the chain an effect is being applied. Carried by every
/// transaction so history records and accumulators see the same height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub block_num: u64,
    pub block_time: DateTime<Utc>,
    pub trx_id: String,
}

impl BlockContext {
    pub fn new(block_num: u64, block_time: DateTime<Utc>, trx_id: impl Into<String>) -> Self {
        Self {
            block_num,
            block_time,
            trx_id: trx_id.into(),
        }
    }

    /// Context for an operation.
    pub fn for_operation(op: &Operation) -> Self {
        Self::new(op.block_num, op.block_time, op.trx_id.clone())
    }
}
