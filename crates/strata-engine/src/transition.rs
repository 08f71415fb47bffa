// crates/strata-engine/src/transition.rs
//
// Transition Manager: named, governance-scheduled one-time migrations.
//
// Each transition point is a name with a block height in config group
// `transitions`. When a block's height equals a point's height, the manager
// synthesizes that point's virtual operations from `$TRANSITIONS`; the
// processor feeds them through the same routing, validation and transaction
// path as user operations. Firing is on equality only, never `>=`, and a
// `transition_applied:{name}` marker stops a reprocessed block from firing a
// point twice. Everything a transition does is a function of height alone.

use serde_json::{json, Value};

use strata_core::account::{MINTING_ACCOUNT, TRANSITIONS_ACCOUNT};
use strata_core::error::StrataError;
use strata_core::operation::{AuthLevel, BlockHeader, Operation};
use strata_economics::ledger::BOOKKEEPING_KEY;
use strata_store::keys;
use strata_store::snapshot::groups;
use strata_store::{SnapshotState, Transaction};

pub use strata_economics::replay::REPLAY_KEYS_TRANSITION;

/// Migrates every fixed-rate staking pool to the capped dynamic formula.
pub const CAPPED_EMISSION: &str = "capped_emission";

/// Adds the burn account to the bookkeeping set.
pub const BOOKKEEPING_UPDATE: &str = "bookkeeping_update";

/// Account user funds can be sent to for burning once `bookkeeping_update`
/// has run.
pub const BURN_ACCOUNT: &str = "$BURN";

/// One synthesized operation of a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualOp {
    pub name: &'static str,
    pub payload: Value,
}

/// A named transition point and the operations it fires.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionDef {
    pub name: &'static str,
    /// Empty for points that only gate routing.
    pub ops: Vec<VirtualOp>,
}

pub struct TransitionManager {
    table: Vec<TransitionDef>,
}

impl TransitionManager {
    pub fn new(table: Vec<TransitionDef>) -> Self {
        Self { table }
    }

    /// The transition table of the live chain.
    pub fn standard() -> Self {
        Self::new(vec![
            TransitionDef {
                name: REPLAY_KEYS_TRANSITION,
                ops: Vec::new(),
            },
            TransitionDef {
                name: CAPPED_EMISSION,
                ops: vec![VirtualOp {
                    name: "transition_capped_emission",
                    payload: json!({}),
                }],
            },
            TransitionDef {
                name: BOOKKEEPING_UPDATE,
                ops: vec![VirtualOp {
                    name: "transition_config",
                    payload: json!({
                        "writes": [{
                            "group": groups::LEDGER,
                            "key": BOOKKEEPING_KEY,
                            "value": [MINTING_ACCOUNT, BURN_ACCOUNT],
                            "append": true
                        }]
                    }),
                }],
            },
        ])
    }

    pub fn table(&self) -> &[TransitionDef] {
        &self.table
    }

    /// Points whose height is exactly `block` and that have not been applied.
    pub fn due(
        &self,
        tx: &Transaction<'_>,
        block: u64,
    ) -> Result<Vec<&TransitionDef>, StrataError> {
        let mut due = Vec::new();
        for def in &self.table {
            if tx.config().transition_height(def.name)? != Some(block) {
                continue;
            }
            if is_applied(tx, def.name)? {
                tracing::debug!("Transition {} already applied, not refiring", def.name);
                continue;
            }
            due.push(def);
        }
        Ok(due)
    }
}

/// The operations `def` fires in the block described by `header`.
pub fn virtual_operations(def: &TransitionDef, header: &BlockHeader) -> Vec<Operation> {
    def.ops
        .iter()
        .enumerate()
        .map(|(i, vop)| Operation {
            account: TRANSITIONS_ACCOUNT.to_string(),
            name: vop.name.to_string(),
            id: format!("{}:{}", def.name, i),
            payload: vop.payload.clone(),
            block_num: header.block_num,
            block_time: header.block_time,
            trx_id: format!("transition-{}-{}", def.name, header.block_num),
            index: i as u32,
            auth: AuthLevel::Active,
        })
        .collect()
}

pub fn is_applied(tx: &Transaction<'_>, name: &str) -> Result<bool, StrataError> {
    Ok(tx.get_json::<u64>(&keys::transition_applied(name))?.is_some())
}

pub fn mark_applied(tx: &mut Transaction<'_>, name: &str) -> Result<(), StrataError> {
    let block = tx.block_num();
    tx.put_json(keys::transition_applied(name), &block)
}

/// Rules for a governance write of transition point `name` at `block`:
/// the new height must lie strictly in the future, and a point that has
/// already been reached can no longer move.
pub fn validate_transition_write(
    config: &SnapshotState,
    name: &str,
    height: u64,
    block: u64,
) -> Result<(), StrataError> {
    if let Some(current) = config.transition_height(name)? {
        if current <= block {
            return Err(StrataError::rejected(format!(
                "transition {} was reached at block {} and cannot change",
                name, current
            )));
        }
    }
    if height <= block {
        return Err(StrataError::rejected(format!(
            "transition {} must be scheduled after block {}, got {}",
            name, block, height
        )));
    }
    Ok(())
}
