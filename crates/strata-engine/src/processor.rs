// crates/strata-engine/src/processor.rs
//
// BlockProcessor: applies one block at a time, in chain order.
//
// Per block:
//   1. Skip blocks at or below the last processed height; reject blocks whose
//      operations are out of order.
//   2. Fire due transitions (virtual operations through the normal pipeline),
//      then mark each as applied in its own transaction.
//   3. Release unstake installments due at this height.
//   4. Apply user operations in order, each in its own transaction.
//   5. Record the block header as the last processed block.
//
// Every step runs in its own transaction over a `BlockOverlay` and a staged
// copy of the config snapshot. A rejection rolls back only its own
// operation. The block reaches the store as one batch together with
// `meta:last_block`, and only then is the staged snapshot adopted. Any other
// error drops the overlay and aborts the block with nothing written; the
// caller must stop, since continuing would risk diverging from other nodes.
//
// Every committed write is folded into a SHA-256 state digest so operators can
// compare nodes block by block.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use strata_core::account::{is_reserved, is_valid_account};
use strata_core::error::StrataError;
use strata_core::event::EventRecord;
use strata_core::operation::{Block, BlockContext, Operation};
use strata_core::traits::{KvStore, KvWrite};
use strata_economics::staking;
use strata_store::{BlockOverlay, ConfigSnapshot, SnapshotState, Transaction};

use crate::genesis::{apply_genesis, Genesis};
use crate::route::{standard_routes, RouteTable};
use crate::transition::{mark_applied, virtual_operations, TransitionDef, TransitionManager};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OpStatus {
    Applied { events: Vec<EventRecord> },
    Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationOutcome {
    pub id: String,
    pub name: String,
    pub account: String,
    /// True for operations synthesized by a transition.
    pub system: bool,
    pub status: OpStatus,
}

impl OperationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self.status, OpStatus::Applied { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockOutcome {
    pub block_num: u64,
    /// True when the block was at or below the last processed height.
    pub skipped: bool,
    pub transitions: Vec<String>,
    pub unstakes_released: usize,
    pub outcomes: Vec<OperationOutcome>,
    /// Hex SHA-256 over every write committed for this block.
    pub state_digest: String,
}

impl BlockOutcome {
    fn new(block_num: u64) -> Self {
        Self {
            block_num,
            skipped: false,
            transitions: Vec::new(),
            unstakes_released: 0,
            outcomes: Vec::new(),
            state_digest: String::new(),
        }
    }

    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes.len() - self.applied()
    }
}

pub struct BlockProcessor {
    store: Arc<dyn KvStore>,
    snapshot: ConfigSnapshot,
    routes: RouteTable,
    transitions: TransitionManager,
    last_block: Option<u64>,
}

impl BlockProcessor {
    /// Open a processor over `store`, loading the snapshot from it.
    pub fn new(
        store: Arc<dyn KvStore>,
        routes: RouteTable,
        transitions: TransitionManager,
    ) -> Result<Self, StrataError> {
        let snapshot = ConfigSnapshot::load(store.as_ref())?;
        let last_block = snapshot.baseline().last_block().map(|h| h.block_num);
        Ok(Self {
            store,
            snapshot,
            routes,
            transitions,
            last_block,
        })
    }

    /// A processor with the live chain's routes and transitions.
    pub fn open(store: Arc<dyn KvStore>) -> Result<Self, StrataError> {
        Self::new(
            store,
            RouteTable::build(standard_routes())?,
            TransitionManager::standard(),
        )
    }

    /// Apply genesis once. Returns false if the store already had it.
    pub fn apply_genesis(&mut self, genesis: &Genesis) -> Result<bool, StrataError> {
        let applied = apply_genesis(self.store.as_ref(), &mut self.snapshot, genesis)?;
        if let Some(writes) = &applied {
            tracing::info!("Applied genesis ({} writes)", writes.len());
        }
        Ok(applied.is_some())
    }

    /// Fail fast if the routes depend on unscheduled transition points.
    pub fn validate_startup(&self) -> Result<(), StrataError> {
        self.routes.validate_config(&self.snapshot.baseline())
    }

    pub fn last_block(&self) -> Option<u64> {
        self.last_block
    }

    /// The committed config snapshot.
    pub fn config(&self) -> Arc<SnapshotState> {
        self.snapshot.baseline()
    }

    pub fn store(&self) -> Arc<dyn KvStore> {
        Arc::clone(&self.store)
    }

    /// Run a read-only closure against committed state.
    pub fn view<T>(
        &mut self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, StrataError>,
    ) -> Result<T, StrataError> {
        let baseline = self.snapshot.baseline();
        let block_time: DateTime<Utc> = baseline
            .last_block()
            .map(|h| h.block_time)
            .unwrap_or_default();
        let ctx = BlockContext::new(self.last_block.unwrap_or(0), block_time, "view");
        let tx = Transaction::begin(self.store.as_ref(), &mut self.snapshot, ctx);
        let result = f(&tx);
        tx.rollback();
        result
    }

    pub fn process_block(&mut self, block: &Block) -> Result<BlockOutcome, StrataError> {
        let num = block.block_num();
        let mut outcome = BlockOutcome::new(num);
        if let Some(last) = self.last_block {
            if num <= last {
                tracing::debug!("Block {} already processed (last {}), skipping", num, last);
                outcome.skipped = true;
                return Ok(outcome);
            }
        }
        check_order(block)?;

        let overlay = BlockOverlay::new(self.store.as_ref());
        let store: &dyn KvStore = &overlay;
        let mut staged = self.snapshot.clone();
        let snapshot = &mut staged;
        let routes = &self.routes;
        let block_time = block.header.block_time;
        let mut hasher = Sha256::new();

        // Transitions.
        let due: Vec<TransitionDef> = {
            let ctx = BlockContext::new(num, block_time, "transitions");
            let tx = Transaction::begin(store, snapshot, ctx);
            let due = self.transitions.due(&tx, num)?.into_iter().cloned().collect();
            tx.rollback();
            due
        };
        for def in &due {
            tracing::info!("Block {}: firing transition {}", num, def.name);
            for op in virtual_operations(def, &block.header) {
                let result = apply_operation(store, snapshot, routes, &op, true, &mut hasher)?;
                outcome.outcomes.push(result);
            }
            let trx_id = format!("transition-{}-{}", def.name, num);
            let ctx = BlockContext::new(num, block_time, trx_id);
            let mut tx = Transaction::begin(store, snapshot, ctx);
            mark_applied(&mut tx, def.name)?;
            absorb(&mut hasher, &tx.commit()?);
            outcome.transitions.push(def.name.to_string());
        }

        // Unstake installments.
        let unstake_ctx = BlockContext::new(num, block_time, format!("unstake-{}", num));
        let due_unstakes = {
            let tx = Transaction::begin(store, snapshot, unstake_ctx.clone());
            let due = staking::due_unstakes(&tx, num)?;
            tx.rollback();
            due
        };
        for (account, token) in due_unstakes {
            let mut tx = Transaction::begin(store, snapshot, unstake_ctx.clone());
            match staking::release_installment(&mut tx, &account, &token) {
                Ok(_) => {
                    absorb(&mut hasher, &tx.commit()?);
                    outcome.unstakes_released += 1;
                }
                Err(e) if e.is_rejection() => {
                    tx.rollback();
                    tracing::warn!(
                        "Block {}: unstake of {} by {} not released: {}",
                        num,
                        token,
                        account,
                        e
                    );
                }
                Err(e) => {
                    tx.rollback();
                    tracing::error!(
                        "Block {}: unstake of {} by {} failed: {}",
                        num,
                        token,
                        account,
                        e
                    );
                    return Err(e);
                }
            }
        }

        // User operations.
        for op in &block.operations {
            let result = apply_operation(store, snapshot, routes, op, false, &mut hasher)?;
            outcome.outcomes.push(result);
        }

        let ctx = BlockContext::new(num, block_time, block.header.block_id.clone());
        let mut tx = Transaction::begin(store, snapshot, ctx);
        tx.set_last_block(&block.header)?;
        absorb(&mut hasher, &tx.commit()?);

        let written = overlay.commit()?;
        self.snapshot = staged;
        self.last_block = Some(num);
        outcome.state_digest = hex::encode(hasher.finalize());
        tracing::debug!(
            "Block {}: {} writes, {} applied, {} rejected, {} unstakes released, digest {}",
            num,
            written.len(),
            outcome.applied(),
            outcome.rejected(),
            outcome.unstakes_released,
            outcome.state_digest
        );
        Ok(outcome)
    }
}

/// Operations must belong to the block and arrive in strictly increasing index order.
fn check_order(block: &Block) -> Result<(), StrataError> {
    let num = block.block_num();
    let mut prev: Option<u32> = None;
    for op in &block.operations {
        if op.block_num != num {
            return Err(StrataError::rejected(format!(
                "block {}: operation {} claims block {}",
                num, op.id, op.block_num
            )));
        }
        if prev.map_or(false, |p| op.index <= p) {
            return Err(StrataError::rejected(format!(
                "block {}: operation {} out of order (index {})",
                num, op.id, op.index
            )));
        }
        prev = Some(op.index);
    }
    Ok(())
}

fn absorb(hasher: &mut Sha256, writes: &[KvWrite]) {
    for write in writes {
        match write {
            KvWrite::Put(key, value) => {
                hasher.update(b"P");
                hasher.update((key.len() as u64).to_le_bytes());
                hasher.update(key);
                hasher.update((value.len() as u64).to_le_bytes());
                hasher.update(value);
            }
            KvWrite::Delete(key) => {
                hasher.update(b"D");
                hasher.update((key.len() as u64).to_le_bytes());
                hasher.update(key);
            }
        }
    }
}

/// Route, validate and process one operation in its own transaction.
fn apply_operation(
    store: &dyn KvStore,
    snapshot: &mut ConfigSnapshot,
    routes: &RouteTable,
    op: &Operation,
    system: bool,
    hasher: &mut Sha256,
) -> Result<OperationOutcome, StrataError> {
    let mut tx = Transaction::begin(store, snapshot, BlockContext::for_operation(op));
    let result = if !is_valid_account(&op.account) {
        Err(StrataError::rejected(format!(
            "invalid account name {:?}",
            op.account
        )))
    } else if !system && is_reserved(&op.account) {
        Err(StrataError::rejected(format!(
            "reserved account {} cannot submit operations",
            op.account
        )))
    } else {
        run_action(&mut tx, routes, op)
    };

    let status = match result {
        Ok(events) => {
            absorb(hasher, &tx.commit()?);
            OpStatus::Applied { events }
        }
        Err(StrataError::Rejected(reason)) => {
            tx.rollback();
            tracing::warn!(
                "Block {}: rejected {} {} from {}: {}",
                op.block_num,
                op.name,
                op.id,
                op.account,
                reason
            );
            OpStatus::Rejected { reason }
        }
        Err(e) => {
            tx.rollback();
            tracing::error!(
                "Block {}: {} {} from {} failed: {}",
                op.block_num,
                op.name,
                op.id,
                op.account,
                e
            );
            return Err(e);
        }
    };

    Ok(OperationOutcome {
        id: op.id.clone(),
        name: op.name.clone(),
        account: op.account.clone(),
        system,
        status,
    })
}

fn run_action(
    tx: &mut Transaction<'_>,
    routes: &RouteTable,
    op: &Operation,
) -> Result<Vec<EventRecord>, StrataError> {
    let handler = routes
        .route(op.block_num, &op.name, tx.config())?
        .ok_or_else(|| {
            StrataError::rejected(format!("no handler for {} at block {}", op.name, op.block_num))
        })?;
    let action = handler.instantiate(op)?;
    if !action.is_supported() {
        return Err(StrataError::rejected(format!(
            "{} is not supported for {} with {:?} authority",
            action.name(),
            op.account,
            op.auth
        )));
    }
    action.validate(tx)?;
    action.process(tx)
}
