// crates/strata-daemon/src/sync_loop.rs
//
// Foreground processing loop: pulls blocks from the feed and hands them to the
// block processor until the feed closes, the stop height is reached, or
// shutdown is requested.
//
// A fatal engine error (invariant violation, storage failure) halts the loop
// with that error; the block it occurred in is not recorded as processed.

use std::future::Future;
use std::time::Duration;

use strata_core::operation::Block;
use strata_engine::BlockProcessor;

use crate::config::DaemonConfig;
use crate::error::DaemonError;
use crate::feed::{FeedPoll, OperationFeed};
use crate::state::{NodeState, NodeStateMachine};

/// Totals for one run of the loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSummary {
    pub blocks: u64,
    pub skipped: u64,
    pub applied: usize,
    pub rejected: usize,
    pub last_block: Option<u64>,
    pub last_digest: Option<String>,
}

enum Step {
    Continue,
    Stop,
}

pub struct SyncLoop<F: OperationFeed> {
    processor: BlockProcessor,
    feed: F,
    state: NodeStateMachine,
    log_interval: u64,
    poll_interval: Duration,
    stop_at_block: Option<u64>,
    summary: SyncSummary,
}

impl<F: OperationFeed> SyncLoop<F> {
    /// `state` must already be in `Syncing`.
    pub fn new(
        processor: BlockProcessor,
        feed: F,
        state: NodeStateMachine,
        config: &DaemonConfig,
    ) -> Self {
        Self {
            processor,
            feed,
            state,
            log_interval: config.block_batch_log_interval.max(1),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            stop_at_block: config.stop_at_block,
            summary: SyncSummary::default(),
        }
    }

    pub fn state(&self) -> &NodeState {
        &self.state.current
    }

    pub fn processor(&mut self) -> &mut BlockProcessor {
        &mut self.processor
    }

    /// Run until the feed closes, the stop height is processed, `shutdown`
    /// resolves, or a block fails.
    pub async fn run(
        &mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<SyncSummary, DaemonError> {
        tokio::pin!(shutdown);
        tracing::info!(
            "Sync loop started after block {}",
            self.processor
                .last_block()
                .map_or("genesis".to_string(), |b| b.to_string())
        );

        loop {
            let poll = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Sync loop received shutdown signal");
                    break;
                }
                poll = self.feed.next_block() => poll?,
            };

            match poll {
                FeedPoll::Block(block) => {
                    if let Step::Stop = self.apply(&block)? {
                        break;
                    }
                }
                FeedPoll::Idle => {
                    if self.state.current == NodeState::Syncing {
                        self.state.transition(NodeState::Ready)?;
                    }
                    tokio::select! {
                        _ = &mut shutdown => {
                            tracing::info!("Sync loop received shutdown signal");
                            break;
                        }
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
                FeedPoll::Closed => {
                    tracing::info!("Feed exhausted");
                    break;
                }
            }
        }

        Ok(self.summary.clone())
    }

    fn apply(&mut self, block: &Block) -> Result<Step, DaemonError> {
        if self.state.current == NodeState::Ready {
            self.state.transition(NodeState::Syncing)?;
        }
        let num = block.block_num();
        if let Some(last) = self.processor.last_block() {
            if num > last + 1 {
                tracing::warn!("Feed gap: block {} follows block {}", num, last);
            }
        }

        let outcome = match self.processor.process_block(block) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Halting at block {}: {}", num, e);
                return Err(e.into());
            }
        };

        if outcome.skipped {
            self.summary.skipped += 1;
            return Ok(Step::Continue);
        }
        self.summary.blocks += 1;
        self.summary.applied += outcome.applied();
        self.summary.rejected += outcome.rejected();
        self.summary.last_block = Some(num);
        tracing::debug!("Block {} digest {}", num, outcome.state_digest);
        self.summary.last_digest = Some(outcome.state_digest);

        for name in &outcome.transitions {
            tracing::info!("Block {}: transition {} applied", num, name);
        }
        if self.summary.blocks % self.log_interval == 0 {
            tracing::info!(
                "Processed {} blocks (last {}): {} operations applied, {} rejected",
                self.summary.blocks,
                num,
                self.summary.applied,
                self.summary.rejected
            );
        }

        if self.stop_at_block.map_or(false, |stop| num >= stop) {
            tracing::info!("Reached stop height {}", num);
            return Ok(Step::Stop);
        }
        Ok(Step::Continue)
    }

    /// Move to `ShuttingDown` and hand back the processor.
    pub fn shutdown(mut self) -> BlockProcessor {
        if let Err(e) = self.state.transition(NodeState::ShuttingDown) {
            tracing::warn!("Could not enter shutdown state: {}", e);
        }
        self.processor
    }
}
