// crates/strata-daemon/src/feed.rs
//
// Operation feeds: where the daemon gets its blocks from.
//
// The JSON-lines feed accepts two line shapes, freely mixed:
//   - a whole block: {"header": {...}, "operations": [...]}
//   - a single operation: {"account": ..., "name": ..., "block_num": ..., ...}
// Consecutive operation lines with the same block_num are grouped into one
// block. A group is complete once a line for another block arrives, or at the
// end of the file when not following it.

use std::collections::VecDeque;
use std::mem;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use strata_core::operation::{Block, BlockHeader, Operation};

use crate::error::DaemonError;

/// Result of polling a feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedPoll {
    Block(Block),
    /// Nothing new yet; poll again later.
    Idle,
    /// The feed has ended.
    Closed,
}

/// A source of blocks in chain order.
#[async_trait]
pub trait OperationFeed: Send {
    async fn next_block(&mut self) -> Result<FeedPoll, DaemonError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedLine {
    Block(Block),
    Operation(Operation),
}

/// JSON-lines file feed. In follow mode the end of the file reports `Idle`
/// and later polls pick up appended lines.
pub struct JsonLinesFeed {
    reader: BufReader<File>,
    follow: bool,
    line_no: u64,
    partial: String,
    group: Vec<Operation>,
    ready: VecDeque<Block>,
}

impl JsonLinesFeed {
    pub async fn open(path: &str, follow: bool) -> Result<Self, DaemonError> {
        let file = File::open(path).await?;
        tracing::info!("Reading feed from {} (follow: {})", path, follow);
        Ok(Self {
            reader: BufReader::new(file),
            follow,
            line_no: 0,
            partial: String::new(),
            group: Vec::new(),
            ready: VecDeque::new(),
        })
    }

    /// Next complete line, or `None` at the current end of the file.
    async fn read_line(&mut self) -> Result<Option<String>, DaemonError> {
        self.reader.read_line(&mut self.partial).await?;
        let complete = self.partial.ends_with('\n');
        if complete || (!self.follow && !self.partial.is_empty()) {
            self.line_no += 1;
            return Ok(Some(mem::take(&mut self.partial)));
        }
        // A line still being written stays buffered until its newline lands.
        Ok(None)
    }

    fn push_line(&mut self, line: &str) -> Result<(), DaemonError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let parsed: FeedLine = serde_json::from_str(line).map_err(|e| DaemonError::Feed {
            line: self.line_no,
            message: e.to_string(),
        })?;
        match parsed {
            FeedLine::Block(block) => {
                self.flush_group();
                self.ready.push_back(block);
            }
            FeedLine::Operation(op) => {
                if self.group.first().map_or(false, |first| first.block_num != op.block_num) {
                    self.flush_group();
                }
                self.group.push(op);
            }
        }
        Ok(())
    }

    fn flush_group(&mut self) {
        let operations = mem::take(&mut self.group);
        let Some(first) = operations.first() else {
            return;
        };
        let header = BlockHeader {
            block_num: first.block_num,
            block_time: first.block_time,
            block_id: String::new(),
        };
        self.ready.push_back(Block { header, operations });
    }
}

#[async_trait]
impl OperationFeed for JsonLinesFeed {
    async fn next_block(&mut self) -> Result<FeedPoll, DaemonError> {
        loop {
            if let Some(block) = self.ready.pop_front() {
                return Ok(FeedPoll::Block(block));
            }
            match self.read_line().await? {
                Some(line) => self.push_line(&line)?,
                None if self.follow => return Ok(FeedPoll::Idle),
                None => {
                    self.flush_group();
                    return Ok(match self.ready.pop_front() {
                        Some(block) => FeedPoll::Block(block),
                        None => FeedPoll::Closed,
                    });
                }
            }
        }
    }
}
