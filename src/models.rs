use std::fmt;

use serde::Serialize;

use crate::numeric::{BigNum, BlockNumber};
use crate::stats::Statistics;

/// Identifies a block to read: a finalized height or the pending block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockTag {
    Number(BlockNumber),
    Pending,
}

impl BlockTag {
    pub fn number(&self) -> Option<&BlockNumber> {
        match self {
            BlockTag::Number(n) => Some(n),
            BlockTag::Pending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, BlockTag::Pending)
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Number(n) => write!(f, "{}", n),
            BlockTag::Pending => f.write_str("pending"),
        }
    }
}

impl From<BlockNumber> for BlockTag {
    fn from(number: BlockNumber) -> Self {
        BlockTag::Number(number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub hash: String,
    pub gas_price: BigNum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub number: BlockTag,
    pub hash: String,
    pub author: String,
    /// Unix seconds.
    pub timestamp: u64,
    pub gas_used: BigNum,
    pub gas_limit: BigNum,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn summary(&self) -> BlockSummary {
        BlockSummary {
            number: self.number.clone(),
            hash: self.hash.clone(),
            author: self.author.clone(),
            timestamp: self.timestamp,
            gas_used: self.gas_used.clone(),
            gas_limit: self.gas_limit.clone(),
            transaction_count: self.transactions.len(),
            pending: self.number.is_pending(),
        }
    }
}

/// Row shown in the block list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub number: BlockTag,
    pub hash: String,
    pub author: String,
    pub timestamp: u64,
    pub gas_used: BigNum,
    pub gas_limit: BigNum,
    pub transaction_count: usize,
    pub pending: bool,
}

/// Recent confirmed blocks, oldest first, plus the pending slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Window {
    confirmed: Vec<Block>,
    pending: Option<Block>,
}

impl Window {
    pub fn new(confirmed: Vec<Block>, pending: Option<Block>) -> Self {
        debug_assert!(
            confirmed
                .windows(2)
                .all(|pair| pair[0].number.number() < pair[1].number.number()),
            "confirmed blocks must be strictly increasing"
        );
        Self { confirmed, pending }
    }

    pub fn confirmed(&self) -> &[Block] {
        &self.confirmed
    }

    pub fn pending(&self) -> Option<&Block> {
        self.pending.as_ref()
    }

    pub fn newest_confirmed(&self) -> Option<&Block> {
        self.confirmed.last()
    }
}

/// One fully consistent published state of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub chain_label: String,
    pub latest_block_number: BlockNumber,
    pub window: Window,
    pub statistics: Statistics,
}

impl Snapshot {
    /// Timestamp of the newest confirmed block, or the epoch for an empty window.
    pub fn latest_block_time(&self) -> u64 {
        self.window
            .newest_confirmed()
            .map(|block| block.timestamp)
            .unwrap_or(0)
    }

    /// Looks up a confirmed block by number. The pending block is only
    /// reachable through [`Window::pending`].
    pub fn find_block(&self, number: &BlockNumber) -> Option<&Block> {
        self.window
            .confirmed()
            .iter()
            .find(|block| block.number.number() == Some(number))
    }

    pub fn block_summaries(&self) -> Vec<BlockSummary> {
        self.window
            .confirmed()
            .iter()
            .chain(self.window.pending())
            .map(Block::summary)
            .collect()
    }
}
