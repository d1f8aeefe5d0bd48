//! Port for block persistence
//!
//! Blocks are written once by the segmenter and read by everything downstream.

use crate::error::StoreResult;
use blocks_core::{Block, BlockId, BlockType, StoredBlock, Timestamp};

/// Filter for listing blocks
///
/// `start_time` keeps blocks starting at or after it, `end_time` keeps
/// blocks ending at or before it. Listings are ordered by start time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockQuery {
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub block_type: Option<BlockType>,
}

impl BlockQuery {
    pub fn since(start_time: Timestamp) -> Self {
        Self {
            start_time: Some(start_time),
            ..Default::default()
        }
    }

    pub fn matches(&self, block: &Block) -> bool {
        self.start_time.is_none_or(|s| block.start_time >= s)
            && self.end_time.is_none_or(|e| block.end_time <= e)
            && self.block_type.is_none_or(|t| block.block_type == t)
    }
}

/// Read operations for blocks
pub trait BlockReader: Send + Sync {
    /// Get a block by ID
    fn get_block(&self, id: BlockId) -> StoreResult<Option<StoredBlock>>;

    /// List blocks matching the query, ordered by start time
    fn list_blocks(&self, query: &BlockQuery) -> StoreResult<Vec<StoredBlock>>;

    /// Block with the most recent start time
    fn latest_block(&self) -> StoreResult<Option<StoredBlock>>;
}

/// Write operations for blocks
pub trait BlockWriter: Send + Sync {
    /// Persist blocks, returning the IDs assigned in input order
    fn save_blocks(&self, blocks: &[Block]) -> StoreResult<Vec<BlockId>>;
}

/// Combined repository trait
pub trait BlockRepository: BlockReader + BlockWriter {}

// Blanket implementation
impl<T: BlockReader + BlockWriter> BlockRepository for T {}
