//! In-memory block repository

use blocks_core::{Block, BlockId, StoredBlock};
use blocks_ports::{BlockQuery, BlockReader, BlockWriter, StoreResult};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// In-memory block repository
///
/// Thread-safe storage for blocks using DashMap. IDs start at 1.
pub struct InMemoryBlockRepository {
    blocks: Arc<DashMap<BlockId, StoredBlock>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryBlockRepository {
    pub fn new() -> Self {
        Self {
            blocks: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for InMemoryBlockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryBlockRepository {
    fn clone(&self) -> Self {
        Self {
            blocks: Arc::clone(&self.blocks),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl BlockReader for InMemoryBlockRepository {
    fn get_block(&self, id: BlockId) -> StoreResult<Option<StoredBlock>> {
        Ok(self.blocks.get(&id).map(|b| b.value().clone()))
    }

    fn list_blocks(&self, query: &BlockQuery) -> StoreResult<Vec<StoredBlock>> {
        let mut blocks: Vec<StoredBlock> = self
            .blocks
            .iter()
            .filter(|b| query.matches(&b.block))
            .map(|b| b.value().clone())
            .collect();
        blocks.sort_by(|a, b| {
            a.block
                .start_time
                .cmp(&b.block.start_time)
                .then(a.id.cmp(&b.id))
        });
        Ok(blocks)
    }

    fn latest_block(&self) -> StoreResult<Option<StoredBlock>> {
        Ok(self
            .blocks
            .iter()
            .max_by(|a, b| {
                a.block
                    .start_time
                    .cmp(&b.block.start_time)
                    .then(a.id.cmp(&b.id))
            })
            .map(|b| b.value().clone()))
    }
}

impl BlockWriter for InMemoryBlockRepository {
    fn save_blocks(&self, blocks: &[Block]) -> StoreResult<Vec<BlockId>> {
        let ids = blocks
            .iter()
            .map(|block| {
                let id = BlockId(self.next_id.fetch_add(1, Ordering::SeqCst));
                self.blocks.insert(id, StoredBlock::new(id, block.clone()));
                id
            })
            .collect();
        Ok(ids)
    }
}
