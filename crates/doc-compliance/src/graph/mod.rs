//! In-memory block graph built from an analysis result.
//!
//! Blocks live in a single arena in their original order. Two indices are
//! built once at construction: id to arena slot for relationship traversal,
//! and type to ordered arena slots for rule scans. The graph is never
//! mutated afterwards.

mod block;
mod resolve;

pub use block::{Block, BlockDecodeError, BlockId, BlockType, RelationType, Relationship};

use std::collections::HashMap;

use block::RawBlock;
use serde_json::Value;
use tracing::debug;

/// A record that was dropped while building the graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("skipped block record {index}: {reason}")]
pub struct MalformedBlock {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BlockGraph {
    blocks: Vec<Block>,
    by_id: HashMap<BlockId, usize>,
    by_type: HashMap<BlockType, Vec<usize>>,
    malformed: Vec<MalformedBlock>,
}

impl BlockGraph {
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut graph = Self::default();
        for (index, block) in blocks.into_iter().enumerate() {
            graph.push(index, block);
        }
        graph.log_skipped();
        graph
    }

    /// Build from loosely-typed service records, skipping any record that
    /// does not decode or lacks an id or type.
    pub fn from_records(records: impl IntoIterator<Item = Value>) -> Self {
        let mut graph = Self::default();
        for (index, record) in records.into_iter().enumerate() {
            let decoded = serde_json::from_value::<RawBlock>(record)
                .map_err(|err| err.to_string())
                .and_then(|raw| Block::try_from(raw).map_err(|err| err.to_string()));

            match decoded {
                Ok(block) => graph.push(index, block),
                Err(reason) => graph.malformed.push(MalformedBlock { index, reason }),
            }
        }
        graph.log_skipped();
        graph
    }

    fn push(&mut self, index: usize, block: Block) {
        if self.by_id.contains_key(&block.id) {
            self.malformed.push(MalformedBlock {
                index,
                reason: format!("duplicate block id {}", block.id),
            });
            return;
        }

        let slot = self.blocks.len();
        self.by_id.insert(block.id.clone(), slot);
        self.by_type
            .entry(block.block_type.clone())
            .or_default()
            .push(slot);
        self.blocks.push(block);
    }

    fn log_skipped(&self) {
        if !self.malformed.is_empty() {
            debug!(
                kept = self.blocks.len(),
                skipped = self.malformed.len(),
                "block graph built with skipped records"
            );
        }
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.by_id.get(id).map(|&slot| &self.blocks[slot])
    }

    /// Blocks of one type in original order.
    pub fn of_type<'a>(&'a self, block_type: &BlockType) -> impl Iterator<Item = &'a Block> + 'a {
        self.by_type
            .get(block_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&slot| &self.blocks[slot])
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn skipped_records(&self) -> usize {
        self.malformed.len()
    }

    pub fn malformed(&self) -> &[MalformedBlock] {
        &self.malformed
    }

    /// Text carried by a block, falling back to its `CHILD` words.
    pub fn text_of(&self, block: &Block) -> Option<String> {
        if let Some(text) = &block.text {
            return Some(text.clone());
        }

        let words: Vec<&str> = block
            .relationships
            .iter()
            .filter(|relationship| relationship.kind == RelationType::Child)
            .flat_map(|relationship| relationship.ids.iter())
            .filter_map(|id| self.get(id.as_str()))
            .filter(|child| child.block_type == BlockType::Word)
            .filter_map(|child| child.text.as_deref())
            .collect();

        if words.is_empty() {
            None
        } else {
            Some(words.join(" "))
        }
    }
}
