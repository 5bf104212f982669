//! Queue allocator for CopyIn and CopyOut groups.
//!
//! Besides the lifetime check, the block that received the immediately
//! preceding group is avoided: a double-buffered producer and consumer
//! sharing it would collide mid-pipeline. It is only taken when more than
//! `db_reuse_threshold` blocks of the same type already exist.

use tracing::{debug, trace};

use crate::block::closest_size_level;
use crate::group::GroupIdx;
use crate::manager::MemReuseManager;
use crate::types::MemType;

impl MemReuseManager<'_> {
    pub(crate) fn alloc_queue_blocks(&mut self, mem_type: MemType, mut order: Vec<GroupIdx>) {
        self.sort_by_life_start(&mut order);

        let mut last_block_id: Option<i64> = None;
        for idx in order {
            let block_id = if !self.groups[idx.0].group_is_can_reuse_others {
                self.new_block(mem_type, idx)
            } else {
                match self.select_queue_block(mem_type, idx, last_block_id) {
                    Some(pos) => self.join_block(pos, idx),
                    None => self.new_block(mem_type, idx),
                }
            };
            last_block_id = Some(block_id);
        }

        let blocks = self.blocks.iter().filter(|b| b.mem_type == mem_type).count();
        debug!(%mem_type, blocks, "queue allocation complete");
    }

    fn select_queue_block(&self, mem_type: MemType, idx: GroupIdx, last_block_id: Option<i64>) -> Option<usize> {
        let candidates = self.disjoint_reusable_blocks(mem_type, idx);
        if candidates.is_empty() {
            return None;
        }

        let (last, others): (Vec<usize>, Vec<usize>) =
            candidates.into_iter().partition(|&pos| Some(self.blocks[pos].id) == last_block_id);
        if !others.is_empty() {
            return closest_size_level(&self.blocks, others, self.groups[idx.0].max_size_level);
        }

        let existing = self.blocks.iter().filter(|b| b.mem_type == mem_type).count();
        if existing > self.config.db_reuse_threshold {
            return last.first().copied();
        }

        trace!(
            group_id = self.groups[idx.0].group_id,
            existing,
            threshold = self.config.db_reuse_threshold,
            "only the previous block fits, opening a new one"
        );
        None
    }
}
