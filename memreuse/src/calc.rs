//! Calc allocator for compute scratch groups.

use tracing::debug;

use crate::block::closest_size_level;
use crate::group::GroupIdx;
use crate::manager::MemReuseManager;
use crate::types::MemType;

impl MemReuseManager<'_> {
    /// Place calc groups, preferring TmpBuff blocks over queue and Calc blocks.
    pub(crate) fn alloc_calc_blocks(&mut self, mut order: Vec<GroupIdx>) {
        self.sort_by_life_start(&mut order);

        for idx in order {
            if !self.groups[idx.0].group_is_can_reuse_others {
                self.new_block(MemType::Calc, idx);
                continue;
            }

            let mut candidates = self.tmpbuf_candidates(idx);
            if candidates.is_empty() {
                candidates = self.queue_candidates(MemType::CopyIn, idx);
                candidates.extend(self.queue_candidates(MemType::CopyOut, idx));
                candidates.extend(self.calc_candidates(idx));
            }

            match closest_size_level(&self.blocks, candidates, self.groups[idx.0].max_size_level) {
                Some(pos) => self.join_block(pos, idx),
                None => self.new_block(MemType::Calc, idx),
            };
        }

        debug!(blocks = self.blocks.iter().filter(|b| b.mem_type == MemType::Calc).count(), "calc allocation complete");
    }
}
