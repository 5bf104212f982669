//! Temp-buffer allocator.
//!
//! Loop-scoped buffers (those carrying a group id) always get a private
//! `LoopTmpBuff` block since reuse across loop iterations cannot be proven
//! safe here. Global buffers share `TmpBuff` blocks when lifetimes allow.

use tracing::{debug, trace};

use crate::block::closest_size_level;
use crate::group::{GroupIdx, TensorGroup, TensorHandle};
use crate::manager::MemReuseManager;
use crate::types::{AttrId, MemType, UNGROUPED};

impl MemReuseManager<'_> {
    pub(crate) fn alloc_tmp_buffers(&mut self) {
        let keys: Vec<AttrId> = self.tmp_buffers.keys().copied().collect();

        for key in keys {
            let group = TensorGroup::singleton(TensorHandle::TmpBuffer(key), &self.tmp_buffers[&key]);
            let loop_scoped = group.group_id != UNGROUPED;
            let level = group.max_size_level;
            let idx = GroupIdx(self.groups.len());
            self.groups.push(group);

            let block_id = if loop_scoped {
                self.new_block(MemType::LoopTmpBuff, idx)
            } else {
                let candidates = self.tmpbuf_candidates(idx);
                match closest_size_level(&self.blocks, candidates, level) {
                    Some(pos) => self.join_block(pos, idx),
                    None => self.new_block(MemType::TmpBuff, idx),
                }
            };

            match self.tmp_buffers.get_mut(&key).and_then(|info| info.tmp_buffer.as_mut()) {
                Some(record) => record.buf_id = block_id,
                None => trace!(%key, "temp buffer has no record, skipping id writeback"),
            }
        }

        debug!(
            tmp_buffers = self.tmp_buffers.len(),
            tmp_buff_blocks = self.blocks.iter().filter(|b| b.mem_type == MemType::TmpBuff).count(),
            "temp buffer allocation complete"
        );
    }
}
