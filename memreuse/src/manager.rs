//! Memory reuse manager for one compiled kernel.
//!
//! Assigns every scheduled tensor to a physical memory block, reusing blocks
//! across tensor groups whose lifetimes never overlap.
//!
//! # Algorithm
//!
//! 1. **Group Merge**: Collapse tensors sharing a group id into one aggregate
//! 2. **Queue Allocation**: CopyIn groups, then CopyOut groups, with a
//!    double-buffer hazard guard on the most recently used block
//! 3. **Temp Buffers**: Loop-scoped buffers get private blocks, global ones share
//! 4. **Calc Allocation**: Search TmpBuff, then queue and Calc blocks
//! 5. **Writeback**: Stamp block ids onto the caller's attribute records

use std::collections::{BTreeMap, BTreeSet};

use snafu::ensure;
use tracing::{debug, trace};

use crate::block::MemoryBlock;
use crate::config::ReuseConfig;
use crate::error::*;
use crate::group::{GroupIdx, TensorGroup, merge_groups};
use crate::types::{AttrId, MemType, TensorInfo};

/// Summary of one allocation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReuseStats {
    pub copy_in_blocks: usize,
    pub copy_out_blocks: usize,
    pub calc_blocks: usize,
    pub tmp_buff_blocks: usize,
    pub loop_tmp_buff_blocks: usize,
    /// Groups considered, including temp-buffer singletons.
    pub groups: usize,
    /// Groups placed into a block that already existed.
    pub reused_groups: usize,
}

impl ReuseStats {
    pub fn total_blocks(&self) -> usize {
        self.copy_in_blocks + self.copy_out_blocks + self.calc_blocks + self.tmp_buff_blocks + self.loop_tmp_buff_blocks
    }
}

/// Greedy interval-based block allocator.
///
/// Holds exclusive borrows of the caller's tensor and temp-buffer maps for
/// its whole lifetime, so neither can change under an allocation pass.
#[derive(Debug)]
pub struct MemReuseManager<'a> {
    pub(crate) tensors: &'a mut BTreeMap<AttrId, TensorInfo>,
    pub(crate) tmp_buffers: &'a mut BTreeMap<AttrId, TensorInfo>,
    pub(crate) config: ReuseConfig,
    pub(crate) groups: Vec<TensorGroup>,
    pub(crate) blocks: Vec<MemoryBlock>,
    next_queue_id: i64,
    next_buffer_id: i64,
    reused_groups: usize,
    allocated: bool,
}

impl<'a> MemReuseManager<'a> {
    pub fn new(
        tensors: &'a mut BTreeMap<AttrId, TensorInfo>,
        tmp_buffers: &'a mut BTreeMap<AttrId, TensorInfo>,
    ) -> Self {
        Self::with_config(tensors, tmp_buffers, ReuseConfig::default())
    }

    pub fn with_config(
        tensors: &'a mut BTreeMap<AttrId, TensorInfo>,
        tmp_buffers: &'a mut BTreeMap<AttrId, TensorInfo>,
        config: ReuseConfig,
    ) -> Self {
        Self {
            tensors,
            tmp_buffers,
            config,
            groups: Vec::new(),
            blocks: Vec::new(),
            next_queue_id: 0,
            next_buffer_id: 0,
            reused_groups: 0,
            allocated: false,
        }
    }

    /// Run the full allocation pipeline and write block ids back.
    ///
    /// May run only once per manager.
    pub fn alloc_mem_blocks(&mut self) -> Result<()> {
        ensure!(!self.allocated, AlreadyAllocatedSnafu);
        if self.config.strict_attributes {
            self.validate()?;
        }
        self.allocated = true;

        let buckets = merge_groups(&*self.tensors, &mut self.groups);

        self.alloc_queue_blocks(MemType::CopyIn, buckets.copy_in);
        self.alloc_queue_blocks(MemType::CopyOut, buckets.copy_out);
        self.alloc_tmp_buffers();
        self.alloc_calc_blocks(buckets.calc);
        self.write_back();

        let stats = self.stats();
        debug!(
            groups = stats.groups,
            blocks = stats.total_blocks(),
            reused_groups = stats.reused_groups,
            copy_in = stats.copy_in_blocks,
            copy_out = stats.copy_out_blocks,
            "memory reuse complete"
        );

        Ok(())
    }

    /// Number of distinct CopyIn and CopyOut queues.
    pub fn copy_in_copy_out_que_nums(&self) -> (usize, usize) {
        let distinct = |mem_type: MemType| {
            self.blocks.iter().filter(|b| b.mem_type == mem_type).map(|b| b.id).collect::<BTreeSet<_>>().len()
        };
        (distinct(MemType::CopyIn), distinct(MemType::CopyOut))
    }

    pub fn stats(&self) -> ReuseStats {
        let mut stats =
            ReuseStats { groups: self.groups.len(), reused_groups: self.reused_groups, ..Default::default() };
        for block in &self.blocks {
            match block.mem_type {
                MemType::CopyIn => stats.copy_in_blocks += 1,
                MemType::CopyOut => stats.copy_out_blocks += 1,
                MemType::Calc => stats.calc_blocks += 1,
                MemType::TmpBuff => stats.tmp_buff_blocks += 1,
                MemType::LoopTmpBuff => stats.loop_tmp_buff_blocks += 1,
            }
        }
        stats
    }

    /// Blocks in creation order.
    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    pub fn group(&self, idx: GroupIdx) -> &TensorGroup {
        &self.groups[idx.0]
    }

    pub fn config(&self) -> &ReuseConfig {
        &self.config
    }

    /// Open a new block holding `group` and return its id.
    pub(crate) fn new_block(&mut self, mem_type: MemType, group: GroupIdx) -> i64 {
        let counter = if mem_type.is_queue() { &mut self.next_queue_id } else { &mut self.next_buffer_id };
        let id = *counter;
        *counter += 1;

        let level = self.groups[group.0].max_size_level;
        self.blocks.push(MemoryBlock::new(id, mem_type, group, level));
        trace!(block_id = id, %mem_type, group_id = self.groups[group.0].group_id, "opened block");
        id
    }

    /// Place `group` into the block at position `pos` and return its id.
    pub(crate) fn join_block(&mut self, pos: usize, group: GroupIdx) -> i64 {
        let level = self.groups[group.0].max_size_level;
        let block = &mut self.blocks[pos];
        block.tensor_groups.push(group);
        block.max_size_level = block.max_size_level.max(level);
        self.reused_groups += 1;
        trace!(
            block_id = block.id,
            mem_type = %block.mem_type,
            group_id = self.groups[group.0].group_id,
            "reused block"
        );
        block.id
    }

    /// Sort by `(merged_life_start, group_id)`; remaining ties keep input order.
    pub(crate) fn sort_by_life_start(&self, order: &mut [GroupIdx]) {
        order.sort_by_key(|idx| {
            let group = &self.groups[idx.0];
            (group.merged_life_start, group.group_id)
        });
    }

    fn validate(&self) -> Result<()> {
        for (&key, info) in self.tensors.iter() {
            ensure!(
                info.life_start <= info.life_end,
                InvalidLifetimeSnafu { key, life_start: info.life_start, life_end: info.life_end }
            );
            ensure!(info.output_attr.is_some(), InvalidTensorAttributeSnafu { key });
        }
        for (&key, info) in self.tmp_buffers.iter() {
            ensure!(
                info.life_start <= info.life_end,
                InvalidLifetimeSnafu { key, life_start: info.life_start, life_end: info.life_end }
            );
            ensure!(info.tmp_buffer.is_some(), InvalidTensorAttributeSnafu { key });
        }
        Ok(())
    }
}
