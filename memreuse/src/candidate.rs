//! Candidate search: which existing blocks a group may legally join.
//!
//! Candidates are returned as positions in the manager's block arena, in
//! creation order.

use crate::group::{GroupIdx, TensorGroup};
use crate::manager::MemReuseManager;
use crate::types::{MemType, SizeLevel};

impl MemReuseManager<'_> {
    /// Blocks of `mem_type` whose every member is reusable and lifetime-disjoint
    /// from `group`.
    pub(crate) fn disjoint_reusable_blocks(&self, mem_type: MemType, group: GroupIdx) -> Vec<usize> {
        let group = &self.groups[group.0];
        self.blocks_of(mem_type)
            .filter(|&pos| {
                self.members(pos).all(|member| member.group_is_reusable && !group.overlaps(member))
            })
            .collect()
    }

    /// Queue blocks of `mem_type` a non-queue group may borrow.
    ///
    /// Queue-position members must have finished strictly before the group
    /// starts and live in the same single loop. Groups above `Scalar` only go
    /// to blocks that already hold a `Largest` member.
    pub(crate) fn queue_candidates(&self, mem_type: MemType, group: GroupIdx) -> Vec<usize> {
        let group = &self.groups[group.0];
        self.blocks_of(mem_type)
            .filter(|&pos| self.members(pos).all(|member| queue_member_allows(member, group)))
            .filter(|&pos| {
                group.max_size_level == SizeLevel::Scalar
                    || self.members(pos).any(|member| member.max_size_level == SizeLevel::Largest)
            })
            .collect()
    }

    /// TmpBuff blocks whose every member is lifetime-disjoint from `group`.
    ///
    /// Members of each TmpBuff block are reordered by size level as part of
    /// the search unless disabled in the config.
    pub(crate) fn tmpbuf_candidates(&mut self, group: GroupIdx) -> Vec<usize> {
        let target = &self.groups[group.0];
        if !target.group_is_can_reuse_others && !target.group_is_reusable {
            return Vec::new();
        }

        if self.config.sort_tmpbuf_members {
            let groups = &self.groups;
            for block in self.blocks.iter_mut().filter(|b| b.mem_type == MemType::TmpBuff) {
                block.tensor_groups.sort_by_key(|member| groups[member.0].max_size_level);
            }
        }

        let target = &self.groups[group.0];
        self.blocks_of(MemType::TmpBuff)
            .filter(|&pos| self.members(pos).all(|member| !target.overlaps(member)))
            .collect()
    }

    /// Calc blocks whose every member is lifetime-disjoint from `group`.
    pub(crate) fn calc_candidates(&self, group: GroupIdx) -> Vec<usize> {
        let group = &self.groups[group.0];
        let gate = self.config.calc_reuse_requires_reusable;
        self.blocks_of(MemType::Calc)
            .filter(|&pos| {
                self.members(pos).all(|member| (!gate || member.group_is_reusable) && !group.overlaps(member))
            })
            .collect()
    }

    fn blocks_of(&self, mem_type: MemType) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().enumerate().filter(move |(_, b)| b.mem_type == mem_type).map(|(pos, _)| pos)
    }

    fn members(&self, pos: usize) -> impl Iterator<Item = &TensorGroup> + '_ {
        self.blocks[pos].tensor_groups.iter().map(|idx| &self.groups[idx.0])
    }
}

fn queue_member_allows(member: &TensorGroup, group: &TensorGroup) -> bool {
    if !member.group_is_reusable {
        return false;
    }
    if member.mem_position.is_queue() {
        // Strict ordering; an unbounded group never follows anything.
        let finished_before = member.merged_life_end < group.merged_life_start && !group.overlaps(member);
        let same_single_loop = member.merged_loop_axes.len() == 1 && member.merged_loop_axes == group.merged_loop_axes;
        finished_before && same_single_loop
    } else {
        !group.overlaps(member)
    }
}
