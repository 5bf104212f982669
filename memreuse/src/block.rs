//! Physical memory blocks and block selection.

use smallvec::SmallVec;

use crate::group::GroupIdx;
use crate::types::{MemType, SizeLevel};

/// One physical allocation unit: a queue slot or a scratch buffer.
#[derive(Debug, Clone)]
pub struct MemoryBlock {
    /// Queue id for CopyIn/CopyOut blocks, buffer id otherwise.
    pub id: i64,
    pub mem_type: MemType,
    /// Largest size level of any group placed in the block.
    pub max_size_level: SizeLevel,
    /// Groups sharing the block, in placement order.
    pub tensor_groups: SmallVec<[GroupIdx; 4]>,
}

impl MemoryBlock {
    pub fn new(id: i64, mem_type: MemType, first: GroupIdx, max_size_level: SizeLevel) -> Self {
        Self { id, mem_type, max_size_level, tensor_groups: smallvec::smallvec![first] }
    }
}

/// Pick the candidate whose size level is closest to `level`.
///
/// Candidates are positions in `blocks`. Ties keep the earliest candidate.
pub fn closest_size_level(
    blocks: &[MemoryBlock],
    candidates: impl IntoIterator<Item = usize>,
    level: SizeLevel,
) -> Option<usize> {
    candidates.into_iter().min_by_key(|&pos| blocks[pos].max_size_level.distance(level))
}
