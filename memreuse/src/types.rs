//! Input and output records shared with the surrounding compile pipeline.
//!
//! [`TensorInfo`] is produced by the liveness pass and owned by the caller.
//! The allocator only reads it, except for the two writeback sinks
//! ([`MemAttr`] and [`TmpBufferAttr`]) that receive the final block ids.

use std::collections::BTreeSet;
use std::fmt;

use strum::{Display, VariantArray};

/// Lifetime end marking a tensor that stays live until the kernel exits.
pub const UNBOUNDED_LIFE: i64 = i64::MAX;

/// Group id of a tensor that does not alias any other tensor.
pub const UNGROUPED: i64 = -1;

/// "No id" sentinel stamped into unused id fields.
pub const NO_ID: i64 = -1;

/// Default double-buffer depth of a tensor.
pub const DEFAULT_BUF_NUM: i64 = 2;

/// Opaque identity of a caller-owned attribute record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(pub u64);

impl fmt::Display for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a tensor lives in the vector unit's memory hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, VariantArray)]
pub enum MemPosition {
    /// Staged in by a CopyIn queue.
    VecIn,
    /// Staged out by a CopyOut queue.
    VecOut,
    /// Compute scratch.
    VecCalc,
    #[default]
    Invalid,
}

impl MemPosition {
    /// Whether tensors at this position are served by a hardware queue.
    pub fn is_queue(self) -> bool {
        matches!(self, Self::VecIn | Self::VecOut)
    }
}

/// Coarse footprint bucket used instead of byte sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display, VariantArray)]
pub enum SizeLevel {
    #[default]
    Scalar,
    Medium,
    Largest,
}

impl SizeLevel {
    /// Number of tiers between two levels.
    pub fn distance(self, other: SizeLevel) -> u8 {
        (self as u8).abs_diff(other as u8)
    }
}

/// Kind of a physical memory block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, VariantArray)]
pub enum MemType {
    CopyIn,
    CopyOut,
    Calc,
    TmpBuff,
    LoopTmpBuff,
}

impl MemType {
    /// Queue blocks draw ids from the queue sequence, all others from the buffer sequence.
    pub fn is_queue(self) -> bool {
        matches!(self, Self::CopyIn | Self::CopyOut)
    }
}

/// Allocation kind stamped on a tensor during writeback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum AllocType {
    #[default]
    Unassigned,
    Queue,
    Buffer,
}

/// Caller-owned memory attribute of a tensor output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemAttr {
    pub alloc_type: AllocType,
    pub queue_id: i64,
    pub queue_depth: i64,
    pub queue_buf_num: i64,
    pub buffer_id: i64,
    pub reuse_id: i64,
}

impl Default for MemAttr {
    fn default() -> Self {
        Self {
            alloc_type: AllocType::Unassigned,
            queue_id: NO_ID,
            queue_depth: NO_ID,
            queue_buf_num: NO_ID,
            buffer_id: NO_ID,
            reuse_id: NO_ID,
        }
    }
}

/// Caller-owned record of a raw temporary buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmpBufferAttr {
    pub buf_id: i64,
}

impl Default for TmpBufferAttr {
    fn default() -> Self {
        Self { buf_id: NO_ID }
    }
}

/// Liveness facts about one scheduled tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    /// Alias group assigned by the scheduler, [`UNGROUPED`] if none.
    pub group_id: i64,
    /// Writeback sink for tensor outputs. `None` for temporary buffers.
    pub output_attr: Option<MemAttr>,
    /// Writeback sink for temporary buffers.
    pub tmp_buffer: Option<TmpBufferAttr>,
    pub life_start: i64,
    /// Inclusive. [`UNBOUNDED_LIFE`] keeps the tensor live forever.
    pub life_end: i64,
    pub mem_position: MemPosition,
    pub size_level: SizeLevel,
    /// Later tensors may take over this tensor's storage.
    pub is_reusable: bool,
    /// This tensor may be placed into an existing block.
    pub is_can_reuse_others: bool,
    pub loop_axes: BTreeSet<i64>,
    pub buf_num: i64,
}

impl Default for TensorInfo {
    fn default() -> Self {
        Self {
            group_id: UNGROUPED,
            output_attr: None,
            tmp_buffer: None,
            life_start: 0,
            life_end: 0,
            mem_position: MemPosition::Invalid,
            size_level: SizeLevel::Scalar,
            is_reusable: false,
            is_can_reuse_others: false,
            loop_axes: BTreeSet::new(),
            buf_num: DEFAULT_BUF_NUM,
        }
    }
}
