//! Tensor groups: tensors the scheduler already decided must alias.
//!
//! Every distinct group id collapses into one [`TensorGroup`] whose lifetime
//! covers all members. Reuse decisions are made per group, never per tensor.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::lifetime::overlaps;
use crate::types::{AttrId, MemPosition, SizeLevel, TensorInfo, UNGROUPED};

/// Index of a group in the manager's group arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupIdx(pub usize);

/// Non-owning reference to a record in one of the caller's maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorHandle {
    Tensor(AttrId),
    TmpBuffer(AttrId),
}

impl TensorHandle {
    pub fn key(self) -> AttrId {
        match self {
            Self::Tensor(key) | Self::TmpBuffer(key) => key,
        }
    }
}

/// Aggregate of all tensors sharing one group id.
#[derive(Debug, Clone)]
pub struct TensorGroup {
    pub group_id: i64,
    pub grouped_tensors: SmallVec<[TensorHandle; 4]>,
    pub merged_life_start: i64,
    pub merged_life_end: i64,
    pub max_size_level: SizeLevel,
    pub mem_position: MemPosition,
    pub group_is_reusable: bool,
    pub group_is_can_reuse_others: bool,
    pub merged_loop_axes: BTreeSet<i64>,
}

impl TensorGroup {
    /// Group holding a single tensor, initialized verbatim from it.
    pub fn singleton(handle: TensorHandle, info: &TensorInfo) -> Self {
        Self {
            group_id: info.group_id,
            grouped_tensors: smallvec::smallvec![handle],
            merged_life_start: info.life_start,
            merged_life_end: info.life_end,
            max_size_level: info.size_level,
            mem_position: info.mem_position,
            group_is_reusable: info.is_reusable,
            group_is_can_reuse_others: info.is_can_reuse_others,
            merged_loop_axes: info.loop_axes.clone(),
        }
    }

    /// Fold another member into the aggregate.
    ///
    /// Reuse flags degrade to `false` on the first disagreement and stay there.
    pub fn absorb(&mut self, handle: TensorHandle, info: &TensorInfo) {
        self.grouped_tensors.push(handle);
        self.merged_life_start = self.merged_life_start.min(info.life_start);
        self.merged_life_end = self.merged_life_end.max(info.life_end);
        self.max_size_level = self.max_size_level.max(info.size_level);
        self.merged_loop_axes.extend(info.loop_axes.iter().copied());

        if self.group_is_reusable != info.is_reusable || self.group_is_can_reuse_others != info.is_can_reuse_others {
            self.group_is_reusable = false;
            self.group_is_can_reuse_others = false;
        }

        // Track the final sink, not an intermediate compute hop.
        if self.mem_position == MemPosition::VecCalc && info.mem_position != MemPosition::VecCalc {
            self.mem_position = info.mem_position;
        }
    }

    /// Whether the two groups' merged lifetimes overlap.
    pub fn overlaps(&self, other: &TensorGroup) -> bool {
        overlaps(self.merged_life_start, self.merged_life_end, other.merged_life_start, other.merged_life_end)
    }
}

/// Groups bucketed by memory class, as indices into the group arena.
#[derive(Debug, Default)]
pub struct GroupBuckets {
    pub copy_in: Vec<GroupIdx>,
    pub copy_out: Vec<GroupIdx>,
    pub calc: Vec<GroupIdx>,
}

/// Collapse tensors into groups and bucket the groups by final position.
///
/// Groups are pushed onto `arena` in first-seen order. Ungrouped tensors each
/// get a group of their own.
pub fn merge_groups(tensors: &BTreeMap<AttrId, TensorInfo>, arena: &mut Vec<TensorGroup>) -> GroupBuckets {
    let first = arena.len();
    let mut by_group_id: HashMap<i64, GroupIdx> = HashMap::new();

    for (&key, info) in tensors {
        let handle = TensorHandle::Tensor(key);

        if info.group_id != UNGROUPED
            && let Some(&idx) = by_group_id.get(&info.group_id)
        {
            arena[idx.0].absorb(handle, info);
            continue;
        }

        let idx = GroupIdx(arena.len());
        arena.push(TensorGroup::singleton(handle, info));
        if info.group_id != UNGROUPED {
            by_group_id.insert(info.group_id, idx);
        }
    }

    let mut buckets = GroupBuckets::default();
    for (offset, group) in arena[first..].iter().enumerate() {
        let idx = GroupIdx(first + offset);
        match group.mem_position {
            MemPosition::VecIn => buckets.copy_in.push(idx),
            MemPosition::VecOut => buckets.copy_out.push(idx),
            MemPosition::VecCalc | MemPosition::Invalid => buckets.calc.push(idx),
        }
        trace!(
            group_id = group.group_id,
            members = group.grouped_tensors.len(),
            life_start = group.merged_life_start,
            life_end = group.merged_life_end,
            position = %group.mem_position,
            "merged tensor group"
        );
    }

    debug!(
        tensors = tensors.len(),
        copy_in = buckets.copy_in.len(),
        copy_out = buckets.copy_out.len(),
        calc = buckets.calc.len(),
        "group merge complete"
    );

    buckets
}
