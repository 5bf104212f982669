//! Memory reuse for kernel queue slots and scratch buffers.
//!
//! Given scheduled tensors annotated with lifetime intervals, memory
//! positions and coarse size levels, this crate assigns every tensor to a
//! physical memory block and reuses blocks across tensors whose lifetimes
//! never overlap. It runs once per compiled kernel, after liveness analysis
//! and before code generation.
//!
//! # Module Organization
//!
//! - [`lifetime`] - Closed-interval overlap predicate
//! - [`group`] - Merging tensors that must alias into groups
//! - [`block`] - Physical blocks and size-level matching
//! - [`manager`] - [`MemReuseManager`] driving the whole pass
//! - [`config`] - [`ReuseConfig`] with builder and environment fallbacks
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use morok_memreuse::{AttrId, MemAttr, MemPosition, MemReuseManager, TensorInfo};
//!
//! let tensor = |life_start, life_end| TensorInfo {
//!     life_start,
//!     life_end,
//!     mem_position: MemPosition::VecCalc,
//!     is_reusable: true,
//!     is_can_reuse_others: true,
//!     output_attr: Some(MemAttr::default()),
//!     ..Default::default()
//! };
//!
//! let mut tensors = BTreeMap::from([(AttrId(0), tensor(0, 2)), (AttrId(1), tensor(3, 5))]);
//! let mut tmp_buffers = BTreeMap::new();
//!
//! let mut manager = MemReuseManager::new(&mut tensors, &mut tmp_buffers);
//! manager.alloc_mem_blocks()?;
//! assert_eq!(manager.stats().calc_blocks, 1);
//! drop(manager);
//!
//! let first = tensors[&AttrId(0)].output_attr.as_ref().unwrap().buffer_id;
//! let second = tensors[&AttrId(1)].output_attr.as_ref().unwrap().buffer_id;
//! assert_eq!(first, second);
//! # Ok::<(), morok_memreuse::Error>(())
//! ```

pub mod block;
pub mod config;
pub mod error;
pub mod group;
pub mod lifetime;
pub mod manager;
pub mod types;

mod calc;
mod candidate;
mod queue;
mod tmpbuf;
mod writeback;


pub use block::MemoryBlock;
pub use config::ReuseConfig;
pub use error::{Error, Result};
pub use group::{GroupIdx, TensorGroup, TensorHandle};
pub use lifetime::overlaps;
pub use manager::{MemReuseManager, ReuseStats};
pub use types::{
    AllocType, AttrId, MemAttr, MemPosition, MemType, NO_ID, SizeLevel, TensorInfo, TmpBufferAttr, UNBOUNDED_LIFE,
    UNGROUPED,
};
