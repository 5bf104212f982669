//! Error types for memory reuse allocation.

use snafu::Snafu;

use crate::types::AttrId;

/// Result type for memory reuse operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur during memory block allocation.
///
/// The allocation heuristic itself is total. Only lifecycle misuse and the
/// opt-in strict attribute checks produce errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// `alloc_mem_blocks` was called a second time on the same manager.
    #[snafu(display("memory blocks were already allocated for this kernel"))]
    AlreadyAllocated,

    /// A tensor reached writeback without a record to write into.
    #[snafu(display("tensor {key} has no attribute record to receive its block id"))]
    InvalidTensorAttribute { key: AttrId },

    /// Input lifetime interval is inverted.
    #[snafu(display("tensor {key} has inverted lifetime [{life_start}, {life_end}]"))]
    InvalidLifetime { key: AttrId, life_start: i64, life_end: i64 },
}
