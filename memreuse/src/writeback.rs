//! Attribute writeback: the only externally visible effect of allocation.

use tracing::{debug, trace};

use crate::group::TensorHandle;
use crate::manager::MemReuseManager;
use crate::types::{AllocType, NO_ID};

impl MemReuseManager<'_> {
    /// Stamp every tensor's output attribute with the block it landed in.
    ///
    /// Tensors without an output attribute are skipped.
    pub(crate) fn write_back(&mut self) {
        let queue_depth = self.config.queue_depth;
        let mut stamped = 0usize;

        for block in &self.blocks {
            for group in &block.tensor_groups {
                for &handle in &self.groups[group.0].grouped_tensors {
                    let info = match handle {
                        TensorHandle::Tensor(key) => self.tensors.get_mut(&key),
                        TensorHandle::TmpBuffer(key) => self.tmp_buffers.get_mut(&key),
                    };
                    let Some(info) = info else { continue };
                    let buf_num = info.buf_num;
                    let Some(attr) = info.output_attr.as_mut() else {
                        trace!(key = %handle.key(), "no output attribute, skipping");
                        continue;
                    };

                    if block.mem_type.is_queue() {
                        attr.alloc_type = AllocType::Queue;
                        attr.queue_id = block.id;
                        attr.queue_depth = queue_depth;
                        attr.queue_buf_num = buf_num;
                    } else {
                        attr.alloc_type = AllocType::Buffer;
                        attr.buffer_id = block.id;
                        attr.reuse_id = NO_ID;
                    }
                    stamped += 1;
                }
            }
        }

        debug!(stamped, "attribute writeback complete");
    }
}
