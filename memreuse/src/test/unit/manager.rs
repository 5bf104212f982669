use std::collections::BTreeMap;

use crate::test::helpers::{allocate, allocate_with, attr, buf_id, keyed, tensor, tmp_buffer};
use crate::{
    AllocType, AttrId, Error, MemAttr, MemPosition, MemReuseManager, NO_ID, ReuseConfig, ReuseStats, SizeLevel,
    TensorInfo, UNGROUPED,
};

fn mixed_kernel() -> (BTreeMap<AttrId, TensorInfo>, BTreeMap<AttrId, TensorInfo>) {
    let tensors = keyed(vec![
        tensor(0, 0, 3, MemPosition::VecIn, SizeLevel::Largest),
        tensor(1, 4, 6, MemPosition::VecIn, SizeLevel::Largest),
        tensor(2, 5, 9, MemPosition::VecIn, SizeLevel::Medium),
        tensor(3, 1, 2, MemPosition::VecCalc, SizeLevel::Medium),
        tensor(3, 2, 4, MemPosition::VecCalc, SizeLevel::Medium),
        tensor(4, 5, 7, MemPosition::VecCalc, SizeLevel::Scalar),
        tensor(5, 7, 10, MemPosition::VecOut, SizeLevel::Largest),
        tensor(6, 11, 12, MemPosition::VecOut, SizeLevel::Largest),
    ]);
    let tmp_buffers = keyed(vec![
        tmp_buffer(UNGROUPED, 0, 2, SizeLevel::Medium),
        tmp_buffer(2, 3, 4, SizeLevel::Scalar),
        tmp_buffer(UNGROUPED, 8, 9, SizeLevel::Scalar),
    ]);
    (tensors, tmp_buffers)
}

#[test]
fn test_queue_writeback_fields() {
    let mut tensors = keyed(vec![TensorInfo { buf_num: 4, ..tensor(0, 0, 1, MemPosition::VecIn, SizeLevel::Scalar) }]);
    allocate(&mut tensors, &mut BTreeMap::new());

    let attr = attr(&tensors, 0);
    assert_eq!(attr.alloc_type, AllocType::Queue);
    assert_eq!(attr.queue_id, 0);
    assert_eq!(attr.queue_depth, 2);
    assert_eq!(attr.queue_buf_num, 4);
    assert_eq!(attr.buffer_id, NO_ID);
}

#[test]
fn test_buffer_writeback_clears_reuse_id() {
    let mut tensors = keyed(vec![TensorInfo {
        output_attr: Some(MemAttr { reuse_id: 9, ..Default::default() }),
        ..tensor(0, 0, 1, MemPosition::VecCalc, SizeLevel::Scalar)
    }]);
    allocate(&mut tensors, &mut BTreeMap::new());

    let attr = attr(&tensors, 0);
    assert_eq!(attr.alloc_type, AllocType::Buffer);
    assert_eq!(attr.buffer_id, 0);
    assert_eq!(attr.reuse_id, NO_ID);
    assert_eq!(attr.queue_id, NO_ID);
}

#[test]
fn test_configured_queue_depth_is_stamped() {
    let mut tensors = keyed(vec![tensor(0, 0, 1, MemPosition::VecOut, SizeLevel::Scalar)]);
    let config = ReuseConfig::builder().queue_depth(3).build();
    allocate_with(&mut tensors, &mut BTreeMap::new(), config);

    assert_eq!(attr(&tensors, 0).queue_depth, 3);
}

#[test]
fn test_grouped_tensors_share_writeback() {
    let mut tensors = keyed(vec![
        tensor(8, 0, 1, MemPosition::VecCalc, SizeLevel::Scalar),
        tensor(8, 4, 5, MemPosition::VecCalc, SizeLevel::Medium),
    ]);
    let (stats, _) = allocate(&mut tensors, &mut BTreeMap::new());

    assert_eq!(stats.groups, 1);
    assert_eq!(attr(&tensors, 0), attr(&tensors, 1));
}

#[test]
fn test_missing_output_attr_is_skipped() {
    let mut tensors = keyed(vec![
        TensorInfo { output_attr: None, ..tensor(0, 0, 1, MemPosition::VecCalc, SizeLevel::Scalar) },
        tensor(1, 3, 4, MemPosition::VecCalc, SizeLevel::Scalar),
    ]);
    let (stats, _) = allocate(&mut tensors, &mut BTreeMap::new());

    assert_eq!(stats.calc_blocks, 1);
    assert!(tensors[&AttrId(0)].output_attr.is_none());
    assert_eq!(attr(&tensors, 1).buffer_id, 0);
}

#[test]
fn test_strict_rejects_missing_output_attr() {
    let mut tensors =
        keyed(vec![TensorInfo { output_attr: None, ..tensor(0, 0, 1, MemPosition::VecCalc, SizeLevel::Scalar) }]);
    let mut tmp_buffers = BTreeMap::new();
    let config = ReuseConfig::builder().strict_attributes(true).build();
    let mut manager = MemReuseManager::with_config(&mut tensors, &mut tmp_buffers, config);

    let err = manager.alloc_mem_blocks().unwrap_err();
    assert!(matches!(err, Error::InvalidTensorAttribute { key: AttrId(0) }));
    assert!(manager.blocks().is_empty());
}

#[test]
fn test_strict_rejects_missing_tmp_buffer_record() {
    let mut tmp_buffers =
        keyed(vec![TensorInfo { tmp_buffer: None, ..tmp_buffer(UNGROUPED, 0, 1, SizeLevel::Scalar) }]);
    let mut tensors = BTreeMap::new();
    let config = ReuseConfig::builder().strict_attributes(true).build();
    let mut manager = MemReuseManager::with_config(&mut tensors, &mut tmp_buffers, config);

    assert!(matches!(manager.alloc_mem_blocks(), Err(Error::InvalidTensorAttribute { .. })));
}

#[test]
fn test_strict_rejects_inverted_lifetime() {
    let mut tensors = keyed(vec![tensor(0, 5, 1, MemPosition::VecCalc, SizeLevel::Scalar)]);
    let mut tmp_buffers = BTreeMap::new();
    let config = ReuseConfig::builder().strict_attributes(true).build();
    let mut manager = MemReuseManager::with_config(&mut tensors, &mut tmp_buffers, config);

    let err = manager.alloc_mem_blocks().unwrap_err();
    assert!(matches!(err, Error::InvalidLifetime { life_start: 5, life_end: 1, .. }));
}

#[test]
fn test_second_allocation_is_rejected() {
    let (mut tensors, mut tmp_buffers) = mixed_kernel();
    let mut manager = MemReuseManager::new(&mut tensors, &mut tmp_buffers);
    manager.alloc_mem_blocks().unwrap();
    let blocks = manager.blocks().len();

    assert!(matches!(manager.alloc_mem_blocks(), Err(Error::AlreadyAllocated)));
    assert_eq!(manager.blocks().len(), blocks);
}

#[test]
fn test_empty_kernel() {
    let (stats, que_nums) = allocate(&mut BTreeMap::new(), &mut BTreeMap::new());

    assert_eq!(stats, ReuseStats::default());
    assert_eq!(que_nums, (0, 0));
}

#[test]
fn test_mixed_kernel_assignment() {
    let (mut tensors, mut tmp_buffers) = mixed_kernel();
    let (stats, que_nums) = allocate(&mut tensors, &mut tmp_buffers);

    // CopyIn: 0-3 opens q0, 4-6 avoids it (q1), 5-9 overlaps q1 and takes q0.
    assert_eq!(que_nums, (2, 2));
    assert_eq!(attr(&tensors, 0).queue_id, 0);
    assert_eq!(attr(&tensors, 1).queue_id, 1);
    assert_eq!(attr(&tensors, 2).queue_id, 0);

    // CopyOut: 7-10 opens q2; 11-12 could only take the previous block, so q3.
    assert_eq!(attr(&tensors, 6).queue_id, 2);
    assert_eq!(attr(&tensors, 7).queue_id, 3);
    assert_eq!(stats.copy_out_blocks, 2);

    // Temp buffers: b0 global, b1 loop-scoped, 8-9 joins b0.
    assert_eq!(buf_id(&tmp_buffers, 0), 0);
    assert_eq!(buf_id(&tmp_buffers, 1), 1);
    assert_eq!(buf_id(&tmp_buffers, 2), 0);

    // Calc group 3 (1-4) overlaps b0; the Scalar group 4 (5-7) fits into b0.
    assert_eq!(attr(&tensors, 3).alloc_type, AllocType::Buffer);
    assert_eq!(attr(&tensors, 3), attr(&tensors, 4));
    assert_eq!(attr(&tensors, 3).buffer_id, 2);
    assert_eq!(attr(&tensors, 5).buffer_id, 0);
    assert_eq!(stats.calc_blocks, 1);
    assert_eq!(stats.tmp_buff_blocks, 1);
    assert_eq!(stats.loop_tmp_buff_blocks, 1);
}

#[test]
fn test_allocation_is_deterministic() {
    let (mut tensors_a, mut tmp_a) = mixed_kernel();
    let (mut tensors_b, mut tmp_b) = mixed_kernel();
    allocate(&mut tensors_a, &mut tmp_a);
    allocate(&mut tensors_b, &mut tmp_b);

    assert_eq!(tensors_a, tensors_b);
    assert_eq!(tmp_a, tmp_b);
}
