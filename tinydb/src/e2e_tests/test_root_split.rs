//! Test the first split: a full root leaf taking one more row.

use crate::e2e_tests::helpers::*;
use crate::storage::btree::{
    LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT, NodeType,
    internal, leaf, node,
};

#[test]
fn test_root_becomes_internal_after_split() {
    let mut test = TestTable::new();
    let capacity = u32::try_from(LEAF_NODE_MAX_CELLS).expect("fits");

    insert_ids(&mut test.table, 1..=capacity);
    assert_eq!(test.table.pager().num_pages(), 1);

    insert_ids(&mut test.table, [capacity + 1]);
    assert_eq!(test.table.pager().num_pages(), 3);

    let root = test.table.pager_mut().get_page(0).expect("root").clone();
    assert_eq!(node::node_type(&root), Ok(NodeType::Internal));
    assert!(node::is_root(&root));
    assert_eq!(internal::num_keys(&root), Ok(1));
    assert_eq!(
        internal::key(&root, 0),
        Ok(u32::try_from(LEAF_NODE_LEFT_SPLIT_COUNT).expect("fits"))
    );

    let left = internal::child(&root, 0).expect("left");
    let right = internal::right_child(&root);
    for (child, count) in [
        (left, LEAF_NODE_LEFT_SPLIT_COUNT),
        (right, LEAF_NODE_RIGHT_SPLIT_COUNT),
    ] {
        let page = test.table.pager_mut().get_page(child).expect("child");
        assert_eq!(node::node_type(page), Ok(NodeType::Leaf));
        assert_eq!(leaf::num_cells(page).expect("num cells") as usize, count);
    }

    assert_eq!(check_tree(&mut test.table), (1..=capacity + 1).collect::<Vec<_>>());
    assert_eq!(scan_ids(&mut test.table), (1..=capacity + 1).collect::<Vec<_>>());
}

#[test]
fn test_split_with_new_smallest_key() {
    let mut test = TestTable::new();
    let capacity = u32::try_from(LEAF_NODE_MAX_CELLS).expect("fits");

    insert_ids(&mut test.table, 2..=capacity + 1);
    insert_ids(&mut test.table, [1]);

    assert_eq!(check_tree(&mut test.table), (1..=capacity + 1).collect::<Vec<_>>());
    assert_eq!(test.table.get(1).expect("get"), Some(sample_row(1)));
}
