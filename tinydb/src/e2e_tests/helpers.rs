//! Common helpers for end-to-end tests.

use crate::Table;
use crate::storage::btree::{NodeType, internal, leaf, node};
use crate::storage::{Page, PageNum};
pub use crate::testing::{TestTable, sample_row, scan_ids};

/// Insert `sample_row(id)` for every id, in order.
pub fn insert_ids(table: &mut Table, ids: impl IntoIterator<Item = u32>) {
    for id in ids {
        table
            .insert(&sample_row(id))
            .unwrap_or_else(|e| panic!("insert {id} failed: {e}"));
    }
}

/// Snapshot of every resident page, for checking that a failed operation
/// changed nothing.
pub fn snapshot(table: &mut Table) -> Vec<Page> {
    let num_pages = table.pager().num_pages();
    (0..num_pages)
        .map(|n| table.pager_mut().get_page(n).expect("page").clone())
        .collect()
}

/// Walk the whole tree and check its structural invariants:
/// - leaf keys strictly increase
/// - every routing key equals the max of its child subtree
/// - every non-root node's parent pointer names the node that lists it
///
/// Returns the keys of all leaves in order.
pub fn check_tree(table: &mut Table) -> Vec<u32> {
    let root = table.root_page_num();
    let page = table.pager_mut().get_page(root).expect("root");
    assert!(node::is_root(page), "page {root} is not marked as root");

    let mut keys = Vec::new();
    check_node(table, root, &mut keys);
    assert!(
        keys.windows(2).all(|w| w[0] < w[1]),
        "keys are not strictly increasing"
    );
    keys
}

fn check_node(table: &mut Table, page_num: PageNum, keys: &mut Vec<u32>) {
    let page = table.pager_mut().get_page(page_num).expect("page").clone();
    match node::node_type(&page).expect("node type") {
        NodeType::Leaf => {
            let num_cells = leaf::num_cells(&page).expect("num cells");
            for i in 0..num_cells {
                keys.push(leaf::key(&page, i).expect("key"));
            }
        }
        NodeType::Internal => {
            let num_keys = internal::num_keys(&page).expect("num keys");
            for i in 0..=num_keys {
                let child = internal::child(&page, i).expect("child");
                let child_page = table.pager_mut().get_page(child).expect("child page");
                assert!(!node::is_root(child_page), "child {child} marked as root");
                assert_eq!(
                    node::parent(child_page),
                    page_num,
                    "child {child} has the wrong parent"
                );

                let before = keys.len();
                check_node(table, child, keys);
                if i < num_keys {
                    assert_eq!(
                        keys.get(before..).and_then(<[u32]>::last).copied(),
                        Some(internal::key(&page, i).expect("key")),
                        "routing key {i} of page {page_num} is not its child's max"
                    );
                }
            }
        }
    }
}
