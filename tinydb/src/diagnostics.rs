//! Human-readable dumps of the on-disk layout and tree shape.

use std::collections::HashSet;

use crate::storage::btree::{
    BTreeError, COMMON_NODE_HEADER_SIZE, INTERNAL_NODE_MAX_KEYS, LEAF_NODE_CELL_SIZE,
    LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS, LEAF_NODE_SPACE_FOR_CELLS, NodeError, NodeHeader,
    NodeType, internal, leaf,
};
use crate::storage::{PageNum, Pager};
use crate::table::Table;
use crate::types::ROW_SIZE;

/// Fixed layout sizes, one `NAME: value` per line.
#[must_use]
pub fn layout_constants() -> String {
    [
        ("ROW_SIZE", ROW_SIZE),
        ("COMMON_NODE_HEADER_SIZE", COMMON_NODE_HEADER_SIZE),
        ("LEAF_NODE_HEADER_SIZE", LEAF_NODE_HEADER_SIZE),
        ("LEAF_NODE_CELL_SIZE", LEAF_NODE_CELL_SIZE),
        ("LEAF_NODE_SPACE_FOR_CELLS", LEAF_NODE_SPACE_FOR_CELLS),
        ("LEAF_NODE_MAX_CELLS", LEAF_NODE_MAX_CELLS),
        ("INTERNAL_NODE_MAX_KEYS", INTERNAL_NODE_MAX_KEYS),
    ]
    .iter()
    .map(|(name, value)| format!("{name}: {value}\n"))
    .collect()
}

/// Every node reachable from the root, indented two spaces per level.
///
/// ```text
/// - internal (size 1)
///   - leaf (size 7)
///     - 1
///     ...
///   - key 7
///   - leaf (size 7)
///     - 8
///     ...
/// ```
///
/// A page reached twice means the links are corrupt and yields
/// [`NodeError::Cycle`].
pub fn dump_tree(table: &mut Table) -> Result<String, BTreeError> {
    let mut out = String::new();
    let mut visited = HashSet::new();
    let root = table.root_page_num();
    dump_node(table.pager_mut(), root, 0, &mut visited, &mut out)?;
    Ok(out)
}

fn dump_node(
    pager: &mut Pager,
    page_num: PageNum,
    depth: usize,
    visited: &mut HashSet<PageNum>,
    out: &mut String,
) -> Result<(), BTreeError> {
    if !visited.insert(page_num) {
        return Err(NodeError::Cycle { page: page_num }.into());
    }

    let page = pager.get_page(page_num)?;
    let header = NodeHeader::from_page(page)?;

    match header.node_type {
        NodeType::Leaf => {
            let num_cells = leaf::num_cells(page)?;
            push_line(out, depth, &format!("- leaf (size {num_cells})"));
            for i in 0..num_cells {
                push_line(out, depth + 1, &format!("- {}", leaf::key(page, i)?));
            }
        }
        NodeType::Internal => {
            let num_keys = internal::num_keys(page)?;
            push_line(out, depth, &format!("- internal (size {num_keys})"));

            let entries = (0..num_keys)
                .map(|i| Ok((internal::child(page, i)?, internal::key(page, i)?)))
                .collect::<Result<Vec<_>, BTreeError>>()?;
            let right_child = internal::right_child(page);

            for (child, key) in entries {
                dump_node(pager, child, depth + 1, visited, out)?;
                push_line(out, depth + 1, &format!("- key {key}"));
            }
            dump_node(pager, right_child, depth + 1, visited, out)?;
        }
    }

    Ok(())
}

fn push_line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(text);
    out.push('\n');
}
