//! Leaf node layout.
//!
//! After the common header a leaf stores `num_cells` (4 bytes) followed by a
//! packed array of cells. Each cell is a 4-byte key and a serialized row.
//! Cells are kept sorted by key with no duplicates.

use crate::storage::btree::node::{self, COMMON_NODE_HEADER_SIZE, NodeError, NodeType};
use crate::storage::page::{PAGE_SIZE, Page};
use crate::types::row::{ROW_SIZE, Row, RowError};

pub const LEAF_NODE_NUM_CELLS_SIZE: usize = std::mem::size_of::<u32>();
pub const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const LEAF_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE + LEAF_NODE_NUM_CELLS_SIZE;

pub const LEAF_NODE_KEY_SIZE: usize = std::mem::size_of::<u32>();
pub const LEAF_NODE_KEY_OFFSET: usize = 0;
pub const LEAF_NODE_VALUE_SIZE: usize = ROW_SIZE;
pub const LEAF_NODE_VALUE_OFFSET: usize = LEAF_NODE_KEY_OFFSET + LEAF_NODE_KEY_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

/// Cells that move to the new right sibling when a full leaf takes one more.
pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1).div_ceil(2);
/// Cells that stay in the original leaf after a split.
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize = LEAF_NODE_MAX_CELLS + 1 - LEAF_NODE_RIGHT_SPLIT_COUNT;

/// Turn a page into an empty, non-root leaf.
pub fn initialize(page: &mut Page) {
    node::set_node_type(page, NodeType::Leaf);
    node::set_root(page, false);
    set_num_cells(page, 0);
}

/// Number of cells, validated against the leaf capacity.
pub fn num_cells(page: &Page) -> Result<u32, NodeError> {
    let count = page.read_u32(LEAF_NODE_NUM_CELLS_OFFSET);
    if count as usize > LEAF_NODE_MAX_CELLS {
        return Err(NodeError::CellOutOfBounds {
            index: count,
            capacity: LEAF_NODE_MAX_CELLS,
        });
    }
    Ok(count)
}

pub fn set_num_cells(page: &mut Page, count: u32) {
    debug_assert!(count as usize <= LEAF_NODE_MAX_CELLS);
    page.write_u32(LEAF_NODE_NUM_CELLS_OFFSET, count);
}

/// Byte offset of cell `index` within the page.
pub fn cell_offset(index: u32) -> Result<usize, NodeError> {
    let i = index as usize;
    if i >= LEAF_NODE_MAX_CELLS {
        return Err(NodeError::CellOutOfBounds {
            index,
            capacity: LEAF_NODE_MAX_CELLS,
        });
    }
    Ok(LEAF_NODE_HEADER_SIZE + i * LEAF_NODE_CELL_SIZE)
}

pub fn cell(page: &Page, index: u32) -> Result<&[u8], NodeError> {
    Ok(page.read_bytes(cell_offset(index)?, LEAF_NODE_CELL_SIZE))
}

pub fn cell_mut(page: &mut Page, index: u32) -> Result<&mut [u8], NodeError> {
    Ok(page.bytes_mut(cell_offset(index)?, LEAF_NODE_CELL_SIZE))
}

pub fn key(page: &Page, index: u32) -> Result<u32, NodeError> {
    Ok(page.read_u32(cell_offset(index)? + LEAF_NODE_KEY_OFFSET))
}

pub fn set_key(page: &mut Page, index: u32, key: u32) -> Result<(), NodeError> {
    page.write_u32(cell_offset(index)? + LEAF_NODE_KEY_OFFSET, key);
    Ok(())
}

/// Serialized row bytes of cell `index`.
pub fn value(page: &Page, index: u32) -> Result<&[u8], NodeError> {
    Ok(page.read_bytes(
        cell_offset(index)? + LEAF_NODE_VALUE_OFFSET,
        LEAF_NODE_VALUE_SIZE,
    ))
}

pub fn value_mut(page: &mut Page, index: u32) -> Result<&mut [u8], NodeError> {
    Ok(page.bytes_mut(
        cell_offset(index)? + LEAF_NODE_VALUE_OFFSET,
        LEAF_NODE_VALUE_SIZE,
    ))
}

/// Write a whole `(key, row)` cell at `index`.
pub fn write_cell(page: &mut Page, index: u32, key: u32, row: &Row) -> Result<(), LeafWriteError> {
    set_key(page, index, key)?;
    row.serialize(value_mut(page, index)?)?;
    Ok(())
}

/// Index of the first cell whose key is >= `key`.
///
/// This is the key's slot when present and its insertion point otherwise.
pub fn find_cell(page: &Page, key: u32) -> Result<u32, NodeError> {
    let mut low = 0;
    let mut high = num_cells(page)?;

    while low != high {
        let mid = low + (high - low) / 2;
        let key_at_mid = self::key(page, mid)?;
        if key == key_at_mid {
            return Ok(mid);
        }
        if key < key_at_mid {
            high = mid;
        } else {
            low = mid + 1;
        }
    }

    Ok(low)
}

/// Insert a cell at `index` in a leaf with spare capacity, shifting later
/// cells one slot to the right.
pub fn insert_cell(page: &mut Page, index: u32, key: u32, row: &Row) -> Result<(), LeafWriteError> {
    let count = num_cells(page)?;
    if count as usize >= LEAF_NODE_MAX_CELLS {
        return Err(LeafWriteError::Node(NodeError::CellOutOfBounds {
            index: count,
            capacity: LEAF_NODE_MAX_CELLS,
        }));
    }
    if index > count {
        return Err(LeafWriteError::Node(NodeError::CellOutOfBounds {
            index,
            capacity: count as usize,
        }));
    }

    if index < count {
        let src = cell_offset(index)?;
        let len = (count - index) as usize * LEAF_NODE_CELL_SIZE;
        page.copy_within(src, src + LEAF_NODE_CELL_SIZE, len);
    }

    write_cell(page, index, key, row)?;
    set_num_cells(page, count + 1);
    Ok(())
}

/// Errors from writing a row into a leaf cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafWriteError {
    Node(NodeError),
    Row(RowError),
}

impl std::fmt::Display for LeafWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(e) => write!(f, "node error: {e}"),
            Self::Row(e) => write!(f, "row error: {e}"),
        }
    }
}

impl std::error::Error for LeafWriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Node(e) => Some(e),
            Self::Row(e) => Some(e),
        }
    }
}

impl From<NodeError> for LeafWriteError {
    fn from(e: NodeError) -> Self {
        Self::Node(e)
    }
}

impl From<RowError> for LeafWriteError {
    fn from(e: RowError) -> Self {
        Self::Row(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u32) -> Row {
        Row::new(id, &format!("user{id}"), &format!("person{id}@example.com")).expect("valid row")
    }

    fn keys(page: &Page) -> Vec<u32> {
        let count = num_cells(page).expect("num cells");
        (0..count).map(|i| key(page, i).expect("key")).collect()
    }

    #[test]
    fn test_leaf_layout_constants() {
        assert_eq!(LEAF_NODE_HEADER_SIZE, 10);
        assert_eq!(LEAF_NODE_CELL_SIZE, 297);
        assert_eq!(LEAF_NODE_SPACE_FOR_CELLS, 4086);
        assert_eq!(LEAF_NODE_MAX_CELLS, 13);
        assert_eq!(LEAF_NODE_RIGHT_SPLIT_COUNT, 7);
        assert_eq!(LEAF_NODE_LEFT_SPLIT_COUNT, 7);
    }

    #[test]
    fn test_initialize_leaf() {
        let mut page = Page::new();
        page.write_u32(LEAF_NODE_NUM_CELLS_OFFSET, 5);
        node::set_root(&mut page, true);

        initialize(&mut page);

        assert_eq!(node::node_type(&page), Ok(NodeType::Leaf));
        assert!(!node::is_root(&page));
        assert_eq!(num_cells(&page), Ok(0));
    }

    #[test]
    fn test_insert_cell_keeps_order() {
        let mut page = Page::new();
        initialize(&mut page);

        for id in [30, 10, 20, 40, 5] {
            let index = find_cell(&page, id).expect("find");
            insert_cell(&mut page, index, id, &row(id)).expect("insert");
        }

        assert_eq!(keys(&page), vec![5, 10, 20, 30, 40]);
        let stored = Row::deserialize(value(&page, 2).expect("value")).expect("row");
        assert_eq!(stored, row(20));
    }

    #[test]
    fn test_find_cell_positions() {
        let mut page = Page::new();
        initialize(&mut page);
        for (i, id) in [10u32, 20, 30].into_iter().enumerate() {
            write_cell(&mut page, u32::try_from(i).expect("index"), id, &row(id)).expect("write");
        }
        set_num_cells(&mut page, 3);

        assert_eq!(find_cell(&page, 5), Ok(0));
        assert_eq!(find_cell(&page, 10), Ok(0));
        assert_eq!(find_cell(&page, 25), Ok(2));
        assert_eq!(find_cell(&page, 30), Ok(2));
        assert_eq!(find_cell(&page, 31), Ok(3));
    }

    #[test]
    fn test_insert_into_full_leaf_fails() {
        let mut page = Page::new();
        initialize(&mut page);
        for id in 0..u32::try_from(LEAF_NODE_MAX_CELLS).expect("fits") {
            insert_cell(&mut page, id, id, &row(id)).expect("insert");
        }

        let result = insert_cell(&mut page, 0, 100, &row(100));
        assert!(matches!(
            result,
            Err(LeafWriteError::Node(NodeError::CellOutOfBounds { .. }))
        ));
        assert_eq!(keys(&page).len(), LEAF_NODE_MAX_CELLS);
    }

    #[test]
    fn test_cell_index_bounds_checked() {
        let page = Page::new();
        assert!(cell(&page, 12).is_ok());
        assert_eq!(
            key(&page, 13),
            Err(NodeError::CellOutOfBounds {
                index: 13,
                capacity: 13
            })
        );
    }

    #[test]
    fn test_corrupt_cell_count_rejected() {
        let mut page = Page::new();
        initialize(&mut page);
        page.write_u32(LEAF_NODE_NUM_CELLS_OFFSET, 500);
        assert!(num_cells(&page).is_err());
    }
}
