//! Internal node layout.
//!
//! After the common header an internal node stores `num_keys` (4 bytes), the
//! page number of its right child (4 bytes), then `num_keys` entries of
//! `(key: u32, child: u32)`.
//!
//! `key[i]` is the largest key reachable through `child[i]`. Every key greater
//! than `key[num_keys - 1]` lives under the right child, which is why child
//! index `num_keys` refers to the right child.

use crate::storage::btree::node::{self, COMMON_NODE_HEADER_SIZE, NodeError, NodeType};
use crate::storage::page::{PAGE_SIZE, Page, PageNum};

pub const INTERNAL_NODE_NUM_KEYS_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
pub const INTERNAL_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + INTERNAL_NODE_NUM_KEYS_SIZE + INTERNAL_NODE_RIGHT_CHILD_SIZE;

pub const INTERNAL_NODE_KEY_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_KEY_OFFSET: usize = 0;
pub const INTERNAL_NODE_CHILD_SIZE: usize = std::mem::size_of::<u32>();
pub const INTERNAL_NODE_CHILD_OFFSET: usize = INTERNAL_NODE_KEY_OFFSET + INTERNAL_NODE_KEY_SIZE;
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_KEY_SIZE + INTERNAL_NODE_CHILD_SIZE;
pub const INTERNAL_NODE_MAX_KEYS: usize =
    (PAGE_SIZE - INTERNAL_NODE_HEADER_SIZE) / INTERNAL_NODE_CELL_SIZE;

/// Turn a page into an empty, non-root internal node.
pub fn initialize(page: &mut Page) {
    node::set_node_type(page, NodeType::Internal);
    node::set_root(page, false);
    set_num_keys(page, 0);
}

/// Number of keys, validated against the node capacity.
pub fn num_keys(page: &Page) -> Result<u32, NodeError> {
    let count = page.read_u32(INTERNAL_NODE_NUM_KEYS_OFFSET);
    if count as usize > INTERNAL_NODE_MAX_KEYS {
        return Err(NodeError::CellOutOfBounds {
            index: count,
            capacity: INTERNAL_NODE_MAX_KEYS,
        });
    }
    Ok(count)
}

pub fn set_num_keys(page: &mut Page, count: u32) {
    debug_assert!(count as usize <= INTERNAL_NODE_MAX_KEYS);
    page.write_u32(INTERNAL_NODE_NUM_KEYS_OFFSET, count);
}

#[must_use]
pub fn right_child(page: &Page) -> PageNum {
    page.read_u32(INTERNAL_NODE_RIGHT_CHILD_OFFSET)
}

pub fn set_right_child(page: &mut Page, child: PageNum) {
    page.write_u32(INTERNAL_NODE_RIGHT_CHILD_OFFSET, child);
}

/// Byte offset of entry `index` within the page.
pub fn cell_offset(index: u32) -> Result<usize, NodeError> {
    let i = index as usize;
    if i >= INTERNAL_NODE_MAX_KEYS {
        return Err(NodeError::CellOutOfBounds {
            index,
            capacity: INTERNAL_NODE_MAX_KEYS,
        });
    }
    Ok(INTERNAL_NODE_HEADER_SIZE + i * INTERNAL_NODE_CELL_SIZE)
}

pub fn key(page: &Page, index: u32) -> Result<u32, NodeError> {
    Ok(page.read_u32(cell_offset(index)? + INTERNAL_NODE_KEY_OFFSET))
}

pub fn set_key(page: &mut Page, index: u32, key: u32) -> Result<(), NodeError> {
    page.write_u32(cell_offset(index)? + INTERNAL_NODE_KEY_OFFSET, key);
    Ok(())
}

/// Child page at `index`; `index == num_keys` is the right child.
pub fn child(page: &Page, index: u32) -> Result<PageNum, NodeError> {
    let count = num_keys(page)?;
    if index > count {
        return Err(NodeError::CellOutOfBounds {
            index,
            capacity: count as usize + 1,
        });
    }
    if index == count {
        return Ok(right_child(page));
    }
    Ok(page.read_u32(cell_offset(index)? + INTERNAL_NODE_CHILD_OFFSET))
}

/// Set the child page at `index`; `index == num_keys` sets the right child.
pub fn set_child(page: &mut Page, index: u32, child: PageNum) -> Result<(), NodeError> {
    let count = num_keys(page)?;
    if index > count {
        return Err(NodeError::CellOutOfBounds {
            index,
            capacity: count as usize + 1,
        });
    }
    if index == count {
        set_right_child(page, child);
    } else {
        page.write_u32(cell_offset(index)? + INTERNAL_NODE_CHILD_OFFSET, child);
    }
    Ok(())
}

/// Index of the child that should contain `key`: the first entry whose key
/// is >= `key`, or `num_keys` (the right child) when there is none.
pub fn find_child(page: &Page, key: u32) -> Result<u32, NodeError> {
    let mut low = 0;
    let mut high = num_keys(page)?;

    while low != high {
        let mid = low + (high - low) / 2;
        if self::key(page, mid)? >= key {
            high = mid;
        } else {
            low = mid + 1;
        }
    }

    Ok(low)
}

/// Position of `child` among this node's children, if it is one of them.
pub fn child_index(page: &Page, child: PageNum) -> Result<Option<u32>, NodeError> {
    let count = num_keys(page)?;
    for index in 0..=count {
        if self::child(page, index)? == child {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Internal node with keys `[10, 20, 30]`, children `[100, 200, 300]`,
    /// right child 400.
    fn sample_node() -> Page {
        let mut page = Page::new();
        initialize(&mut page);
        set_num_keys(&mut page, 3);
        for (i, (k, c)) in [(10, 100), (20, 200), (30, 300)].into_iter().enumerate() {
            let i = u32::try_from(i).expect("index");
            set_key(&mut page, i, k).expect("set key");
            set_child(&mut page, i, c).expect("set child");
        }
        set_right_child(&mut page, 400);
        page
    }

    #[test]
    fn test_internal_layout_constants() {
        assert_eq!(INTERNAL_NODE_HEADER_SIZE, 14);
        assert_eq!(INTERNAL_NODE_CELL_SIZE, 8);
        assert_eq!(INTERNAL_NODE_MAX_KEYS, 510);
    }

    #[test]
    fn test_initialize_internal() {
        let mut page = Page::new();
        node::set_root(&mut page, true);
        initialize(&mut page);

        assert_eq!(node::node_type(&page), Ok(NodeType::Internal));
        assert!(!node::is_root(&page));
        assert_eq!(num_keys(&page), Ok(0));
    }

    #[test]
    fn test_entry_layout_is_key_then_child() {
        let page = sample_node();
        let offset = INTERNAL_NODE_HEADER_SIZE;
        assert_eq!(page.read_u32(offset), 10);
        assert_eq!(page.read_u32(offset + 4), 100);
        assert_eq!(page.read_u32(INTERNAL_NODE_RIGHT_CHILD_OFFSET), 400);
    }

    #[test]
    fn test_child_index_num_keys_is_right_child() {
        let page = sample_node();
        assert_eq!(child(&page, 0), Ok(100));
        assert_eq!(child(&page, 3), Ok(400));
        assert!(child(&page, 4).is_err());
    }

    #[test]
    fn test_find_child() {
        let page = sample_node();

        assert_eq!(find_child(&page, 1), Ok(0));
        assert_eq!(find_child(&page, 10), Ok(0));
        assert_eq!(find_child(&page, 11), Ok(1));
        assert_eq!(find_child(&page, 30), Ok(2));
        assert_eq!(find_child(&page, 31), Ok(3));
    }

    #[test]
    fn test_child_index_lookup() {
        let page = sample_node();
        assert_eq!(child_index(&page, 200), Ok(Some(1)));
        assert_eq!(child_index(&page, 400), Ok(Some(3)));
        assert_eq!(child_index(&page, 999), Ok(None));
    }
}
