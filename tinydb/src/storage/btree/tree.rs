//! B-tree over the table's pages.
//!
//! Keys are row ids (u32); values are serialized rows stored inline in leaf
//! cells. The tree grows by splitting full leaves. A root split keeps the
//! root on the same page by moving the old root's contents into a fresh left
//! child, so the table never has to record a new root page.
//!
//! Splitting an internal node is not supported: when a leaf split would need
//! to add a key to a parent that is already full, the insert is rejected with
//! [`BTreeError::NotImplemented`] before anything is modified. In practice
//! this caps the tree at a root internal node over leaves.
//!
//! Page links come from disk and are not trusted: no walk takes more steps
//! than the pager has pages, so a corrupt file ends in
//! [`NodeError::Cycle`] rather than a hang.

use crate::storage::btree::cursor::Cursor;
use crate::storage::btree::internal::{self, INTERNAL_NODE_CELL_SIZE, INTERNAL_NODE_MAX_KEYS};
use crate::storage::btree::leaf::{
    self, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT,
    LeafWriteError,
};
use crate::storage::btree::node::{self, NodeError, NodeType};
use crate::storage::page::PageNum;
use crate::storage::pager::{Pager, PagerError};
use crate::types::row::{Row, RowError};

/// A B-tree rooted at `root_page`, borrowing the table's pager for the
/// duration of one operation.
pub struct BTree<'a> {
    pager: &'a mut Pager,
    root_page: PageNum,
}

impl<'a> BTree<'a> {
    /// Wrap an existing tree. The root page must already be initialized.
    pub const fn new(pager: &'a mut Pager, root_page: PageNum) -> Self {
        Self { pager, root_page }
    }

    /// Get the root page number.
    #[must_use]
    pub const fn root_page(&self) -> PageNum {
        self.root_page
    }

    /// Get mutable access to the underlying pager.
    pub const fn pager_mut(&mut self) -> &mut Pager {
        self.pager
    }

    /// Position a cursor at `key`, or where `key` would be inserted.
    ///
    /// The caller tells the two apart by comparing the key at the cursor.
    pub fn find(mut self, key: u32) -> Result<Cursor<'a>, BTreeError> {
        let (page_num, cell_num) = self.find_slot(key)?;
        Ok(Cursor::new(self, page_num, cell_num, false))
    }

    /// Position a cursor at the first row of the table.
    pub fn start(mut self) -> Result<Cursor<'a>, BTreeError> {
        let page_num = self.leftmost_leaf(self.root_page)?;
        let num_cells = leaf::num_cells(self.pager.get_page(page_num)?)?;

        let mut cursor = Cursor::new(self, page_num, 0, false);
        if num_cells == 0 {
            cursor.skip_to_next_leaf()?;
        }
        Ok(cursor)
    }

    /// Insert a row under `key`.
    ///
    /// Fails with [`BTreeError::DuplicateKey`] if the key is already present;
    /// the tree is left untouched in that case.
    pub fn insert(&mut self, key: u32, row: &Row) -> Result<(), BTreeError> {
        let (page_num, cell_num) = self.find_slot(key)?;
        let page = self.pager.get_page(page_num)?;
        let num_cells = leaf::num_cells(page)?;

        if cell_num < num_cells && leaf::key(page, cell_num)? == key {
            return Err(BTreeError::DuplicateKey(key));
        }

        if (num_cells as usize) < LEAF_NODE_MAX_CELLS {
            leaf::insert_cell(page, cell_num, key, row)?;
            return Ok(());
        }

        self.split_and_insert(page_num, cell_num, key, row)
    }

    /// Leaf page and cell index for `key`.
    fn find_slot(&mut self, key: u32) -> Result<(PageNum, u32), BTreeError> {
        let page_num = self.find_leaf(key)?;
        let cell_num = leaf::find_cell(self.pager.get_page(page_num)?, key)?;
        Ok((page_num, cell_num))
    }

    /// Find the leaf page that should contain the given key.
    fn find_leaf(&mut self, key: u32) -> Result<PageNum, BTreeError> {
        let mut current = self.root_page;

        for _ in 0..self.pager.max_pages() {
            let page = self.pager.get_page(current)?;
            match node::node_type(page)? {
                NodeType::Leaf => return Ok(current),
                NodeType::Internal => {
                    let child_index = internal::find_child(page, key)?;
                    current = internal::child(page, child_index)?;
                }
            }
        }

        Err(NodeError::Cycle { page: current }.into())
    }

    /// Follow first children down to a leaf.
    fn leftmost_leaf(&mut self, page_num: PageNum) -> Result<PageNum, BTreeError> {
        let mut current = page_num;

        for _ in 0..self.pager.max_pages() {
            let page = self.pager.get_page(current)?;
            match node::node_type(page)? {
                NodeType::Leaf => return Ok(current),
                NodeType::Internal => current = internal::child(page, 0)?,
            }
        }

        Err(NodeError::Cycle { page: current }.into())
    }

    /// The leaf that follows `page_num` in key order, if any.
    ///
    /// Walks up parent pointers until some ancestor has a child to the right
    /// of the path, then descends to that subtree's leftmost leaf.
    pub(crate) fn next_leaf(&mut self, page_num: PageNum) -> Result<Option<PageNum>, BTreeError> {
        let mut current = page_num;

        for _ in 0..self.pager.max_pages() {
            let page = self.pager.get_page(current)?;
            if node::is_root(page) {
                return Ok(None);
            }

            let parent = node::parent(page);
            let parent_page = self.pager.get_page(parent)?;
            let index = internal::child_index(parent_page, current)?.ok_or(
                NodeError::MissingChild {
                    parent,
                    child: current,
                },
            )?;

            if index < internal::num_keys(parent_page)? {
                let sibling = internal::child(parent_page, index + 1)?;
                return self.leftmost_leaf(sibling).map(Some);
            }

            current = parent;
        }

        Err(NodeError::Cycle { page: current }.into())
    }

    /// Largest key stored under `page_num`.
    ///
    /// An internal node's own last key only covers its second-to-last subtree,
    /// so the search always continues through the right child to a leaf.
    pub fn max_key(&mut self, page_num: PageNum) -> Result<u32, BTreeError> {
        let mut current = page_num;

        for _ in 0..self.pager.max_pages() {
            let page = self.pager.get_page(current)?;
            match node::node_type(page)? {
                NodeType::Leaf => {
                    let num_cells = leaf::num_cells(page)?;
                    if num_cells == 0 {
                        return Err(NodeError::EmptyNode(current).into());
                    }
                    return Ok(leaf::key(page, num_cells - 1)?);
                }
                NodeType::Internal => current = internal::right_child(page),
            }
        }

        Err(NodeError::Cycle { page: current }.into())
    }

    /// Split a full leaf and insert the new cell in the same pass.
    ///
    /// The `LEAF_NODE_MAX_CELLS + 1` cells (existing ones plus the new one at
    /// `cell_num`) are walked from the highest position down. The upper
    /// `LEAF_NODE_RIGHT_SPLIT_COUNT` positions go to a new right sibling; the
    /// rest stay in the old leaf.
    fn split_and_insert(
        &mut self,
        old_page_num: PageNum,
        cell_num: u32,
        key: u32,
        row: &Row,
    ) -> Result<(), BTreeError> {
        let old = self.pager.get_page(old_page_num)?.clone();
        let was_root = node::is_root(&old);
        let parent = node::parent(&old);
        let old_max = leaf::key(&old, leaf::num_cells(&old)? - 1)?;

        // Everything that can fail is checked before the first write.
        if was_root {
            self.pager.ensure_capacity(2)?;
        } else {
            self.pager.ensure_capacity(1)?;
            let parent_keys = internal::num_keys(self.pager.get_page(parent)?)?;
            if parent_keys as usize >= INTERNAL_NODE_MAX_KEYS {
                return Err(BTreeError::NotImplemented(Unsupported::MaxDepthExceeded));
            }
        }

        let new_page_num = self.pager.unused_page_num();
        let new_page = self.pager.get_page(new_page_num)?;
        leaf::initialize(new_page);
        node::set_parent(new_page, parent);

        for position in (0..=LEAF_NODE_MAX_CELLS).rev() {
            let (dest_page_num, dest_index) = if position >= LEAF_NODE_LEFT_SPLIT_COUNT {
                (new_page_num, position - LEAF_NODE_LEFT_SPLIT_COUNT)
            } else {
                (old_page_num, position)
            };
            let dest_index = cell_index(dest_index)?;
            let position = cell_index(position)?;
            let dest = self.pager.get_page(dest_page_num)?;

            if position == cell_num {
                leaf::write_cell(dest, dest_index, key, row)?;
            } else if position > cell_num {
                leaf::cell_mut(dest, dest_index)?.copy_from_slice(leaf::cell(&old, position - 1)?);
            } else {
                leaf::cell_mut(dest, dest_index)?.copy_from_slice(leaf::cell(&old, position)?);
            }
        }

        leaf::set_num_cells(
            self.pager.get_page(old_page_num)?,
            cell_index(LEAF_NODE_LEFT_SPLIT_COUNT)?,
        );
        leaf::set_num_cells(
            self.pager.get_page(new_page_num)?,
            cell_index(LEAF_NODE_RIGHT_SPLIT_COUNT)?,
        );

        tracing::debug!(
            old_page = old_page_num,
            new_page = new_page_num,
            key,
            "split leaf"
        );

        if was_root {
            return self.create_new_root(new_page_num);
        }

        let new_left_max = self.max_key(old_page_num)?;
        self.update_internal_key(parent, old_max, new_left_max)?;
        self.internal_insert(parent, new_page_num)
    }

    /// Turn the root into an internal node over two leaves.
    ///
    /// The old root's bytes move to a new left child and the root page is
    /// reinitialized in place, so the root page number does not change.
    fn create_new_root(&mut self, right_child: PageNum) -> Result<(), BTreeError> {
        let root = self.pager.get_page(self.root_page)?.clone();
        let left_child = self.pager.unused_page_num();

        let left = self.pager.get_page(left_child)?;
        left.copy_from(&root);
        node::set_root(left, false);
        node::set_parent(left, self.root_page);

        let left_max = self.max_key(left_child)?;

        let root_page = self.pager.get_page(self.root_page)?;
        internal::initialize(root_page);
        node::set_root(root_page, true);
        internal::set_num_keys(root_page, 1);
        internal::set_key(root_page, 0, left_max)?;
        internal::set_child(root_page, 0, left_child)?;
        internal::set_right_child(root_page, right_child);

        node::set_parent(self.pager.get_page(right_child)?, self.root_page);

        tracing::debug!(
            root = self.root_page,
            left_child,
            right_child,
            left_max,
            "promoted root to internal node"
        );

        Ok(())
    }

    /// Replace the routing key for the child whose max used to be `old_key`.
    ///
    /// The right child has no stored key, so nothing changes when the split
    /// leaf was the right child.
    fn update_internal_key(
        &mut self,
        page_num: PageNum,
        old_key: u32,
        new_key: u32,
    ) -> Result<(), BTreeError> {
        let page = self.pager.get_page(page_num)?;
        let index = internal::find_child(page, old_key)?;
        if index < internal::num_keys(page)? {
            internal::set_key(page, index, new_key)?;
        }
        Ok(())
    }

    /// Add `child` to the internal node `parent`, keeping keys sorted.
    ///
    /// The caller has already checked that `parent` has a free slot.
    fn internal_insert(&mut self, parent: PageNum, child: PageNum) -> Result<(), BTreeError> {
        let child_max = self.max_key(child)?;
        let right_child = internal::right_child(self.pager.get_page(parent)?);
        let right_max = self.max_key(right_child)?;

        let page = self.pager.get_page(parent)?;
        let num_keys = internal::num_keys(page)?;
        let index = internal::find_child(page, child_max)?;

        if child_max > right_max {
            // The old right child becomes the last keyed entry.
            internal::set_num_keys(page, num_keys + 1);
            internal::set_child(page, num_keys, right_child)?;
            internal::set_key(page, num_keys, right_max)?;
            internal::set_right_child(page, child);
        } else {
            if index < num_keys {
                let src = internal::cell_offset(index)?;
                let len = (num_keys - index) as usize * INTERNAL_NODE_CELL_SIZE;
                page.copy_within(src, src + INTERNAL_NODE_CELL_SIZE, len);
            }
            internal::set_num_keys(page, num_keys + 1);
            internal::set_child(page, index, child)?;
            internal::set_key(page, index, child_max)?;
        }

        Ok(())
    }
}

fn cell_index(index: usize) -> Result<u32, NodeError> {
    u32::try_from(index).map_err(|_| NodeError::CellOutOfBounds {
        index: u32::MAX,
        capacity: LEAF_NODE_MAX_CELLS,
    })
}

/// Tree shapes this engine refuses to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    /// A leaf split needs to add a key to a full internal node, which would
    /// require splitting it and growing the tree past two levels.
    MaxDepthExceeded,
}

impl std::fmt::Display for Unsupported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaxDepthExceeded => write!(
                f,
                "splitting internal nodes (max {INTERNAL_NODE_MAX_KEYS} keys) is not implemented"
            ),
        }
    }
}

/// Errors that can occur during B-tree operations.
#[derive(Debug)]
pub enum BTreeError {
    /// Pager error (I/O, corrupt file, capacity).
    Pager(PagerError),
    /// Node error.
    Node(NodeError),
    /// Row error.
    Row(RowError),
    /// The key is already in the table. Nothing was written.
    DuplicateKey(u32),
    /// The operation needs a tree shape this engine does not build.
    NotImplemented(Unsupported),
}

impl BTreeError {
    /// Whether the table should be considered unusable after this error.
    ///
    /// Duplicate keys and invalid rows are rejected before any write, so a
    /// session can carry on after them.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::DuplicateKey(_) | Self::Row(RowError::StringTooLong { .. })
        )
    }
}

impl std::fmt::Display for BTreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pager(e) => write!(f, "pager error: {e}"),
            Self::Node(e) => write!(f, "node error: {e}"),
            Self::Row(e) => write!(f, "row error: {e}"),
            Self::DuplicateKey(key) => write!(f, "duplicate key: {key}"),
            Self::NotImplemented(what) => write!(f, "not implemented: {what}"),
        }
    }
}

impl std::error::Error for BTreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pager(e) => Some(e),
            Self::Node(e) => Some(e),
            Self::Row(e) => Some(e),
            Self::DuplicateKey(_) | Self::NotImplemented(_) => None,
        }
    }
}

impl From<PagerError> for BTreeError {
    fn from(e: PagerError) -> Self {
        Self::Pager(e)
    }
}

impl From<NodeError> for BTreeError {
    fn from(e: NodeError) -> Self {
        Self::Node(e)
    }
}

impl From<RowError> for BTreeError {
    fn from(e: RowError) -> Self {
        Self::Row(e)
    }
}

impl From<LeafWriteError> for BTreeError {
    fn from(e: LeafWriteError) -> Self {
        match e {
            LeafWriteError::Node(e) => Self::Node(e),
            LeafWriteError::Row(e) => Self::Row(e),
        }
    }
}
