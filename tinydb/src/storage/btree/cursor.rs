//! Positional access into the tree.
//!
//! A cursor names one leaf slot. It holds the tree (and through it the
//! pager) mutably, so no insert can run while a cursor is alive.

use std::iter::FusedIterator;

use crate::storage::btree::leaf;
use crate::storage::btree::node::NodeError;
use crate::storage::btree::tree::{BTree, BTreeError};
use crate::storage::page::{Page, PageNum};
use crate::types::row::Row;

/// A (page, slot) position in the tree's leaves.
pub struct Cursor<'a> {
    tree: BTree<'a>,
    page_num: PageNum,
    cell_num: u32,
    end_of_table: bool,
    /// Leaves entered so far, the starting one included.
    leaves_visited: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn new(
        tree: BTree<'a>,
        page_num: PageNum,
        cell_num: u32,
        end_of_table: bool,
    ) -> Self {
        Self {
            tree,
            page_num,
            cell_num,
            end_of_table,
            leaves_visited: 1,
        }
    }

    #[must_use]
    pub const fn page_num(&self) -> PageNum {
        self.page_num
    }

    #[must_use]
    pub const fn cell_num(&self) -> u32 {
        self.cell_num
    }

    /// Whether the cursor has moved past the last row.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.end_of_table
    }

    /// Whether the cursor slot holds a row, as opposed to an insertion point
    /// past the last cell of its leaf.
    pub fn has_cell(&mut self) -> Result<bool, BTreeError> {
        if self.end_of_table {
            return Ok(false);
        }
        let num_cells = leaf::num_cells(self.tree.pager_mut().get_page(self.page_num)?)?;
        Ok(self.cell_num < num_cells)
    }

    /// Key stored at the current slot.
    pub fn key(&mut self) -> Result<u32, BTreeError> {
        let cell_num = self.cell_num;
        let page = self.current_leaf()?;
        Ok(leaf::key(page, cell_num)?)
    }

    /// Serialized row bytes at the current slot.
    pub fn value(&mut self) -> Result<&[u8], BTreeError> {
        let cell_num = self.cell_num;
        let page = self.current_leaf()?;
        Ok(leaf::value(page, cell_num)?)
    }

    /// Decoded row at the current slot.
    pub fn row(&mut self) -> Result<Row, BTreeError> {
        Ok(Row::deserialize(self.value()?)?)
    }

    /// Step to the next row, crossing into the following leaf when the
    /// current one is exhausted.
    pub fn advance(&mut self) -> Result<(), BTreeError> {
        if self.end_of_table {
            return Ok(());
        }

        self.cell_num += 1;
        let num_cells = leaf::num_cells(self.tree.pager_mut().get_page(self.page_num)?)?;
        if self.cell_num >= num_cells {
            self.skip_to_next_leaf()?;
        }
        Ok(())
    }

    /// Move to the first slot of the next non-empty leaf, or mark the end of
    /// the table when there is none.
    ///
    /// A table cannot hold more leaves than pages, so entering more than
    /// that many means the sibling links loop.
    pub(crate) fn skip_to_next_leaf(&mut self) -> Result<(), BTreeError> {
        loop {
            let Some(next) = self.tree.next_leaf(self.page_num)? else {
                self.end_of_table = true;
                return Ok(());
            };

            self.leaves_visited += 1;
            if self.leaves_visited > self.tree.pager_mut().max_pages() {
                return Err(NodeError::Cycle { page: next }.into());
            }

            self.page_num = next;
            self.cell_num = 0;
            if leaf::num_cells(self.tree.pager_mut().get_page(next)?)? > 0 {
                return Ok(());
            }
        }
    }

    /// The current leaf, checked to actually hold a row at the cursor slot.
    fn current_leaf(&mut self) -> Result<&Page, BTreeError> {
        let cell_num = self.cell_num;
        let page = self.tree.pager_mut().get_page(self.page_num)?;
        let num_cells = leaf::num_cells(page)?;
        if cell_num >= num_cells {
            return Err(NodeError::CellOutOfBounds {
                index: cell_num,
                capacity: num_cells as usize,
            }
            .into());
        }
        Ok(page)
    }
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("page_num", &self.page_num)
            .field("cell_num", &self.cell_num)
            .field("end_of_table", &self.end_of_table)
            .field("leaves_visited", &self.leaves_visited)
            .finish_non_exhaustive()
    }
}

/// Rows in ascending key order.
///
/// The scan ends after the last row or after yielding the first error.
pub struct Scan<'a> {
    cursor: Option<Cursor<'a>>,
}

impl<'a> Scan<'a> {
    pub(crate) const fn new(cursor: Cursor<'a>) -> Self {
        Self {
            cursor: Some(cursor),
        }
    }
}

impl Iterator for Scan<'_> {
    type Item = Result<Row, BTreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        if cursor.is_end() {
            self.cursor = None;
            return None;
        }

        let result = cursor.row().and_then(|row| cursor.advance().map(|()| row));
        if result.is_err() {
            self.cursor = None;
        }
        Some(result)
    }
}

impl FusedIterator for Scan<'_> {}
