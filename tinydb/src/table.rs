//! Table handle: the entry point for opening, reading and writing a database.

use std::path::Path;

use crate::config::EngineConfig;
use crate::storage::btree::{BTree, BTreeError, Cursor, Scan, leaf, node};
use crate::storage::{PageNum, Pager};
use crate::types::Row;

/// The root always lives on the first page.
const ROOT_PAGE_NUM: PageNum = 0;

/// A table of rows keyed by id, backed by one file.
///
/// The table owns its pager. Cursors and scans borrow the table mutably and
/// must be dropped before the next insert.
pub struct Table {
    pager: Pager,
    root_page_num: PageNum,
}

impl Table {
    /// Open (or create) the table at `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BTreeError> {
        Self::open_with_config(path, &EngineConfig::default())
    }

    /// Open (or create) the table at `path`.
    ///
    /// A new or empty file gets an empty root leaf on page 0.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: &EngineConfig,
    ) -> Result<Self, BTreeError> {
        let path = path.as_ref();
        let mut pager = Pager::open(path, config.max_pages)?;

        if pager.num_pages() == 0 {
            let root = pager.get_page(ROOT_PAGE_NUM)?;
            leaf::initialize(root);
            node::set_root(root, true);
        } else {
            node::node_type(pager.get_page(ROOT_PAGE_NUM)?)?;
        }

        tracing::info!(
            path = %path.display(),
            num_pages = pager.num_pages(),
            max_pages = config.max_pages,
            "opened table"
        );

        Ok(Self {
            pager,
            root_page_num: ROOT_PAGE_NUM,
        })
    }

    /// The table's B-tree, borrowing the pager.
    pub const fn tree(&mut self) -> BTree<'_> {
        BTree::new(&mut self.pager, self.root_page_num)
    }

    /// Insert a row keyed by its id.
    ///
    /// # Errors
    ///
    /// - `DuplicateKey` if a row with the same id exists
    /// - `Pager(CapacityExceeded)` if the table is out of pages
    /// - `NotImplemented` if the tree would need a third level
    pub fn insert(&mut self, row: &Row) -> Result<(), BTreeError> {
        self.tree().insert(row.id, row)
    }

    /// Cursor at `key`, or at the slot where it would be inserted.
    pub fn find(&mut self, key: u32) -> Result<Cursor<'_>, BTreeError> {
        self.tree().find(key)
    }

    /// Row with the given id, if present.
    pub fn get(&mut self, id: u32) -> Result<Option<Row>, BTreeError> {
        let mut cursor = self.find(id)?;
        if !cursor.has_cell()? || cursor.key()? != id {
            return Ok(None);
        }
        cursor.row().map(Some)
    }

    /// Cursor at the first row.
    pub fn start(&mut self) -> Result<Cursor<'_>, BTreeError> {
        self.tree().start()
    }

    /// All rows in ascending id order.
    pub fn scan(&mut self) -> Result<Scan<'_>, BTreeError> {
        Ok(Scan::new(self.start()?))
    }

    /// Write every resident page back and close the file.
    pub fn close(self) -> Result<(), BTreeError> {
        let num_pages = self.pager.num_pages();
        self.pager.close()?;
        tracing::info!(num_pages, "closed table");
        Ok(())
    }

    #[must_use]
    pub const fn root_page_num(&self) -> PageNum {
        self.root_page_num
    }

    #[must_use]
    pub const fn pager(&self) -> &Pager {
        &self.pager
    }

    pub const fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PagerError;
    use crate::storage::btree::{NodeError, NodeType};
    use crate::testing::{sample_row, scan_ids};
    use tempfile::tempdir;

    #[test]
    fn test_open_initializes_root_leaf() {
        let dir = tempdir().expect("create temp dir");
        let mut table = Table::open(dir.path().join("t.db")).expect("open");

        assert_eq!(table.root_page_num(), 0);
        assert_eq!(table.pager().num_pages(), 1);

        let root = table.pager_mut().get_page(0).expect("root");
        assert_eq!(node::node_type(root), Ok(NodeType::Leaf));
        assert!(node::is_root(root));
        assert_eq!(leaf::num_cells(root), Ok(0));

        assert!(table.scan().expect("scan").next().is_none());
    }

    #[test]
    fn test_get_present_and_absent() {
        let dir = tempdir().expect("create temp dir");
        let mut table = Table::open(dir.path().join("t.db")).expect("open");
        for id in [10, 20] {
            table.insert(&sample_row(id)).expect("insert");
        }

        assert_eq!(table.get(10).expect("get"), Some(sample_row(10)));
        assert_eq!(table.get(15).expect("get"), None);
        assert_eq!(table.get(99).expect("get"), None);
    }

    #[test]
    fn test_close_writes_whole_pages() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("t.db");

        let mut table = Table::open(&path).expect("open");
        table.insert(&sample_row(1)).expect("insert");
        table.close().expect("close");

        let len = std::fs::metadata(&path).expect("metadata").len();
        assert_eq!(len, 4096);

        let mut table = Table::open(&path).expect("reopen");
        assert_eq!(scan_ids(&mut table), vec![1]);
    }

    #[test]
    fn test_open_with_config_respects_max_pages() {
        let dir = tempdir().expect("create temp dir");
        let config = EngineConfig {
            max_pages: 3,
            ..EngineConfig::default()
        };
        let table = Table::open_with_config(dir.path().join("t.db"), &config).expect("open");
        assert_eq!(table.pager().max_pages(), 3);
    }

    #[test]
    fn test_open_rejects_garbage_root() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("t.db");
        std::fs::write(&path, [0xEEu8; 4096]).expect("write file");

        assert!(matches!(
            Table::open(&path),
            Err(BTreeError::Node(NodeError::InvalidNodeType(0xEE)))
        ));
    }

    #[test]
    fn test_open_directory_is_io_error() {
        let dir = tempdir().expect("create temp dir");
        assert!(matches!(
            Table::open(dir.path()),
            Err(BTreeError::Pager(PagerError::Io(_)))
        ));
    }
}
