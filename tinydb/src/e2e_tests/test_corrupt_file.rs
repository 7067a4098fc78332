//! Test that torn or scrambled database files fail with an error.

use crate::diagnostics::dump_tree;
use crate::storage::PagerError;
use crate::storage::btree::NodeError;
use crate::testing::sample_row;
use crate::{BTreeError, Table};

#[test]
fn test_partial_page_is_corrupt() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("torn.db");
    std::fs::write(&path, vec![0u8; 4096 + 100]).expect("write file");

    let err = Table::open(&path).err().expect("open must fail");
    assert!(matches!(
        err,
        BTreeError::Pager(PagerError::CorruptFile { file_length: 4196 })
    ));
    assert!(err.is_fatal());

    // Nothing was written back.
    assert_eq!(std::fs::metadata(&path).expect("metadata").len(), 4196);
}

#[test]
fn test_tiny_file_is_corrupt() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("tiny.db");
    std::fs::write(&path, b"hello").expect("write file");

    assert!(matches!(
        Table::open(&path),
        Err(BTreeError::Pager(PagerError::CorruptFile { file_length: 5 }))
    ));
}

/// A zeroed page reads as an internal node whose right child is itself.
#[test]
fn test_zero_filled_page_is_a_cycle() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("zeros.db");
    std::fs::write(&path, vec![0u8; 4096]).expect("write file");

    let mut table = Table::open(&path).expect("open");

    let err = table.scan().err().expect("scan must fail");
    assert!(matches!(
        err,
        BTreeError::Node(NodeError::Cycle { page: 0 })
    ));
    assert!(err.is_fatal());

    assert!(matches!(
        table.insert(&sample_row(1)),
        Err(BTreeError::Node(NodeError::Cycle { page: 0 }))
    ));
    assert!(matches!(
        table.get(1),
        Err(BTreeError::Node(NodeError::Cycle { .. }))
    ));
    assert!(matches!(
        dump_tree(&mut table),
        Err(BTreeError::Node(NodeError::Cycle { page: 0 }))
    ));
}
