//! Test running out of pages.

use crate::BTreeError;
use crate::config::EngineConfig;
use crate::e2e_tests::helpers::*;
use crate::storage::PagerError;

/// Insert ascending ids until one fails; returns the failing id and error.
fn fill(test: &mut TestTable) -> (u32, BTreeError) {
    let mut id = 0;
    loop {
        id += 1;
        if let Err(e) = test.table.insert(&sample_row(id)) {
            return (id, e);
        }
    }
}

#[test]
fn test_capacity_exceeded_leaves_table_unchanged() {
    let config = EngineConfig {
        max_pages: 5,
        ..EngineConfig::default()
    };
    let mut test = TestTable::with_config(&config);

    let (failed_id, err) = fill(&mut test);
    assert!(matches!(
        err,
        BTreeError::Pager(PagerError::CapacityExceeded { max_pages: 5, .. })
    ));
    assert!(err.is_fatal());
    assert_eq!(test.table.pager().num_pages(), 5);

    let before = snapshot(&mut test.table);
    assert!(test.table.insert(&sample_row(failed_id)).is_err());
    assert_eq!(snapshot(&mut test.table), before);

    assert_eq!(check_tree(&mut test.table), (1..failed_id).collect::<Vec<_>>());
}

#[test]
fn test_root_split_needs_two_free_pages() {
    let config = EngineConfig {
        max_pages: 2,
        ..EngineConfig::default()
    };
    let mut test = TestTable::with_config(&config);

    let (failed_id, err) = fill(&mut test);
    assert!(matches!(
        err,
        BTreeError::Pager(PagerError::CapacityExceeded { .. })
    ));
    assert_eq!(failed_id, 14);
    assert_eq!(test.table.pager().num_pages(), 1);
    assert_eq!(scan_ids(&mut test.table), (1..=13).collect::<Vec<_>>());
}

#[test]
fn test_table_full_still_accepts_rows_with_room() {
    let config = EngineConfig {
        max_pages: 3,
        ..EngineConfig::default()
    };
    let mut test = TestTable::with_config(&config);

    let (failed_id, _) = fill(&mut test);

    // The left leaf still has free slots after the root split, so smaller
    // ids go in without allocating.
    let mut test = test.reopen(&config);
    insert_ids(&mut test.table, [0]);
    let mut expected = vec![0];
    expected.extend(1..failed_id);
    assert_eq!(check_tree(&mut test.table), expected);
}
