//! Test that rows survive closing and reopening the table.

use crate::config::EngineConfig;
use crate::e2e_tests::helpers::*;

#[test]
fn test_reopen_single_leaf() {
    let mut test = TestTable::new();
    insert_ids(&mut test.table, [2, 1]);

    let mut test = test.reopen(&EngineConfig::default());
    assert_eq!(scan_ids(&mut test.table), vec![1, 2]);
    assert_eq!(test.table.get(2).expect("get"), Some(sample_row(2)));
}

#[test]
fn test_reopen_after_splits() {
    let mut test = TestTable::new();
    insert_ids(&mut test.table, (1..=50).rev());
    let before = scan_ids(&mut test.table);
    let num_pages = test.table.pager().num_pages();

    let mut test = test.reopen(&EngineConfig::default());
    assert_eq!(test.table.pager().num_pages(), num_pages);
    assert_eq!(
        std::fs::metadata(test.path()).expect("metadata").len(),
        u64::from(num_pages) * 4096
    );
    assert_eq!(scan_ids(&mut test.table), before);
    assert_eq!(check_tree(&mut test.table), before);

    // The reopened table keeps accepting inserts.
    insert_ids(&mut test.table, [51, 0]);
    assert_eq!(scan_ids(&mut test.table), (0..=51).collect::<Vec<_>>());
}

#[test]
fn test_reopen_with_smaller_limit_fails() {
    let mut test = TestTable::new();
    insert_ids(&mut test.table, 1..=30);
    let num_pages = test.table.pager().num_pages() as usize;
    let path = test.path();

    let TestTable { table, dir: _dir } = test;
    table.close().expect("close");

    // The file already holds more pages than the new limit allows.
    let config = EngineConfig {
        max_pages: num_pages - 1,
        ..EngineConfig::default()
    };
    assert!(matches!(
        crate::Table::open_with_config(&path, &config),
        Err(crate::BTreeError::Pager(
            crate::storage::PagerError::CapacityExceeded { .. }
        ))
    ));
}
