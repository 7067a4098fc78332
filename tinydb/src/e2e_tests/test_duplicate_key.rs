//! Test that inserting an existing id is rejected without side effects.

use crate::BTreeError;
use crate::e2e_tests::helpers::*;
use crate::types::Row;

#[test]
fn test_duplicate_in_single_leaf() {
    let mut test = TestTable::new();
    insert_ids(&mut test.table, [5]);
    let before = snapshot(&mut test.table);

    let other = Row::new(5, "someone", "else@example.com").expect("row");
    let err = test.table.insert(&other).expect_err("duplicate must fail");
    assert!(matches!(err, BTreeError::DuplicateKey(5)));
    assert!(!err.is_fatal());

    assert_eq!(snapshot(&mut test.table), before);
    assert_eq!(scan_ids(&mut test.table), vec![5]);
    assert_eq!(test.table.get(5).expect("get"), Some(sample_row(5)));
}

#[test]
fn test_duplicate_across_leaves() {
    let mut test = TestTable::new();
    insert_ids(&mut test.table, 1..=40);
    let before = snapshot(&mut test.table);

    for id in [1, 7, 8, 20, 40] {
        assert!(matches!(
            test.table.insert(&sample_row(id)),
            Err(BTreeError::DuplicateKey(k)) if k == id
        ));
    }

    assert_eq!(snapshot(&mut test.table), before);
    assert_eq!(check_tree(&mut test.table), (1..=40).collect::<Vec<_>>());
}
