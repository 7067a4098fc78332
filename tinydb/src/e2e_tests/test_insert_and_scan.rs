//! Test inserting out of order and scanning back in key order.

use crate::e2e_tests::helpers::*;

#[test]
fn test_out_of_order_inserts_scan_ascending() {
    let mut test = TestTable::new();

    insert_ids(&mut test.table, [3, 1, 2]);

    let rows: Vec<_> = test
        .table
        .scan()
        .expect("scan")
        .map(|row| row.expect("row"))
        .collect();
    assert_eq!(rows, vec![sample_row(1), sample_row(2), sample_row(3)]);
    assert_eq!(rows[0].to_string(), "(1, user1, person1@example.com)");
}

#[test]
fn test_scan_empty_table() {
    let mut test = TestTable::new();

    assert!(test.table.scan().expect("scan").next().is_none());
    assert!(test.table.start().expect("start").is_end());
}

#[test]
fn test_find_reports_insertion_point() {
    let mut test = TestTable::new();
    insert_ids(&mut test.table, [10, 30]);

    let mut cursor = test.table.find(20).expect("find");
    assert_eq!(cursor.cell_num(), 1);
    assert_eq!(cursor.key().expect("key"), 30);

    assert_eq!(test.table.get(20).expect("get"), None);
    assert_eq!(test.table.get(30).expect("get"), Some(sample_row(30)));
}
