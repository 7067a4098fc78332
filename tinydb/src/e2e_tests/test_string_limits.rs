//! Test column length limits.

use crate::e2e_tests::helpers::*;
use crate::types::{COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE, Column, Row, RowError};

#[test]
fn test_max_length_columns_persist() {
    let username = "a".repeat(COLUMN_USERNAME_SIZE);
    let email = "b".repeat(COLUMN_EMAIL_SIZE);
    let row = Row::new(1, &username, &email).expect("row at max length");

    let mut test = TestTable::new();
    test.table.insert(&row).expect("insert");

    let mut test = test.reopen(&crate::config::EngineConfig::default());
    let stored = test.table.get(1).expect("get").expect("row present");
    assert_eq!(stored.username(), username);
    assert_eq!(stored.email(), email);
}

#[test]
fn test_overlong_columns_rejected() {
    let username = "a".repeat(COLUMN_USERNAME_SIZE + 1);
    let err = Row::new(1, &username, "a@b.c").expect_err("too long");
    assert_eq!(
        err,
        RowError::StringTooLong {
            column: Column::Username,
            len: COLUMN_USERNAME_SIZE + 1,
            max: COLUMN_USERNAME_SIZE,
        }
    );
    assert_eq!(err.to_string(), "username is too long: 33 bytes (max 32)");

    let email = "b".repeat(COLUMN_EMAIL_SIZE + 1);
    assert!(Row::new(1, "bob", &email).is_err());

    // A rejected row never reaches the table; the error is not fatal.
    let btree_err = crate::BTreeError::from(err);
    assert!(!btree_err.is_fatal());
}
