//! Shared helpers for unit and end-to-end tests.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::Table;
use crate::config::EngineConfig;
use crate::types::Row;

/// A table in its own temporary directory.
///
/// The directory (and the database file) is removed on drop.
pub struct TestTable {
    pub table: Table,
    pub dir: TempDir,
}

impl TestTable {
    /// Create a fresh table with default settings.
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    /// Create a fresh table with the given settings.
    pub fn with_config(config: &EngineConfig) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let table = Table::open_with_config(dir.path().join("test.db"), config)
            .expect("Failed to open test table");
        Self { table, dir }
    }

    /// Path of the database file.
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("test.db")
    }

    /// Close the table and open the same file again.
    pub fn reopen(self, config: &EngineConfig) -> Self {
        let Self { table, dir } = self;
        table.close().expect("Failed to close test table");
        let table = Table::open_with_config(dir.path().join("test.db"), config)
            .expect("Failed to reopen test table");
        Self { table, dir }
    }
}

/// A row whose text columns are derived from its id.
pub fn sample_row(id: u32) -> Row {
    Row::new(id, &format!("user{id}"), &format!("person{id}@example.com"))
        .expect("sample row fits its columns")
}

/// Ids of every row in scan order.
pub fn scan_ids(table: &mut Table) -> Vec<u32> {
    table
        .scan()
        .expect("Failed to start scan")
        .map(|row| row.expect("Failed to read row").id)
        .collect()
}
