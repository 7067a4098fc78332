//! A single-file row store indexed by a B-tree.
//!
//! Rows have a fixed schema `(id, username, email)` and are keyed by `id`.
//! The table lives in one file of 4KB pages; page 0 is always the root.
//!
//! ```no_run
//! use tinydb::{Row, Table};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut table = Table::open("users.db")?;
//! table.insert(&Row::new(1, "alice", "alice@example.com")?)?;
//! for row in table.scan()? {
//!     println!("{}", row?);
//! }
//! table.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diagnostics;
mod e2e_tests;
pub mod storage;
mod table;
#[cfg(test)]
mod testing;
pub mod types;

pub use storage::btree::{BTreeError, Cursor, Scan, Unsupported};
pub use table::Table;
pub use types::Row;
