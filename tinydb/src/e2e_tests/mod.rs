//! End-to-end tests at the table level.
//!
//! Each test file covers a specific scenario, using deterministic inputs
//! and a fresh database file per test.

#![cfg(test)]

mod helpers;

mod test_capacity;
mod test_corrupt_file;
mod test_duplicate_key;
mod test_insert_and_scan;
mod test_many_inserts;
mod test_max_depth;
mod test_persistence;
mod test_root_split;
mod test_string_limits;
