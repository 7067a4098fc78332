//! B-tree over fixed-size pages.
//!
//! # Structure
//!
//! The tree consists of:
//! - Leaf nodes: sorted `(key, row)` cells
//! - Internal nodes: routing keys and child page numbers, plus a right child
//!   holding every key above the last routing key
//!
//! # Usage
//!
//! ```
//! use tinydb::storage::btree::{LEAF_NODE_MAX_CELLS, LEAF_NODE_LEFT_SPLIT_COUNT,
//!     LEAF_NODE_RIGHT_SPLIT_COUNT};
//!
//! // A full leaf plus one new cell is divided between two leaves.
//! assert_eq!(
//!     LEAF_NODE_LEFT_SPLIT_COUNT + LEAF_NODE_RIGHT_SPLIT_COUNT,
//!     LEAF_NODE_MAX_CELLS + 1
//! );
//! ```

mod cursor;
pub mod internal;
pub mod leaf;
pub mod node;
mod tree;

pub use cursor::{Cursor, Scan};
pub use internal::INTERNAL_NODE_MAX_KEYS;
pub use leaf::{
    LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS,
    LEAF_NODE_RIGHT_SPLIT_COUNT, LEAF_NODE_SPACE_FOR_CELLS, LeafWriteError,
};
pub use node::{COMMON_NODE_HEADER_SIZE, NodeError, NodeHeader, NodeType};
pub use tree::{BTree, BTreeError, Unsupported};
