//! Single-file page store.
//!
//! # File Format
//!
//! The table is stored in one file of 4KB pages. Page 0 is always the root
//! of the B-tree; every other page is a leaf or internal node reachable from
//! it. The file length is always a whole number of pages.
//!
//! # Usage
//!
//! ```ignore
//! use tinydb::storage::{Pager, DEFAULT_MAX_PAGES};
//!
//! let mut pager = Pager::open(path, DEFAULT_MAX_PAGES)?;
//! let page = pager.get_page(0)?;
//! page.write_u32(0, 7);
//! pager.close()?;
//! ```

pub mod btree;
mod page;
mod pager;

pub use page::{PAGE_SIZE, Page, PageNum, page_offset};
pub use pager::{DEFAULT_MAX_PAGES, Pager, PagerError};
