//! Page cache backed by the database file.
//!
//! The pager is the only component that touches the file. Pages are loaded on
//! first access and stay resident until the pager is closed, at which point
//! every resident page is written back as a whole page.
//!
//! # Invariants
//!
//! - The file length is always a whole number of pages.
//! - `pages.len() <= max_pages`; no page number at or above `max_pages` is
//!   ever materialized.
//! - `num_pages` is one past the highest page number known to exist, either
//!   on disk or in the cache.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::storage::page::{PAGE_SIZE, PAGE_SIZE_U64, Page, PageNum, page_offset};

/// Default ceiling on the number of pages a table may hold.
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Owns the database file and all resident pages.
pub struct Pager {
    file: File,
    /// File length at open time. Pages inside this extent are read from disk
    /// on a cache miss; pages beyond it start zeroed.
    file_length: u64,
    num_pages: PageNum,
    /// Page-number-keyed arena. `None` means not resident.
    pages: Vec<Option<Page>>,
    max_pages: usize,
}

impl Pager {
    /// Open (or create) the database file at `path`.
    ///
    /// No page is read here; the file length is validated first so a torn
    /// file is rejected before anything is interpreted.
    ///
    /// `max_pages` is clamped to what a [`PageNum`] can address.
    pub fn open(path: &Path, max_pages: usize) -> Result<Self, PagerError> {
        let max_pages = max_pages.min(PageNum::MAX as usize);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(PagerError::Io)?;

        let file_length = file.metadata().map_err(PagerError::Io)?.len();
        if file_length % PAGE_SIZE_U64 != 0 {
            return Err(PagerError::CorruptFile { file_length });
        }

        let num_pages = PageNum::try_from(file_length / PAGE_SIZE_U64).map_err(|_| {
            PagerError::CapacityExceeded {
                page_num: PageNum::MAX,
                max_pages,
            }
        })?;
        if num_pages as usize > max_pages {
            return Err(PagerError::CapacityExceeded {
                page_num: num_pages - 1,
                max_pages,
            });
        }

        tracing::debug!(
            path = %path.display(),
            file_length,
            num_pages,
            "opened database file"
        );

        Ok(Self {
            file,
            file_length,
            num_pages,
            pages: Vec::new(),
            max_pages,
        })
    }

    /// Get a page, loading it from disk on a cache miss.
    ///
    /// A page beyond the end of the file comes back zeroed. Requesting a page
    /// at or past `num_pages` extends `num_pages` to cover it.
    pub fn get_page(&mut self, page_num: PageNum) -> Result<&mut Page, PagerError> {
        let index = page_num as usize;
        if index >= self.max_pages {
            return Err(PagerError::CapacityExceeded {
                page_num,
                max_pages: self.max_pages,
            });
        }

        if self.pages.len() <= index {
            self.pages.resize_with(index + 1, || None);
        }

        if self.pages[index].is_none() {
            let page = self.load_page(page_num)?;
            self.pages[index] = Some(page);

            if page_num >= self.num_pages {
                self.num_pages = page_num + 1;
            }
        }

        self.pages[index]
            .as_mut()
            .ok_or(PagerError::PageNotResident(page_num))
    }

    /// Read one page worth of bytes from disk, or a zero page past EOF.
    fn load_page(&mut self, page_num: PageNum) -> Result<Page, PagerError> {
        let mut page = Page::new();
        let offset = page_offset(page_num);

        // A trailing partial page still counts as on disk.
        let pages_on_disk = self.file_length.div_ceil(PAGE_SIZE_U64);
        if u64::from(page_num) < pages_on_disk {
            self.file
                .seek(SeekFrom::Start(offset))
                .map_err(PagerError::Io)?;
            let buf = page.as_bytes_mut();
            let mut filled = 0;
            while filled < PAGE_SIZE {
                match self.file.read(&mut buf[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => return Err(PagerError::Io(e)),
                }
            }
            tracing::trace!(page_num, bytes = filled, "loaded page from disk");
        }

        Ok(page)
    }

    /// Write the full buffer of a resident page back to the file.
    pub fn flush(&mut self, page_num: PageNum) -> Result<(), PagerError> {
        let page = self
            .pages
            .get(page_num as usize)
            .and_then(Option::as_ref)
            .ok_or(PagerError::PageNotResident(page_num))?;

        self.file
            .seek(SeekFrom::Start(page_offset(page_num)))
            .map_err(PagerError::Io)?;
        self.file
            .write_all(page.as_bytes())
            .map_err(PagerError::Io)?;

        Ok(())
    }

    /// Flush every resident page, sync the file, and release all buffers.
    pub fn close(mut self) -> Result<(), PagerError> {
        let resident: Vec<PageNum> = self
            .pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page.is_some())
            .filter_map(|(index, _)| PageNum::try_from(index).ok())
            .collect();

        for &page_num in &resident {
            self.flush(page_num)?;
        }

        self.file.sync_all().map_err(PagerError::Io)?;
        tracing::debug!(
            flushed = resident.len(),
            num_pages = self.num_pages,
            "closed database file"
        );

        Ok(())
    }

    /// Page number the next allocation will use.
    ///
    /// Pages are never freed, so new pages always go at the end of the file.
    #[must_use]
    pub const fn unused_page_num(&self) -> PageNum {
        self.num_pages
    }

    /// Check that `count` more pages can be allocated without hitting the ceiling.
    pub fn ensure_capacity(&self, count: usize) -> Result<(), PagerError> {
        let needed = self.num_pages as usize + count;
        if needed > self.max_pages {
            return Err(PagerError::CapacityExceeded {
                page_num: PageNum::try_from(needed - 1).unwrap_or(PageNum::MAX),
                max_pages: self.max_pages,
            });
        }
        Ok(())
    }

    /// Number of pages in the table (on disk or allocated in memory).
    #[must_use]
    pub const fn num_pages(&self) -> PageNum {
        self.num_pages
    }

    /// Number of pages currently held in the cache.
    #[must_use]
    pub fn resident_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_some()).count()
    }

    /// Ceiling on the number of pages.
    #[must_use]
    pub const fn max_pages(&self) -> usize {
        self.max_pages
    }
}

/// Errors that can occur in the pager.
#[derive(Debug)]
pub enum PagerError {
    /// I/O error from open, seek, read, write, or sync.
    Io(std::io::Error),
    /// The file length is not a whole number of pages.
    CorruptFile { file_length: u64 },
    /// The page number is at or above the configured ceiling.
    CapacityExceeded { page_num: PageNum, max_pages: usize },
    /// Tried to flush a page that is not in the cache.
    PageNotResident(PageNum),
}

impl std::fmt::Display for PagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::CorruptFile { file_length } => write!(
                f,
                "db file is not a whole number of pages ({file_length} bytes). Corrupt file."
            ),
            Self::CapacityExceeded {
                page_num,
                max_pages,
            } => write!(
                f,
                "page {page_num} exceeds the page limit (max pages: {max_pages})"
            ),
            Self::PageNotResident(page_num) => write!(f, "tried to flush null page {page_num}"),
        }
    }
}

impl std::error::Error for PagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::CorruptFile { .. } | Self::CapacityExceeded { .. } | Self::PageNotResident(_) => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_empty_file() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");

        let pager = Pager::open(&path, DEFAULT_MAX_PAGES).expect("open");
        assert_eq!(pager.num_pages(), 0);
        assert_eq!(pager.resident_pages(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_open_clamps_max_pages() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");

        let mut pager = Pager::open(&path, usize::MAX).expect("open");
        assert_eq!(pager.max_pages(), PageNum::MAX as usize);

        // Every page below the ceiling is addressable, the ceiling itself is not.
        assert!(pager.ensure_capacity(PageNum::MAX as usize).is_ok());
        assert!(pager.ensure_capacity(PageNum::MAX as usize + 1).is_err());
        assert!(matches!(
            pager.get_page(PageNum::MAX),
            Err(PagerError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_open_rejects_partial_page() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        fs::write(&path, vec![0u8; PAGE_SIZE + 17]).expect("write file");

        let result = Pager::open(&path, DEFAULT_MAX_PAGES);
        assert!(matches!(
            result,
            Err(PagerError::CorruptFile { file_length }) if file_length == 4113
        ));
    }

    #[test]
    fn test_open_rejects_file_over_limit() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        fs::write(&path, vec![0u8; PAGE_SIZE * 3]).expect("write file");

        let result = Pager::open(&path, 2);
        assert!(matches!(result, Err(PagerError::CapacityExceeded { .. })));
    }

    #[test]
    fn test_get_page_beyond_eof_is_zeroed_and_extends() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        let mut pager = Pager::open(&path, DEFAULT_MAX_PAGES).expect("open");

        let page = pager.get_page(4).expect("get page");
        assert!(page.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(pager.num_pages(), 5);
        assert_eq!(pager.unused_page_num(), 5);
        assert_eq!(pager.resident_pages(), 1);
    }

    #[test]
    fn test_get_page_is_cached() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        let mut pager = Pager::open(&path, DEFAULT_MAX_PAGES).expect("open");

        pager.get_page(0).expect("get page").write_u32(8, 99);
        assert_eq!(pager.get_page(0).expect("get page").read_u32(8), 99);
        assert_eq!(pager.resident_pages(), 1);
    }

    #[test]
    fn test_capacity_exceeded() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        let mut pager = Pager::open(&path, 3).expect("open");

        assert!(pager.get_page(2).is_ok());
        assert!(matches!(
            pager.get_page(3),
            Err(PagerError::CapacityExceeded {
                page_num: 3,
                max_pages: 3
            })
        ));
        assert!(pager.ensure_capacity(0).is_ok());
        assert!(pager.ensure_capacity(1).is_err());
    }

    #[test]
    fn test_flush_missing_page() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        let mut pager = Pager::open(&path, DEFAULT_MAX_PAGES).expect("open");

        assert!(matches!(
            pager.flush(7),
            Err(PagerError::PageNotResident(7))
        ));
    }

    #[test]
    fn test_close_writes_whole_pages() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");

        {
            let mut pager = Pager::open(&path, DEFAULT_MAX_PAGES).expect("open");
            pager.get_page(0).expect("page 0").write_u32(0, 0xDEAD_BEEF);
            pager.get_page(2).expect("page 2").write_bytes(100, b"tail");
            pager.close().expect("close");
        }

        let len = fs::metadata(&path).expect("metadata").len();
        assert_eq!(len, 3 * PAGE_SIZE_U64);

        let mut pager = Pager::open(&path, DEFAULT_MAX_PAGES).expect("reopen");
        assert_eq!(pager.num_pages(), 3);
        assert_eq!(pager.get_page(0).expect("page 0").read_u32(0), 0xDEAD_BEEF);
        assert_eq!(
            pager.get_page(2).expect("page 2").read_bytes(100, 4),
            b"tail"
        );
        // Page 1 was never materialized, so the gap reads back as zeros.
        assert!(
            pager
                .get_page(1)
                .expect("page 1")
                .as_bytes()
                .iter()
                .all(|&b| b == 0)
        );
    }
}
