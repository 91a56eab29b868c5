//! File-backed page store.
//!
//! Pages are stored back to back; page `n` lives at byte offset
//! `(n - 1) * PAGE_SIZE`. The page count is derived from the file length, so
//! a trailing partial page left by an interrupted write is ignored.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::storage::io::{PageStore, StorageError, check_page_id};
use crate::storage::page::{PAGE_SIZE_U64, Page, PageId, PageType};

pub struct DiskPageStore {
    file: File,
    path: PathBuf,
    page_count: u64,
}

impl DiskPageStore {
    /// Open the store at `path`, creating an empty file if none exists.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let page_count = file.metadata()?.len() / PAGE_SIZE_U64;
        debug!(path = %path.display(), page_count, "opened page store");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            page_count,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_at(&mut self, page_id: PageId, page: &Page) -> Result<(), StorageError> {
        let mut stored = page.clone();
        stored.stamp_checksum();
        self.file
            .seek(SeekFrom::Start((page_id - 1) * PAGE_SIZE_U64))?;
        self.file.write_all(stored.as_bytes())?;
        Ok(())
    }
}

impl PageStore for DiskPageStore {
    fn allocate_page(&mut self) -> Result<PageId, StorageError> {
        let page_id = self.page_count + 1;
        self.write_at(page_id, &Page::new(PageType::FreeList))?;
        self.page_count = page_id;
        trace!(page_id, "allocated page");
        Ok(page_id)
    }

    fn read_page(&mut self, page_id: PageId) -> Result<Page, StorageError> {
        check_page_id(page_id, self.page_count)?;

        let mut page = Page::new(PageType::FreeList);
        self.file
            .seek(SeekFrom::Start((page_id - 1) * PAGE_SIZE_U64))?;
        self.file.read_exact(page.as_bytes_mut())?;
        page.verify_checksum()?;
        trace!(page_id, "read page");
        Ok(page)
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<(), StorageError> {
        check_page_id(page_id, self.page_count)?;
        self.write_at(page_id, page)?;
        trace!(page_id, "wrote page");
        Ok(())
    }

    fn page_count(&self) -> u64 {
        self.page_count
    }

    fn sync(&mut self) -> Result<(), StorageError> {
        self.file.sync_all()?;
        Ok(())
    }
}

impl std::fmt::Debug for DiskPageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskPageStore")
            .field("path", &self.path)
            .field("page_count", &self.page_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::page::PAGE_SIZE;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_allocate_write_read() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("index.db");
        let mut store = DiskPageStore::open(&path).expect("open store");
        assert_eq!(store.page_count(), 0);

        let first = store.allocate_page().expect("allocate");
        let second = store.allocate_page().expect("allocate");
        assert_eq!((first, second), (1, 2));
        assert_eq!(
            fs::metadata(&path).expect("metadata").len(),
            2 * PAGE_SIZE_U64
        );

        let mut page = Page::new(PageType::Leaf);
        page.insert_record(b"Grace").expect("insert");
        page.set_left_sibling(first);
        store.write_page(second, &page).expect("write");

        let read = store.read_page(second).expect("read");
        assert_eq!(read.record(0).expect("record"), b"Grace");
        assert_eq!(read.left_sibling(), first);
    }

    #[test]
    fn test_reopen_keeps_pages() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("index.db");

        {
            let mut store = DiskPageStore::open(&path).expect("open store");
            for _ in 0..3 {
                store.allocate_page().expect("allocate");
            }
            let mut page = Page::new(PageType::Internal);
            page.insert_record(b"separator").expect("insert");
            page.set_parent(1);
            store.write_page(3, &page).expect("write");
            store.sync().expect("sync");
        }

        let mut store = DiskPageStore::open(&path).expect("reopen store");
        assert_eq!(store.page_count(), 3);
        let page = store.read_page(3).expect("read");
        assert_eq!(page.page_type().expect("type"), PageType::Internal);
        assert_eq!(page.record(0).expect("record"), b"separator");
        assert_eq!(page.parent(), 1);
    }

    #[test]
    fn test_out_of_bounds() {
        let dir = tempdir().expect("create temp dir");
        let mut store = DiskPageStore::open(&dir.path().join("index.db")).expect("open store");
        store.allocate_page().expect("allocate");

        assert!(matches!(
            store.read_page(0),
            Err(StorageError::InvalidPageId(0))
        ));
        assert!(matches!(
            store.read_page(2),
            Err(StorageError::PageOutOfBounds {
                page_id: 2,
                total_pages: 1
            })
        ));
    }

    #[test]
    fn test_corruption_detected_on_read() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("index.db");
        {
            let mut store = DiskPageStore::open(&path).expect("open store");
            store.allocate_page().expect("allocate");
            let mut page = Page::new(PageType::Leaf);
            page.insert_record(b"payload").expect("insert");
            store.write_page(1, &page).expect("write");
        }

        let mut bytes = fs::read(&path).expect("read file");
        bytes[PAGE_SIZE - 1] ^= 0xFF;
        fs::write(&path, &bytes).expect("write file");

        let mut store = DiskPageStore::open(&path).expect("reopen store");
        assert!(matches!(
            store.read_page(1),
            Err(StorageError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_partial_trailing_page_ignored() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("index.db");
        {
            let mut store = DiskPageStore::open(&path).expect("open store");
            store.allocate_page().expect("allocate");
        }
        let mut bytes = fs::read(&path).expect("read file");
        bytes.extend_from_slice(&[0u8; 100]);
        fs::write(&path, &bytes).expect("write file");

        let store = DiskPageStore::open(&path).expect("reopen store");
        assert_eq!(store.page_count(), 1);
    }
}
