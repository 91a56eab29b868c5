//! In-memory page store.

use tracing::trace;

use crate::storage::io::{PageStore, StorageError, check_page_id};
use crate::storage::page::{Page, PageId, PageType};

/// Page store backed by a vector of pages. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    pages: Vec<Page>,
}

impl MemoryPageStore {
    #[must_use]
    pub const fn new() -> Self {
        Self { pages: Vec::new() }
    }

    fn slot(&self, page_id: PageId) -> Result<usize, StorageError> {
        check_page_id(page_id, self.page_count())?;
        usize::try_from(page_id - 1).map_err(|_| StorageError::PageOutOfBounds {
            page_id,
            total_pages: self.page_count(),
        })
    }
}

impl PageStore for MemoryPageStore {
    fn allocate_page(&mut self) -> Result<PageId, StorageError> {
        let mut page = Page::new(PageType::FreeList);
        page.stamp_checksum();
        self.pages.push(page);
        let page_id = self.page_count();
        trace!(page_id, "allocated page");
        Ok(page_id)
    }

    fn read_page(&mut self, page_id: PageId) -> Result<Page, StorageError> {
        let slot = self.slot(page_id)?;
        let page = self.pages[slot].clone();
        page.verify_checksum()?;
        Ok(page)
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<(), StorageError> {
        let slot = self.slot(page_id)?;
        let mut stored = page.clone();
        stored.stamp_checksum();
        self.pages[slot] = stored;
        Ok(())
    }

    fn page_count(&self) -> u64 {
        self.pages.len() as u64
    }
}
