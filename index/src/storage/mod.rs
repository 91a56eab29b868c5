//! Page storage for tree nodes.
//!
//! The tree itself lives in memory; this module is the boundary a persistent
//! layout is written against. Pages are 4KB, slotted, and checksummed.
//!
//! # Usage
//!
//! ```
//! use index::storage::{MemoryPageStore, Page, PageStore, PageType};
//!
//! let mut store = MemoryPageStore::new();
//! let page_id = store.allocate_page()?;
//!
//! let mut page = Page::new(PageType::Leaf);
//! let slot = page.insert_record(b"hello")?;
//! store.write_page(page_id, &page)?;
//!
//! let page = store.read_page(page_id)?;
//! assert_eq!(page.record(slot)?, b"hello");
//! # Ok::<(), index::storage::StorageError>(())
//! ```

mod disk;
mod io;
mod memory;
mod page;

pub use disk::DiskPageStore;
pub use io::{PageStore, StorageError};
pub use memory::MemoryPageStore;
pub use page::{
    HEADER_SIZE, MAX_RECORD_SIZE, NO_PAGE, PAGE_SIZE, Page, PageId, PageType, SLOT_SIZE,
};
