//! Persistence boundary for tree pages.
//!
//! A [`PageStore`] hands out fixed-size pages addressed by [`PageId`]. Ids
//! start at 1; id 0 is reserved as the "no page" value used by sibling and
//! parent links in the page header.

use crate::storage::page::{Page, PageId};

/// Errors that can occur during page or page-store operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error.
    Io(std::io::Error),
    /// Page id past the end of the store.
    PageOutOfBounds { page_id: PageId, total_pages: u64 },
    /// Page id 0, which never names a page.
    InvalidPageId(PageId),
    /// Stored checksum does not match the page contents.
    ChecksumMismatch { expected: u32, actual: u32 },
    /// Unknown page type byte.
    InvalidPageType(u8),
    /// Not enough free space left in the page.
    PageFull { needed: usize, available: usize },
    /// Slot is out of range or was deleted.
    RecordNotFound { slot: u16 },
    /// Page layout fields point outside the page.
    Corruption(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::PageOutOfBounds {
                page_id,
                total_pages,
            } => write!(
                f,
                "page {page_id} out of bounds (total pages: {total_pages})"
            ),
            Self::InvalidPageId(id) => write!(f, "invalid page id: {id}"),
            Self::ChecksumMismatch { expected, actual } => {
                write!(f, "checksum mismatch: expected {expected:#010x}, got {actual:#010x}")
            }
            Self::InvalidPageType(v) => write!(f, "invalid page type: 0x{v:02x}"),
            Self::PageFull { needed, available } => {
                write!(f, "page full: need {needed} bytes, {available} available")
            }
            Self::RecordNotFound { slot } => write!(f, "no record in slot {slot}"),
            Self::Corruption(msg) => write!(f, "corruption: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Abstraction over page-based storage.
///
/// Implementations must ensure:
/// - `allocate_page` returns a fresh id one past the current last page
/// - `read_page` returns the last written content for a page
/// - `read_page` rejects pages whose checksum does not verify
pub trait PageStore {
    /// Reserve a new page and return its id.
    fn allocate_page(&mut self) -> Result<PageId, StorageError>;

    /// Read a page. Fails for id 0 and ids past [`PageStore::page_count`].
    fn read_page(&mut self, page_id: PageId) -> Result<Page, StorageError>;

    /// Write a page, stamping its checksum.
    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<(), StorageError>;

    /// Number of allocated pages.
    fn page_count(&self) -> u64;

    /// Make all previous writes durable.
    fn sync(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Check that `page_id` names an allocated page.
pub const fn check_page_id(page_id: PageId, total_pages: u64) -> Result<(), StorageError> {
    if page_id == 0 {
        return Err(StorageError::InvalidPageId(page_id));
    }
    if page_id > total_pages {
        return Err(StorageError::PageOutOfBounds {
            page_id,
            total_pages,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_page_id() {
        assert!(matches!(
            check_page_id(0, 3),
            Err(StorageError::InvalidPageId(0))
        ));
        assert!(check_page_id(1, 3).is_ok());
        assert!(check_page_id(3, 3).is_ok());
        assert!(matches!(
            check_page_id(4, 3),
            Err(StorageError::PageOutOfBounds {
                page_id: 4,
                total_pages: 3
            })
        ));
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::PageFull {
            needed: 120,
            available: 16,
        };
        assert!(err.to_string().contains("120"));

        let err = StorageError::from(std::io::Error::other("disk gone"));
        assert!(err.to_string().contains("disk gone"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
