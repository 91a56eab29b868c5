//! Slotted pages.
//!
//! Every page is 4KB. The header sits at the front, the slot array grows
//! upward after it, and record bytes grow downward from the end of the page:
//!
//! ```text
//! +--------------------------------------+ 0
//! | header                               |
//! +--------------------------------------+ HEADER_SIZE
//! | slot 0 | slot 1 | ...                |
//! +--------------------------------------+ free_space_start
//! |             free space               |
//! +--------------------------------------+ free_space_end
//! | ... | record 1 | record 0            |
//! +--------------------------------------+ PAGE_SIZE
//! ```
//!
//! Header layout (little-endian):
//!
//! | offset | size | field                |
//! |--------|------|----------------------|
//! | 0      | 1    | page type            |
//! | 1      | 1    | reserved             |
//! | 2      | 2    | record count         |
//! | 4      | 2    | free space start     |
//! | 6      | 2    | free space end       |
//! | 8      | 8    | parent page id       |
//! | 16     | 8    | left sibling page id |
//! | 24     | 8    | right sibling page id|
//! | 32     | 8    | lsn                  |
//! | 40     | 4    | checksum (CRC32)     |
//! | 44     | 4    | reserved             |
//!
//! A slot is a `(offset, length)` pair of `u16`s. Deleting a record zeroes
//! its slot offset, so slot numbers stay stable until the page is reused.

use crate::storage::io::StorageError;

/// Page size in bytes (4KB).
pub const PAGE_SIZE: usize = 4096;

/// Page size as u64 for offset calculations.
pub const PAGE_SIZE_U64: u64 = PAGE_SIZE as u64;

/// A page identifier. Valid ids start at 1.
pub type PageId = u64;

/// Link value meaning "no page".
pub const NO_PAGE: PageId = 0;

/// Size of the page header in bytes.
pub const HEADER_SIZE: usize = 48;

/// Size of one slot array entry in bytes.
pub const SLOT_SIZE: usize = 4;

/// Largest record a single empty page can hold.
pub const MAX_RECORD_SIZE: usize = PAGE_SIZE - HEADER_SIZE - SLOT_SIZE;

const TYPE_OFFSET: usize = 0;
const RECORD_COUNT_OFFSET: usize = 2;
const FREE_START_OFFSET: usize = 4;
const FREE_END_OFFSET: usize = 6;
const PARENT_OFFSET: usize = 8;
const LEFT_SIBLING_OFFSET: usize = 16;
const RIGHT_SIBLING_OFFSET: usize = 24;
const LSN_OFFSET: usize = 32;
const CHECKSUM_OFFSET: usize = 40;

/// Page type identifiers stored in page headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PageType {
    /// Tree internal node
    Internal = 0x00,
    /// Tree leaf node
    Leaf = 0x01,
    /// Page on the free list
    FreeList = 0x02,
}

impl TryFrom<u8> for PageType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Internal),
            0x01 => Ok(Self::Leaf),
            0x02 => Ok(Self::FreeList),
            _ => Err(value),
        }
    }
}

/// A raw page buffer with a slotted record layout.
#[derive(Clone)]
pub struct Page {
    data: Box<[u8; PAGE_SIZE]>,
}

impl Page {
    /// Create an empty page of the given type with no parent or siblings.
    #[must_use]
    pub fn new(page_type: PageType) -> Self {
        let mut page = Self {
            data: Box::new([0u8; PAGE_SIZE]),
        };
        page.set_page_type(page_type);
        page.write_u16(FREE_START_OFFSET, to_u16(HEADER_SIZE));
        page.write_u16(FREE_END_OFFSET, to_u16(PAGE_SIZE));
        page
    }

    /// Create a page from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; PAGE_SIZE]) -> Self {
        Self {
            data: Box::new(*bytes),
        }
    }

    /// Get the raw page data.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }

    // ========== Header ==========

    pub fn page_type(&self) -> Result<PageType, StorageError> {
        PageType::try_from(self.data[TYPE_OFFSET]).map_err(StorageError::InvalidPageType)
    }

    pub fn set_page_type(&mut self, page_type: PageType) {
        self.data[TYPE_OFFSET] = page_type as u8;
    }

    /// Number of slots, including deleted ones.
    #[must_use]
    pub fn record_count(&self) -> u16 {
        self.read_u16(RECORD_COUNT_OFFSET)
    }

    #[must_use]
    pub fn free_space_start(&self) -> usize {
        usize::from(self.read_u16(FREE_START_OFFSET))
    }

    #[must_use]
    pub fn free_space_end(&self) -> usize {
        usize::from(self.read_u16(FREE_END_OFFSET))
    }

    /// Contiguous bytes between the slot array and the record area.
    #[must_use]
    pub fn free_space(&self) -> usize {
        self.free_space_end().saturating_sub(self.free_space_start())
    }

    #[must_use]
    pub fn parent(&self) -> PageId {
        self.read_u64(PARENT_OFFSET)
    }

    pub fn set_parent(&mut self, page_id: PageId) {
        self.write_u64(PARENT_OFFSET, page_id);
    }

    #[must_use]
    pub fn left_sibling(&self) -> PageId {
        self.read_u64(LEFT_SIBLING_OFFSET)
    }

    pub fn set_left_sibling(&mut self, page_id: PageId) {
        self.write_u64(LEFT_SIBLING_OFFSET, page_id);
    }

    #[must_use]
    pub fn right_sibling(&self) -> PageId {
        self.read_u64(RIGHT_SIBLING_OFFSET)
    }

    pub fn set_right_sibling(&mut self, page_id: PageId) {
        self.write_u64(RIGHT_SIBLING_OFFSET, page_id);
    }

    /// Log sequence number. Reserved; no log writes it yet.
    #[must_use]
    pub fn lsn(&self) -> u64 {
        self.read_u64(LSN_OFFSET)
    }

    pub fn set_lsn(&mut self, lsn: u64) {
        self.write_u64(LSN_OFFSET, lsn);
    }

    // ========== Records ==========

    /// Store `record` in the page and return its slot number.
    ///
    /// Compacts the record area first when only fragmented space would fit.
    pub fn insert_record(&mut self, record: &[u8]) -> Result<u16, StorageError> {
        self.check_layout()?;
        self.reserve(record.len() + SLOT_SIZE)?;
        let slot = self.record_count();
        let offset = self.place(record);
        let start = self.free_space_start();
        self.write_slot(slot, offset, record.len());
        self.write_u16(FREE_START_OFFSET, to_u16(start + SLOT_SIZE));
        self.write_u16(RECORD_COUNT_OFFSET, slot + 1);
        Ok(slot)
    }

    /// Bytes of the record in `slot`.
    pub fn record(&self, slot: u16) -> Result<&[u8], StorageError> {
        let (offset, len) = self.slot(slot)?;
        Ok(&self.data[offset..offset + len])
    }

    /// Mark the record in `slot` deleted. Its bytes are reclaimed by the next
    /// compaction.
    pub fn delete_record(&mut self, slot: u16) -> Result<(), StorageError> {
        self.slot(slot)?;
        self.write_slot(slot, 0, 0);
        Ok(())
    }

    /// Replace the record in `slot`, keeping its slot number.
    ///
    /// A record that does not grow is rewritten in place. A larger one is
    /// moved to fresh space; on `PageFull` the page is left untouched.
    pub fn update_record(&mut self, slot: u16, record: &[u8]) -> Result<(), StorageError> {
        let (offset, len) = self.slot(slot)?;
        if record.len() <= len {
            self.data[offset..offset + record.len()].copy_from_slice(record);
            self.write_slot(slot, offset, record.len());
            return Ok(());
        }

        let available = self.free_space() + self.reclaimable() + len;
        if record.len() > available {
            return Err(StorageError::PageFull {
                needed: record.len(),
                available,
            });
        }
        self.write_slot(slot, 0, 0);
        self.reserve(record.len())?;
        let offset = self.place(record);
        self.write_slot(slot, offset, record.len());
        Ok(())
    }

    /// Live records with their slot numbers, in slot order.
    pub fn records(&self) -> impl Iterator<Item = (u16, &[u8])> + '_ {
        (0..self.record_count()).filter_map(move |slot| self.record(slot).ok().map(|r| (slot, r)))
    }

    /// Bytes held by deleted or shrunk records.
    #[must_use]
    pub fn reclaimable(&self) -> usize {
        let used: usize = self.records().map(|(_, record)| record.len()).sum();
        PAGE_SIZE
            .saturating_sub(self.free_space_end())
            .saturating_sub(used)
    }

    /// Pack live records against the end of the page. Slot numbers are kept.
    pub fn compact(&mut self) -> Result<(), StorageError> {
        self.check_layout()?;
        let mut live = Vec::new();
        for slot in 0..self.record_count() {
            match self.record(slot) {
                Ok(record) => live.push((slot, record.to_vec())),
                Err(StorageError::RecordNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        let mut end = PAGE_SIZE;
        for (slot, record) in &live {
            end -= record.len();
            self.data[end..end + record.len()].copy_from_slice(record);
            self.write_slot(*slot, end, record.len());
        }
        self.write_u16(FREE_END_OFFSET, to_u16(end));
        Ok(())
    }

    /// Header free-space bounds must frame the slot array and stay inside
    /// the page.
    fn check_layout(&self) -> Result<(), StorageError> {
        let start = self.free_space_start();
        let end = self.free_space_end();
        let slots_end = slot_position(self.record_count());
        if start != slots_end || start > end || end > PAGE_SIZE {
            return Err(StorageError::Corruption(format!(
                "free space [{start}, {end}) does not fit {} slots",
                self.record_count()
            )));
        }
        Ok(())
    }

    fn reserve(&mut self, needed: usize) -> Result<(), StorageError> {
        if self.free_space() >= needed {
            return Ok(());
        }
        let available = self.free_space() + self.reclaimable();
        if available < needed {
            return Err(StorageError::PageFull { needed, available });
        }
        self.compact()
    }

    /// Copy `record` to the top of the record area. Space must be reserved.
    fn place(&mut self, record: &[u8]) -> usize {
        let end = self.free_space_end() - record.len();
        self.data[end..end + record.len()].copy_from_slice(record);
        self.write_u16(FREE_END_OFFSET, to_u16(end));
        end
    }

    fn slot(&self, slot: u16) -> Result<(usize, usize), StorageError> {
        self.check_layout()?;
        if slot >= self.record_count() {
            return Err(StorageError::RecordNotFound { slot });
        }
        let at = slot_position(slot);
        let offset = usize::from(self.read_u16(at));
        let len = usize::from(self.read_u16(at + 2));
        if offset == 0 {
            return Err(StorageError::RecordNotFound { slot });
        }
        if offset < self.free_space_end() || offset + len > PAGE_SIZE {
            return Err(StorageError::Corruption(format!(
                "slot {slot} points at [{offset}, {}) outside the record area",
                offset + len
            )));
        }
        Ok((offset, len))
    }

    fn write_slot(&mut self, slot: u16, offset: usize, len: usize) {
        let at = slot_position(slot);
        self.write_u16(at, to_u16(offset));
        self.write_u16(at + 2, to_u16(len));
    }

    // ========== Checksum ==========

    /// CRC32 of the page with the checksum field read as zero.
    #[must_use]
    pub fn compute_checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.data[..CHECKSUM_OFFSET]);
        hasher.update(&[0u8; 4]);
        hasher.update(&self.data[CHECKSUM_OFFSET + 4..]);
        hasher.finalize()
    }

    #[must_use]
    pub fn stored_checksum(&self) -> u32 {
        let bytes = &self.data[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4];
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Write the current checksum into the header.
    pub fn stamp_checksum(&mut self) {
        let checksum = self.compute_checksum();
        self.data[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&checksum.to_le_bytes());
    }

    pub fn verify_checksum(&self) -> Result<(), StorageError> {
        let expected = self.stored_checksum();
        let actual = self.compute_checksum();
        if expected == actual {
            Ok(())
        } else {
            Err(StorageError::ChecksumMismatch { expected, actual })
        }
    }

    fn read_u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.data[offset], self.data[offset + 1]])
    }

    fn write_u16(&mut self, offset: usize, value: u16) {
        self.data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn read_u64(&self, offset: usize) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[offset..offset + 8]);
        u64::from_le_bytes(bytes)
    }

    fn write_u64(&mut self, offset: usize, value: u64) {
        self.data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("page_type", &self.data[TYPE_OFFSET])
            .field("record_count", &self.record_count())
            .field("free_space", &self.free_space())
            .finish_non_exhaustive()
    }
}

fn slot_position(slot: u16) -> usize {
    HEADER_SIZE + usize::from(slot) * SLOT_SIZE
}

/// Offsets and lengths inside a page always fit in 16 bits.
#[allow(clippy::cast_possible_truncation)]
const fn to_u16(value: usize) -> u16 {
    value as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_page_header() {
        let page = Page::new(PageType::Leaf);
        assert_eq!(page.page_type().expect("type"), PageType::Leaf);
        assert_eq!(page.record_count(), 0);
        assert_eq!(page.free_space_start(), HEADER_SIZE);
        assert_eq!(page.free_space_end(), PAGE_SIZE);
        assert_eq!(page.free_space(), PAGE_SIZE - HEADER_SIZE);
        assert_eq!(page.parent(), NO_PAGE);
        assert_eq!(page.left_sibling(), NO_PAGE);
        assert_eq!(page.right_sibling(), NO_PAGE);
        assert_eq!(page.lsn(), 0);
    }

    #[test]
    fn test_header_links() {
        let mut page = Page::new(PageType::Internal);
        page.set_parent(7);
        page.set_left_sibling(3);
        page.set_right_sibling(9);
        page.set_lsn(42);
        page.set_page_type(PageType::Leaf);

        let restored = Page::from_bytes(page.as_bytes());
        assert_eq!(restored.page_type().expect("type"), PageType::Leaf);
        assert_eq!(restored.parent(), 7);
        assert_eq!(restored.left_sibling(), 3);
        assert_eq!(restored.right_sibling(), 9);
        assert_eq!(restored.lsn(), 42);
    }

    #[test]
    fn test_page_type_conversion() {
        assert_eq!(PageType::try_from(0x00), Ok(PageType::Internal));
        assert_eq!(PageType::try_from(0x01), Ok(PageType::Leaf));
        assert_eq!(PageType::try_from(0x02), Ok(PageType::FreeList));
        assert!(PageType::try_from(0xFF).is_err());

        let mut page = Page::new(PageType::Leaf);
        page.as_bytes_mut()[0] = 0x7F;
        assert!(matches!(
            page.page_type(),
            Err(StorageError::InvalidPageType(0x7F))
        ));
    }

    #[test]
    fn test_insert_and_read_records() {
        let mut page = Page::new(PageType::Leaf);
        let a = page.insert_record(b"alpha").expect("insert alpha");
        let b = page.insert_record(b"").expect("insert empty");
        let c = page.insert_record(b"gamma!").expect("insert gamma");

        assert_eq!((a, b, c), (0, 1, 2));
        assert_eq!(page.record(a).expect("a"), b"alpha");
        assert_eq!(page.record(b).expect("b"), b"");
        assert_eq!(page.record(c).expect("c"), b"gamma!");
        assert_eq!(page.record_count(), 3);
        assert_eq!(page.free_space_start(), HEADER_SIZE + 3 * SLOT_SIZE);
        assert_eq!(page.free_space_end(), PAGE_SIZE - 11);
        assert!(matches!(
            page.record(3),
            Err(StorageError::RecordNotFound { slot: 3 })
        ));
    }

    #[test]
    fn test_delete_keeps_slot_numbers() {
        let mut page = Page::new(PageType::Leaf);
        page.insert_record(b"one").expect("insert");
        page.insert_record(b"two").expect("insert");
        page.insert_record(b"three").expect("insert");

        page.delete_record(1).expect("delete");
        assert!(page.record(1).is_err());
        assert!(page.delete_record(1).is_err());
        assert_eq!(page.record(2).expect("slot 2"), b"three");
        assert_eq!(page.reclaimable(), 3);

        let live: Vec<u16> = page.records().map(|(slot, _)| slot).collect();
        assert_eq!(live, vec![0, 2]);

        page.compact().expect("compact");
        assert_eq!(page.reclaimable(), 0);
        assert_eq!(page.record(0).expect("slot 0"), b"one");
        assert_eq!(page.record(2).expect("slot 2"), b"three");
        assert_eq!(page.free_space_end(), PAGE_SIZE - 8);
    }

    #[test]
    fn test_update_record() {
        let mut page = Page::new(PageType::Leaf);
        page.insert_record(b"short").expect("insert");
        page.insert_record(b"neighbor").expect("insert");

        page.update_record(0, b"tiny").expect("shrink");
        assert_eq!(page.record(0).expect("slot 0"), b"tiny");
        assert_eq!(page.reclaimable(), 1);

        page.update_record(0, b"considerably longer").expect("grow");
        assert_eq!(page.record(0).expect("slot 0"), b"considerably longer");
        assert_eq!(page.record(1).expect("slot 1"), b"neighbor");
        assert_eq!(page.record_count(), 2);

        assert!(matches!(
            page.update_record(5, b"x"),
            Err(StorageError::RecordNotFound { slot: 5 })
        ));
    }

    #[test]
    fn test_page_full_and_reuse_after_delete() {
        let mut page = Page::new(PageType::Leaf);
        let record = [0xABu8; 100];
        let mut inserted = 0u16;
        loop {
            match page.insert_record(&record) {
                Ok(_) => inserted += 1,
                Err(StorageError::PageFull { needed, available }) => {
                    assert_eq!(needed, record.len() + SLOT_SIZE);
                    assert!(available < needed);
                    break;
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(
            usize::from(inserted),
            (PAGE_SIZE - HEADER_SIZE) / (record.len() + SLOT_SIZE)
        );

        page.delete_record(0).expect("delete");
        let slot = page.insert_record(&record).expect("insert after compaction");
        assert_eq!(slot, inserted);
        assert_eq!(page.reclaimable(), 0);
        assert_eq!(page.records().count(), usize::from(inserted));
    }

    #[test]
    fn test_failed_update_leaves_page_untouched() {
        let mut page = Page::new(PageType::Leaf);
        page.insert_record(&[1u8; 2000]).expect("insert");
        page.insert_record(&[2u8; 1900]).expect("insert");

        let before = page.as_bytes().to_vec();
        let result = page.update_record(1, &[3u8; 2100]);
        assert!(matches!(result, Err(StorageError::PageFull { .. })));
        assert_eq!(page.as_bytes().to_vec(), before);
    }

    #[test]
    fn test_oversized_record_rejected() {
        let mut page = Page::new(PageType::Leaf);
        assert!(page.insert_record(&vec![0u8; MAX_RECORD_SIZE + 1]).is_err());
        assert!(page.insert_record(&vec![0u8; MAX_RECORD_SIZE]).is_ok());
        assert_eq!(page.free_space(), 0);
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut page = Page::new(PageType::Leaf);
        page.insert_record(b"payload").expect("insert");
        page.stamp_checksum();
        page.verify_checksum().expect("fresh checksum verifies");

        page.as_bytes_mut()[PAGE_SIZE - 1] ^= 0xFF;
        assert!(matches!(
            page.verify_checksum(),
            Err(StorageError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_slot_outside_page_is_corruption() {
        let mut page = Page::new(PageType::Leaf);
        page.insert_record(b"abc").expect("insert");
        page.write_u16(HEADER_SIZE, 4090);
        page.write_u16(HEADER_SIZE + 2, 100);
        page.stamp_checksum();

        let page = Page::from_bytes(page.as_bytes());
        page.verify_checksum().expect("checksum matches the bytes");
        assert!(matches!(page.record(0), Err(StorageError::Corruption(_))));
        assert_eq!(page.records().count(), 0);

        let mut page = page;
        assert!(matches!(
            page.update_record(0, b"x"),
            Err(StorageError::Corruption(_))
        ));
        assert!(matches!(page.compact(), Err(StorageError::Corruption(_))));
    }

    #[test]
    fn test_bad_free_space_bounds_are_corruption() {
        let mut page = Page::new(PageType::Leaf);
        page.insert_record(b"abc").expect("insert");

        let mut past_end = page.clone();
        past_end.write_u16(FREE_END_OFFSET, 5000);
        assert!(matches!(
            past_end.insert_record(b"more"),
            Err(StorageError::Corruption(_))
        ));
        assert!(matches!(past_end.record(0), Err(StorageError::Corruption(_))));
        assert_eq!(past_end.reclaimable(), 0);

        let mut too_many_slots = page;
        too_many_slots.write_u16(RECORD_COUNT_OFFSET, 2000);
        assert!(matches!(
            too_many_slots.insert_record(b"more"),
            Err(StorageError::Corruption(_))
        ));
    }
}
