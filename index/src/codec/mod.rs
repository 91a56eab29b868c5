//! Order-preserving key encoding.
//!
//! - [`pack`] / [`unpack`] convert logical composite keys to and from bytes.
//! - [`KeyComparator`] implementations order the packed form.
//! - [`sortable`] and [`varint`] hold the primitive encodings.

mod comparator;
mod key;
pub mod sortable;
pub mod varint;

pub use comparator::{BytewiseComparator, KeyComparator, MultiColumnKeyComparator};
pub use key::{CodecError, NULL_MARKER, PRESENT_MARKER, compare_values, pack, unpack};
