//! Comparators over packed keys.
//!
//! [`MultiColumnKeyComparator`] orders keys produced by [`super::pack`]
//! without decoding them: it walks both keys column by column, slicing each
//! field by its fixed width or varint length prefix, and compares payload
//! bytes directly.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::codec::key::{Field, read_field};
use crate::types::{Column, KeySchema};

/// Total order over encoded keys.
pub trait KeyComparator: fmt::Debug + Send + Sync {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Plain unsigned lexicographic order.
///
/// Correct for keys whose encoding is already order-preserving as a whole,
/// such as a single ascending non-null column.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytewiseComparator;

impl KeyComparator for BytewiseComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}

/// Schema-aware comparator for composite keys.
///
/// Per column:
/// - two nulls are equal and comparison continues;
/// - a single null sorts first in an ascending column and last in a
///   descending one;
/// - otherwise the logical payload bytes are compared unsigned, and the
///   result is reversed for descending columns.
///
/// A key that runs out of columns sorts before any key that continues, so a
/// prefix key positions at the first of its extensions.
#[derive(Debug, Clone)]
pub struct MultiColumnKeyComparator {
    schema: Arc<KeySchema>,
}

impl MultiColumnKeyComparator {
    #[must_use]
    pub const fn new(schema: Arc<KeySchema>) -> Self {
        Self { schema }
    }

    #[must_use]
    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }
}

impl KeyComparator for MultiColumnKeyComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        let (mut a_offset, mut b_offset) = (0, 0);

        for column in self.schema.columns() {
            let (a_rest, b_rest) = (&a[a_offset..], &b[b_offset..]);
            match (a_rest.is_empty(), b_rest.is_empty()) {
                (true, true) => return Ordering::Equal,
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                (false, false) => {}
            }

            // Malformed input has no meaningful column order; keep the
            // comparison total by falling back to raw bytes.
            let (Ok((a_field, a_len)), Ok((b_field, b_len))) =
                (read_field(a_rest, column), read_field(b_rest, column))
            else {
                return a_rest.cmp(b_rest);
            };

            let ordering = compare_fields(a_field, b_field, column);
            if ordering != Ordering::Equal {
                return ordering;
            }
            a_offset += a_len;
            b_offset += b_len;
        }

        a[a_offset..].cmp(&b[b_offset..])
    }
}

fn compare_fields(a: Field<'_>, b: Field<'_>, column: &Column) -> Ordering {
    let ordering = match (a, b) {
        (Field::Null, Field::Null) => Ordering::Equal,
        (Field::Null, Field::Present(_)) => Ordering::Less,
        (Field::Present(_), Field::Null) => Ordering::Greater,
        (Field::Present(x), Field::Present(y)) => compare_masked(x, y, column.payload_mask()),
    };
    if column.is_descending() {
        ordering.reverse()
    } else {
        ordering
    }
}

/// Compare two stored payloads by their logical (un-inverted) bytes.
fn compare_masked(a: &[u8], b: &[u8], mask: u8) -> Ordering {
    a.iter().map(|byte| byte ^ mask).cmp(b.iter().map(|byte| byte ^ mask))
}
