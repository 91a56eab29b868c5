//! Typed column values.
//!
//! A logical key is a [`CompositeKey`]: one optional [`ColumnValue`] per
//! schema column, where `None` is SQL-style null. Trailing columns may be
//! omitted to form a prefix key for range positioning.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::types::column::ColumnType;

/// A logical composite key: one nullable value per leading schema column.
pub type CompositeKey = Vec<Option<ColumnValue>>;

/// A single non-null key column value.
///
/// `CollationKey` is what a collated `STRING` column unpacks to: the
/// collation transform is one-way, so the sortable key bytes are returned
/// instead of the original string. Packing a `CollationKey` into a collated
/// column writes the bytes unchanged, so unpacked keys can be fed back into
/// the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Int(i32),
    Long(i64),
    Short(i16),
    Byte(u8),
    Boolean(bool),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    LocalDate(NaiveDate),
    LocalDateTime(NaiveDateTime),
    Instant(DateTime<Utc>),
    Uuid(Uuid),
    CollationKey(Vec<u8>),
}

impl ColumnValue {
    /// The column type this value is packed as.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        match self {
            Self::Int(_) => ColumnType::Int,
            Self::Long(_) => ColumnType::Long,
            Self::Short(_) => ColumnType::Short,
            Self::Byte(_) => ColumnType::Byte,
            Self::Boolean(_) => ColumnType::Boolean,
            Self::Float(_) => ColumnType::Float,
            Self::Double(_) => ColumnType::Double,
            Self::String(_) | Self::CollationKey(_) => ColumnType::String,
            Self::Bytes(_) => ColumnType::Bytes,
            Self::LocalDate(_) => ColumnType::LocalDate,
            Self::LocalDateTime(_) => ColumnType::LocalDateTime,
            Self::Instant(_) => ColumnType::Instant,
            Self::Uuid(_) => ColumnType::Uuid,
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Bytes(v) => write!(f, "{v:02x?}"),
            Self::LocalDate(v) => write!(f, "{v}"),
            Self::LocalDateTime(v) => write!(f, "{v}"),
            Self::Instant(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::CollationKey(bytes) => {
                f.write_str("[CollationKey(")?;
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{b}")?;
                }
                f.write_str(")]")
            }
        }
    }
}

macro_rules! impl_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for ColumnValue {
                fn from(value: $source) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    i32 => Int,
    i64 => Long,
    i16 => Short,
    u8 => Byte,
    bool => Boolean,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec<u8> => Bytes,
    NaiveDate => LocalDate,
    NaiveDateTime => LocalDateTime,
    DateTime<Utc> => Instant,
    Uuid => Uuid,
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}
