//! Column and key schema definitions.
//!
//! A [`KeySchema`] is the ordered list of columns an index is built over. It
//! drives both the key codec (how each column is packed) and the key
//! comparator (how two packed keys are ordered).
//!
//! # Invariants
//!
//! - A schema is immutable once built; the tree shares it behind an `Arc`.
//! - Column order in the schema is the significance order of the key: the
//!   first column is compared first.

use std::fmt;
use std::sync::Arc;

/// Logical type of a key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int,
    Long,
    Short,
    Byte,
    Boolean,
    Float,
    Double,
    String,
    Bytes,
    LocalDate,
    LocalDateTime,
    Instant,
    Uuid,
}

impl ColumnType {
    /// Width in bytes of the packed payload for fixed-width types.
    ///
    /// Returns `None` for variable-width types (`String`, `Bytes`), whose
    /// payload is prefixed by a varint length instead.
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Boolean | Self::Byte => Some(1),
            Self::Short => Some(2),
            Self::Int | Self::Float => Some(4),
            Self::Long | Self::Double | Self::LocalDate | Self::LocalDateTime | Self::Instant => {
                Some(8)
            }
            Self::Uuid => Some(16),
            Self::String | Self::Bytes => None,
        }
    }

    /// Upper-case name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::Long => "LONG",
            Self::Short => "SHORT",
            Self::Byte => "BYTE",
            Self::Boolean => "BOOLEAN",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::String => "STRING",
            Self::Bytes => "BYTES",
            Self::LocalDate => "LOCAL_DATE",
            Self::LocalDateTime => "LOCAL_DATE_TIME",
            Self::Instant => "INSTANT",
            Self::Uuid => "UUID",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A locale-aware transform from a string to a sortable byte string.
///
/// The codec stores the collation key in place of the UTF-8 bytes, so two
/// strings order by the unsigned comparison of their collation keys. The
/// original string cannot be recovered from the key.
pub trait Collation: fmt::Debug + Send + Sync {
    /// Short identifier used in diagnostics.
    fn name(&self) -> &'static str;

    /// Produce the collation key for `value`.
    fn collation_key(&self, value: &str) -> Vec<u8>;
}

/// Case-insensitive collation with a case-sensitive tie-break.
///
/// The key is the lower-cased string, a `0x00` separator, then the original
/// UTF-8 bytes. Strings that differ only in case therefore sort next to each
/// other but remain distinct keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseFoldCollation;

impl Collation for CaseFoldCollation {
    fn name(&self) -> &'static str {
        "case-fold"
    }

    fn collation_key(&self, value: &str) -> Vec<u8> {
        let folded = value.to_lowercase();
        let mut key = Vec::with_capacity(folded.len() + 1 + value.len());
        key.extend_from_slice(folded.as_bytes());
        key.push(0x00);
        key.extend_from_slice(value.as_bytes());
        key
    }
}

/// A single column of a key schema.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    kind: ColumnType,
    descending: bool,
    collation: Option<Arc<dyn Collation>>,
}

impl Column {
    /// Create an ascending column without a collation.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind: column_type,
            descending: false,
            collation: None,
        }
    }

    /// Mark the column as descending.
    #[must_use]
    pub const fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Set the sort direction explicitly.
    #[must_use]
    pub const fn with_descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Attach a collation. Only meaningful for `STRING` columns.
    #[must_use]
    pub fn with_collation(mut self, collation: Arc<dyn Collation>) -> Self {
        self.collation = Some(collation);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.kind
    }

    #[must_use]
    pub const fn is_descending(&self) -> bool {
        self.descending
    }

    #[must_use]
    pub fn collation(&self) -> Option<&dyn Collation> {
        self.collation.as_deref()
    }

    /// Byte mask applied to every payload byte: `0xFF` for descending
    /// columns, `0x00` otherwise.
    #[must_use]
    pub(crate) const fn payload_mask(&self) -> u8 {
        if self.descending { 0xFF } else { 0x00 }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.kind)?;
        if self.descending {
            f.write_str(" DESC")?;
        }
        if let Some(collation) = &self.collation {
            write!(f, " COLLATE {}", collation.name())?;
        }
        Ok(())
    }
}

/// Ordered list of columns describing a composite key.
#[derive(Debug, Clone, Default)]
pub struct KeySchema {
    columns: Vec<Column>,
}

impl KeySchema {
    #[must_use]
    pub const fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len() is not const-stable
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl fmt::Display for KeySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{column}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_widths() {
        assert_eq!(ColumnType::Boolean.fixed_width(), Some(1));
        assert_eq!(ColumnType::Short.fixed_width(), Some(2));
        assert_eq!(ColumnType::Float.fixed_width(), Some(4));
        assert_eq!(ColumnType::LocalDate.fixed_width(), Some(8));
        assert_eq!(ColumnType::Uuid.fixed_width(), Some(16));
        assert_eq!(ColumnType::String.fixed_width(), None);
        assert_eq!(ColumnType::Bytes.fixed_width(), None);
    }

    #[test]
    fn test_schema_display() {
        let schema = KeySchema::new(vec![
            Column::new("count", ColumnType::Int),
            Column::new("name", ColumnType::String)
                .descending()
                .with_collation(Arc::new(CaseFoldCollation)),
        ]);
        assert_eq!(
            schema.to_string(),
            "(count INT, name STRING DESC COLLATE case-fold)"
        );
    }

    #[test]
    fn test_case_fold_collation_orders_case_insensitively() {
        let collation = CaseFoldCollation;
        let apple = collation.collation_key("apple");
        let upper_banana = collation.collation_key("Banana");
        let upper_apple = collation.collation_key("Apple");

        // Raw UTF-8 would put "Banana" before "apple".
        assert!(apple < upper_banana);
        // Same letters, different case: adjacent but distinct.
        assert_ne!(apple, upper_apple);
        assert!(upper_apple < upper_banana);
    }

    #[test]
    fn test_payload_mask() {
        assert_eq!(Column::new("a", ColumnType::Int).payload_mask(), 0x00);
        assert_eq!(
            Column::new("a", ColumnType::Int).descending().payload_mask(),
            0xFF
        );
    }
}
