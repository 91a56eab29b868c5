//! Order-preserving composite key packing.
//!
//! # Layout
//!
//! A packed key is the concatenation of one field per supplied column:
//!
//! ```text
//! [marker: 1 byte][payload]
//! ```
//!
//! - `marker` is `0x00` for null (no payload follows) and `0x01` otherwise.
//! - Fixed-width payloads (numeric, temporal, UUID, boolean, byte) use the
//!   sortable big-endian encodings from [`super::sortable`].
//! - `STRING` and `BYTES` payloads are a LEB128 byte length followed by the
//!   raw bytes (or the collation key for collated strings).
//! - For descending columns every payload byte, including the varint length,
//!   is bit-inverted. The marker is never inverted.
//!
//! A key may supply fewer values than the schema has columns; the result is
//! a prefix key and [`unpack`] returns only the supplied columns.

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::codec::sortable;
use crate::codec::varint::{decode_varint, encode_varint, varint_len};
use crate::types::{Column, ColumnType, ColumnValue, CompositeKey, KeySchema};

/// Marker byte for a null column.
pub const NULL_MARKER: u8 = 0x00;

/// Marker byte for a present column.
pub const PRESENT_MARKER: u8 = 0x01;

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Errors produced while packing or unpacking keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// More values were supplied than the schema has columns.
    TooManyValues { given: usize, columns: usize },
    /// A value does not match its column's declared type.
    TypeMismatch {
        column: String,
        expected: ColumnType,
        found: ColumnType,
    },
    /// A collation key was supplied for a column without a collation.
    UnexpectedCollationKey { column: String },
    /// The input ended in the middle of a column.
    Truncated { column: String },
    /// A marker byte other than `0x00`/`0x01` was found.
    InvalidNullMarker { column: String, marker: u8 },
    /// A `STRING` payload was not valid UTF-8.
    InvalidUtf8 { column: String },
    /// A temporal payload is outside the range chrono can represent.
    TemporalOutOfRange { column: String },
    /// Bytes remained after every schema column was read.
    TrailingBytes { count: usize },
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyValues { given, columns } => {
                write!(f, "too many key values: {given} given, schema has {columns} columns")
            }
            Self::TypeMismatch {
                column,
                expected,
                found,
            } => write!(f, "column {column}: expected {expected} value, found {found}"),
            Self::UnexpectedCollationKey { column } => {
                write!(f, "column {column}: collation key given but column has no collation")
            }
            Self::Truncated { column } => write!(f, "column {column}: packed key is truncated"),
            Self::InvalidNullMarker { column, marker } => {
                write!(f, "column {column}: invalid null marker 0x{marker:02x}")
            }
            Self::InvalidUtf8 { column } => write!(f, "column {column}: string is not valid UTF-8"),
            Self::TemporalOutOfRange { column } => {
                write!(f, "column {column}: temporal value out of range")
            }
            Self::TrailingBytes { count } => {
                write!(f, "{count} trailing bytes after the last key column")
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Pack a logical key into its order-preserving byte form.
///
/// `values` may be shorter than the schema (prefix key) but never longer.
pub fn pack(values: &[Option<ColumnValue>], schema: &KeySchema) -> Result<Vec<u8>, CodecError> {
    if values.len() > schema.len() {
        return Err(CodecError::TooManyValues {
            given: values.len(),
            columns: schema.len(),
        });
    }

    let mut out = Vec::with_capacity(values.len() * 9);
    for (value, column) in values.iter().zip(schema.columns()) {
        let Some(value) = value else {
            out.push(NULL_MARKER);
            continue;
        };
        out.push(PRESENT_MARKER);
        let payload_start = out.len();
        pack_payload(value, column, &mut out)?;
        if column.is_descending() {
            for byte in &mut out[payload_start..] {
                *byte = !*byte;
            }
        }
    }
    Ok(out)
}

fn pack_payload(value: &ColumnValue, column: &Column, out: &mut Vec<u8>) -> Result<(), CodecError> {
    match (column.column_type(), value) {
        (ColumnType::Boolean, ColumnValue::Boolean(v)) => out.push(u8::from(*v)),
        (ColumnType::Byte, ColumnValue::Byte(v)) => out.push(*v),
        (ColumnType::Short, ColumnValue::Short(v)) => out.extend_from_slice(&sortable::encode_i16(*v)),
        (ColumnType::Int, ColumnValue::Int(v)) => out.extend_from_slice(&sortable::encode_i32(*v)),
        (ColumnType::Long, ColumnValue::Long(v)) => out.extend_from_slice(&sortable::encode_i64(*v)),
        (ColumnType::Float, ColumnValue::Float(v)) => out.extend_from_slice(&sortable::encode_f32(*v)),
        (ColumnType::Double, ColumnValue::Double(v)) => {
            out.extend_from_slice(&sortable::encode_f64(*v));
        }
        (ColumnType::String, ColumnValue::String(s)) => match column.collation() {
            Some(collation) => write_var_bytes(&collation.collation_key(s), out),
            None => write_var_bytes(s.as_bytes(), out),
        },
        (ColumnType::String, ColumnValue::CollationKey(bytes)) => {
            if column.collation().is_none() {
                return Err(CodecError::UnexpectedCollationKey {
                    column: column.name().to_owned(),
                });
            }
            write_var_bytes(bytes, out);
        }
        (ColumnType::Bytes, ColumnValue::Bytes(bytes)) => write_var_bytes(bytes, out),
        (ColumnType::LocalDate, ColumnValue::LocalDate(date)) => {
            out.extend_from_slice(&sortable::encode_i64(epoch_days(*date)));
        }
        (ColumnType::LocalDateTime, ColumnValue::LocalDateTime(datetime)) => {
            out.extend_from_slice(&sortable::encode_i64(datetime.and_utc().timestamp()));
        }
        (ColumnType::Instant, ColumnValue::Instant(instant)) => {
            out.extend_from_slice(&sortable::encode_i64(instant.timestamp()));
        }
        (ColumnType::Uuid, ColumnValue::Uuid(uuid)) => out.extend_from_slice(uuid.as_bytes()),
        (expected, found) => {
            return Err(CodecError::TypeMismatch {
                column: column.name().to_owned(),
                expected,
                found: found.column_type(),
            });
        }
    }
    Ok(())
}

fn write_var_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    let len = bytes.len() as u64;
    out.reserve(varint_len(len) + bytes.len());
    encode_varint(len, out);
    out.extend_from_slice(bytes);
}

/// Unpack a key produced by [`pack`].
///
/// Stops at the first column boundary where the input is exhausted, so a
/// prefix key unpacks to a prefix of values.
pub fn unpack(bytes: &[u8], schema: &KeySchema) -> Result<CompositeKey, CodecError> {
    let mut values = Vec::with_capacity(schema.len());
    let mut offset = 0;

    for column in schema.columns() {
        if offset >= bytes.len() {
            break;
        }
        let (field, consumed) = read_field(&bytes[offset..], column)?;
        offset += consumed;
        values.push(match field {
            Field::Null => None,
            Field::Present(payload) => Some(decode_payload(payload, column)?),
        });
    }

    if offset < bytes.len() {
        return Err(CodecError::TrailingBytes {
            count: bytes.len() - offset,
        });
    }
    Ok(values)
}

/// One column of a packed key, with its payload still in stored form
/// (inverted for descending columns). For variable-width columns the
/// payload excludes the length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a> {
    Null,
    Present(&'a [u8]),
}

/// Read the field at the start of `bytes`, returning it and the number of
/// bytes it occupies.
pub fn read_field<'a>(bytes: &'a [u8], column: &Column) -> Result<(Field<'a>, usize), CodecError> {
    let truncated = || CodecError::Truncated {
        column: column.name().to_owned(),
    };

    let (&marker, rest) = bytes.split_first().ok_or_else(truncated)?;
    match marker {
        NULL_MARKER => return Ok((Field::Null, 1)),
        PRESENT_MARKER => {}
        other => {
            return Err(CodecError::InvalidNullMarker {
                column: column.name().to_owned(),
                marker: other,
            });
        }
    }

    if let Some(width) = column.column_type().fixed_width() {
        let payload = rest.get(..width).ok_or_else(truncated)?;
        return Ok((Field::Present(payload), 1 + width));
    }

    let (len, len_bytes) = decode_varint(rest, column.payload_mask()).ok_or_else(truncated)?;
    let end = usize::try_from(len)
        .ok()
        .and_then(|len| len.checked_add(len_bytes))
        .ok_or_else(truncated)?;
    let payload = rest.get(len_bytes..end).ok_or_else(truncated)?;
    Ok((Field::Present(payload), 1 + end))
}

fn decode_payload(payload: &[u8], column: &Column) -> Result<ColumnValue, CodecError> {
    let mask = column.payload_mask();
    let raw: Vec<u8> = payload.iter().map(|b| b ^ mask).collect();
    let out_of_range = || CodecError::TemporalOutOfRange {
        column: column.name().to_owned(),
    };

    let value = match column.column_type() {
        ColumnType::Boolean => ColumnValue::Boolean(raw[0] != 0),
        ColumnType::Byte => ColumnValue::Byte(raw[0]),
        ColumnType::Short => ColumnValue::Short(sortable::decode_i16(fixed(&raw))),
        ColumnType::Int => ColumnValue::Int(sortable::decode_i32(fixed(&raw))),
        ColumnType::Long => ColumnValue::Long(sortable::decode_i64(fixed(&raw))),
        ColumnType::Float => ColumnValue::Float(sortable::decode_f32(fixed(&raw))),
        ColumnType::Double => ColumnValue::Double(sortable::decode_f64(fixed(&raw))),
        ColumnType::String => {
            if column.collation().is_some() {
                ColumnValue::CollationKey(raw)
            } else {
                let s = String::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8 {
                    column: column.name().to_owned(),
                })?;
                ColumnValue::String(s)
            }
        }
        ColumnType::Bytes => ColumnValue::Bytes(raw),
        ColumnType::LocalDate => {
            let days = sortable::decode_i64(fixed(&raw));
            ColumnValue::LocalDate(date_from_epoch_days(days).ok_or_else(out_of_range)?)
        }
        ColumnType::LocalDateTime => {
            let seconds = sortable::decode_i64(fixed(&raw));
            let datetime = DateTime::from_timestamp(seconds, 0).ok_or_else(out_of_range)?;
            ColumnValue::LocalDateTime(datetime.naive_utc())
        }
        ColumnType::Instant => {
            let seconds = sortable::decode_i64(fixed(&raw));
            ColumnValue::Instant(DateTime::<Utc>::from_timestamp(seconds, 0).ok_or_else(out_of_range)?)
        }
        ColumnType::Uuid => ColumnValue::Uuid(Uuid::from_bytes(fixed(&raw))),
    };
    Ok(value)
}

/// Copy a fixed-width payload into an array. `read_field` guarantees the
/// length matches the column width.
fn fixed<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&raw[..N]);
    out
}

fn epoch_days(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
}

fn date_from_epoch_days(days: i64) -> Option<NaiveDate> {
    let from_ce = days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?;
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(from_ce).ok()?)
}

/// Compare two logical keys with the ordering the packed form encodes.
///
/// Mirrors [`crate::codec::MultiColumnKeyComparator`] on unpacked values: a
/// missing trailing column sorts before any present one, nulls sort low in
/// ascending columns and high in descending columns, and temporal values
/// compare at whole-second precision.
pub fn compare_values(
    a: &[Option<ColumnValue>],
    b: &[Option<ColumnValue>],
    schema: &KeySchema,
) -> Result<Ordering, CodecError> {
    for (idx, column) in schema.columns().iter().enumerate() {
        let ordering = match (a.get(idx), b.get(idx)) {
            (None, None) => return Ok(Ordering::Equal),
            (None, Some(_)) => return Ok(Ordering::Less),
            (Some(_), None) => return Ok(Ordering::Greater),
            (Some(None), Some(None)) => continue,
            (Some(None), Some(Some(_))) => Ordering::Less,
            (Some(Some(_)), Some(None)) => Ordering::Greater,
            (Some(Some(x)), Some(Some(y))) => compare_column_values(x, y, column)?,
        };
        if ordering != Ordering::Equal {
            return Ok(if column.is_descending() {
                ordering.reverse()
            } else {
                ordering
            });
        }
    }
    Ok(Ordering::Equal)
}

fn compare_column_values(
    a: &ColumnValue,
    b: &ColumnValue,
    column: &Column,
) -> Result<Ordering, CodecError> {
    let ordering = match (a, b) {
        (ColumnValue::Boolean(x), ColumnValue::Boolean(y)) => x.cmp(y),
        (ColumnValue::Byte(x), ColumnValue::Byte(y)) => x.cmp(y),
        (ColumnValue::Short(x), ColumnValue::Short(y)) => x.cmp(y),
        (ColumnValue::Int(x), ColumnValue::Int(y)) => x.cmp(y),
        (ColumnValue::Long(x), ColumnValue::Long(y)) => x.cmp(y),
        (ColumnValue::Float(x), ColumnValue::Float(y)) => x.total_cmp(y),
        (ColumnValue::Double(x), ColumnValue::Double(y)) => x.total_cmp(y),
        (ColumnValue::Bytes(x), ColumnValue::Bytes(y)) => x.cmp(y),
        (ColumnValue::LocalDate(x), ColumnValue::LocalDate(y)) => x.cmp(y),
        (ColumnValue::LocalDateTime(x), ColumnValue::LocalDateTime(y)) => {
            x.and_utc().timestamp().cmp(&y.and_utc().timestamp())
        }
        (ColumnValue::Instant(x), ColumnValue::Instant(y)) => x.timestamp().cmp(&y.timestamp()),
        (ColumnValue::Uuid(x), ColumnValue::Uuid(y)) => x.cmp(y),
        (
            ColumnValue::String(_) | ColumnValue::CollationKey(_),
            ColumnValue::String(_) | ColumnValue::CollationKey(_),
        ) => string_sort_bytes(a, column)?.cmp(&string_sort_bytes(b, column)?),
        (x, y) => {
            let found = if x.column_type() == column.column_type() { y } else { x };
            return Err(CodecError::TypeMismatch {
                column: column.name().to_owned(),
                expected: column.column_type(),
                found: found.column_type(),
            });
        }
    };
    Ok(ordering)
}

fn string_sort_bytes<'a>(value: &'a ColumnValue, column: &Column) -> Result<Cow<'a, [u8]>, CodecError> {
    match (value, column.collation()) {
        (ColumnValue::String(s), Some(collation)) => Ok(Cow::Owned(collation.collation_key(s))),
        (ColumnValue::String(s), None) => Ok(Cow::Borrowed(s.as_bytes())),
        (ColumnValue::CollationKey(bytes), Some(_)) => Ok(Cow::Borrowed(bytes)),
        (ColumnValue::CollationKey(_), None) => Err(CodecError::UnexpectedCollationKey {
            column: column.name().to_owned(),
        }),
        (other, _) => Err(CodecError::TypeMismatch {
            column: column.name().to_owned(),
            expected: ColumnType::String,
            found: other.column_type(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDateTime;

    use super::*;
    use crate::types::{CaseFoldCollation, Collation};

    fn int_long_schema() -> KeySchema {
        KeySchema::new(vec![
            Column::new("count", ColumnType::Int),
            Column::new("largeCount", ColumnType::Long),
        ])
    }

    fn single(column: Column) -> KeySchema {
        KeySchema::new(vec![column])
    }

    fn roundtrip(values: CompositeKey, schema: &KeySchema) {
        let packed = pack(&values, schema).expect("pack");
        let unpacked = unpack(&packed, schema).expect("unpack");
        assert_eq!(unpacked, values, "roundtrip mismatch for schema {schema}");
    }

    #[test]
    fn test_int_long_layout() {
        let packed = pack(&[Some(10i32.into()), Some(5230i64.into())], &int_long_schema())
            .expect("pack");
        let mut expected = vec![PRESENT_MARKER];
        expected.extend_from_slice(&sortable::encode_i32(10));
        expected.push(PRESENT_MARKER);
        expected.extend_from_slice(&sortable::encode_i64(5230));
        assert_eq!(packed, expected);
    }

    #[test]
    fn test_null_marker() {
        let packed = pack(&[None, Some(1i64.into())], &int_long_schema()).expect("pack");
        assert_eq!(packed[0], NULL_MARKER);
        assert_eq!(packed[1], PRESENT_MARKER);
        assert_eq!(packed.len(), 1 + 1 + 8);
        roundtrip(vec![None, Some(1i64.into())], &int_long_schema());
    }

    #[test]
    fn test_descending_inverts_payload_not_marker() {
        let asc = pack(&[Some(7i32.into())], &single(Column::new("a", ColumnType::Int)))
            .expect("pack");
        let desc = pack(
            &[Some(7i32.into())],
            &single(Column::new("a", ColumnType::Int).descending()),
        )
        .expect("pack");
        assert_eq!(asc[0], PRESENT_MARKER);
        assert_eq!(desc[0], PRESENT_MARKER);
        for (a, d) in asc[1..].iter().zip(&desc[1..]) {
            assert_eq!(*a, !*d);
        }
    }

    #[test]
    fn test_roundtrip_every_type() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).expect("date");
        let datetime = NaiveDateTime::parse_from_str("2024-02-29 13:45:07", "%Y-%m-%d %H:%M:%S")
            .expect("datetime");
        let instant = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("instant");
        let uuid = Uuid::from_u128(0x0123_4567_89ab_cdef_0011_2233_4455_6677);

        let cases: Vec<(ColumnType, ColumnValue)> = vec![
            (ColumnType::Int, ColumnValue::Int(-42)),
            (ColumnType::Long, ColumnValue::Long(i64::MIN)),
            (ColumnType::Short, ColumnValue::Short(10)),
            (ColumnType::Byte, ColumnValue::Byte(1)),
            (ColumnType::Boolean, ColumnValue::Boolean(true)),
            (ColumnType::Float, ColumnValue::Float(10.0)),
            (ColumnType::Double, ColumnValue::Double(-10.5)),
            (ColumnType::String, ColumnValue::String("Test Code".into())),
            (ColumnType::String, ColumnValue::String(String::new())),
            (ColumnType::Bytes, ColumnValue::Bytes(vec![0, 1, 2, 255])),
            (ColumnType::LocalDate, ColumnValue::LocalDate(date)),
            (ColumnType::LocalDateTime, ColumnValue::LocalDateTime(datetime)),
            (ColumnType::Instant, ColumnValue::Instant(instant)),
            (ColumnType::Uuid, ColumnValue::Uuid(uuid)),
        ];

        for (column_type, value) in cases {
            for descending in [false, true] {
                let schema = single(Column::new("c", column_type).with_descending(descending));
                roundtrip(vec![Some(value.clone())], &schema);
            }
        }
    }

    #[test]
    fn test_roundtrip_dates_before_epoch() {
        let schema = single(Column::new("d", ColumnType::LocalDate));
        let date = NaiveDate::from_ymd_opt(1900, 6, 15).expect("date");
        roundtrip(vec![Some(date.into())], &schema);
    }

    #[test]
    fn test_long_string_uses_multibyte_length() {
        let schema = single(Column::new("s", ColumnType::String).descending());
        let long = "x".repeat(300);
        let packed = pack(&[Some(long.as_str().into())], &schema).expect("pack");
        // marker + 2-byte varint + payload
        assert_eq!(packed.len(), 1 + 2 + 300);
        roundtrip(vec![Some(long.into())], &schema);
    }

    #[test]
    fn test_collated_string_unpacks_to_collation_key() {
        let schema = single(
            Column::new("name", ColumnType::String).with_collation(Arc::new(CaseFoldCollation)),
        );
        let packed = pack(&[Some("Ava".into())], &schema).expect("pack");
        let unpacked = unpack(&packed, &schema).expect("unpack");
        let expected_key = CaseFoldCollation.collation_key("Ava");
        assert_eq!(unpacked, vec![Some(ColumnValue::CollationKey(expected_key))]);

        // Re-packing the unpacked key reproduces the original bytes.
        assert_eq!(pack(&unpacked, &schema).expect("repack"), packed);
    }

    #[test]
    fn test_collation_key_requires_collation() {
        let schema = single(Column::new("name", ColumnType::String));
        let err = pack(&[Some(ColumnValue::CollationKey(vec![1]))], &schema).expect_err("err");
        assert!(matches!(err, CodecError::UnexpectedCollationKey { .. }));
    }

    #[test]
    fn test_prefix_key_unpacks_prefix() {
        let schema = int_long_schema();
        let packed = pack(&[Some(10i32.into())], &schema).expect("pack");
        assert_eq!(unpack(&packed, &schema).expect("unpack"), vec![Some(10i32.into())]);
        assert_eq!(unpack(&[], &schema).expect("unpack empty"), Vec::new());
    }

    #[test]
    fn test_too_many_values() {
        let schema = single(Column::new("a", ColumnType::Int));
        let err = pack(&[Some(1i32.into()), Some(2i32.into())], &schema).expect_err("err");
        assert_eq!(err, CodecError::TooManyValues { given: 2, columns: 1 });
    }

    #[test]
    fn test_type_mismatch() {
        let err = pack(&[Some(1i64.into())], &int_long_schema()).expect_err("err");
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                column: "count".into(),
                expected: ColumnType::Int,
                found: ColumnType::Long,
            }
        );
    }

    #[test]
    fn test_truncated_and_invalid_input() {
        let schema = int_long_schema();
        let packed = pack(&[Some(10i32.into()), Some(5i64.into())], &schema).expect("pack");

        let err = unpack(&packed[..packed.len() - 1], &schema).expect_err("truncated");
        assert!(matches!(err, CodecError::Truncated { .. }));

        let err = unpack(&[0x02], &schema).expect_err("bad marker");
        assert!(matches!(err, CodecError::InvalidNullMarker { marker: 0x02, .. }));

        let mut trailing = packed;
        trailing.push(0x00);
        let err = unpack(&trailing, &schema).expect_err("trailing");
        assert_eq!(err, CodecError::TrailingBytes { count: 1 });
    }

    #[test]
    fn test_invalid_utf8() {
        let schema = single(Column::new("s", ColumnType::String));
        let err = unpack(&[PRESENT_MARKER, 0x01, 0xFF], &schema).expect_err("utf8");
        assert!(matches!(err, CodecError::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_compare_values_rules() {
        let schema = KeySchema::new(vec![
            Column::new("a", ColumnType::Int),
            Column::new("b", ColumnType::String).descending(),
        ]);
        let k = |a: Option<i32>, b: Option<&str>| -> CompositeKey {
            vec![a.map(ColumnValue::from), b.map(ColumnValue::from)]
        };

        let cmp = |x: &CompositeKey, y: &CompositeKey| compare_values(x, y, &schema).expect("cmp");

        assert_eq!(cmp(&k(Some(1), Some("a")), &k(Some(2), Some("a"))), Ordering::Less);
        // Descending second column.
        assert_eq!(cmp(&k(Some(1), Some("a")), &k(Some(1), Some("b"))), Ordering::Greater);
        // Null is low ascending, high descending.
        assert_eq!(cmp(&k(None, Some("a")), &k(Some(1), Some("a"))), Ordering::Less);
        assert_eq!(cmp(&k(Some(1), None), &k(Some(1), Some("a"))), Ordering::Greater);
        // A prefix sorts before its extensions.
        assert_eq!(cmp(&vec![Some(1i32.into())], &k(Some(1), Some("a"))), Ordering::Less);
        assert_eq!(cmp(&k(Some(1), Some("a")), &k(Some(1), Some("a"))), Ordering::Equal);
    }
}
