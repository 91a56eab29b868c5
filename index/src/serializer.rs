//! Key and value serializers plugged into [`crate::BTree`].
//!
//! The tree only ever stores bytes. A [`KeySerializer`] must produce an
//! encoding whose order is the one the tree's comparator expects; for
//! composite keys that is exactly the key codec. A [`ValueSerializer`] is
//! opaque to the tree.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{self, CodecError};
use crate::types::{CompositeKey, KeySchema};

/// Converts logical keys to and from their order-preserving encoding.
pub trait KeySerializer<K>: Send + Sync {
    fn serialize(&self, key: &K) -> Result<Vec<u8>, CodecError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<K, CodecError>;

    /// Human-readable rendering for diagnostics.
    fn format(&self, key: &K) -> String;
}

/// Converts payloads to and from bytes.
pub trait ValueSerializer<V>: Send + Sync {
    fn serialize(&self, value: &V) -> Result<Vec<u8>, ValueError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<V, ValueError>;
}

/// Error returned by a [`ValueSerializer`].
#[derive(Debug)]
pub enum ValueError {
    /// JSON encoding or decoding failed.
    Json(serde_json::Error),
    /// A custom serializer rejected the payload.
    Invalid(String),
}

impl std::fmt::Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::Invalid(message) => write!(f, "invalid value: {message}"),
        }
    }
}

impl std::error::Error for ValueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ValueError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// [`KeySerializer`] for composite keys over a [`KeySchema`].
#[derive(Debug, Clone)]
pub struct MultiColumnKeySerializer {
    schema: Arc<KeySchema>,
}

impl MultiColumnKeySerializer {
    #[must_use]
    pub const fn new(schema: Arc<KeySchema>) -> Self {
        Self { schema }
    }

    #[must_use]
    pub const fn schema(&self) -> &Arc<KeySchema> {
        &self.schema
    }
}

impl KeySerializer<CompositeKey> for MultiColumnKeySerializer {
    fn serialize(&self, key: &CompositeKey) -> Result<Vec<u8>, CodecError> {
        codec::pack(key, &self.schema)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<CompositeKey, CodecError> {
        codec::unpack(bytes, &self.schema)
    }

    /// Renders each column followed by `|`, with `null` for nulls.
    fn format(&self, key: &CompositeKey) -> String {
        key.iter()
            .map(|value| {
                value
                    .as_ref()
                    .map_or_else(|| "null|".to_string(), |v| format!("{v}|"))
            })
            .collect()
    }
}

/// Stores payloads as JSON documents.
pub struct JsonValueSerializer<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> JsonValueSerializer<V> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<V> Default for JsonValueSerializer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for JsonValueSerializer<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonValueSerializer")
    }
}

impl<V: Serialize + DeserializeOwned> ValueSerializer<V> for JsonValueSerializer<V> {
    fn serialize(&self, value: &V) -> Result<Vec<u8>, ValueError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<V, ValueError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Pass-through serializer for raw byte payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesValueSerializer;

impl ValueSerializer<Vec<u8>> for BytesValueSerializer {
    fn serialize(&self, value: &Vec<u8>) -> Result<Vec<u8>, ValueError> {
        Ok(value.clone())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<u8>, ValueError> {
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::types::{Column, ColumnType, ColumnValue};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct IdData {
        id: i32,
        long_id: i64,
    }

    fn serializer() -> MultiColumnKeySerializer {
        MultiColumnKeySerializer::new(Arc::new(KeySchema::new(vec![
            Column::new("count", ColumnType::Int),
            Column::new("name", ColumnType::String),
        ])))
    }

    #[test]
    fn test_multi_column_roundtrip() {
        let serializer = serializer();
        let key: CompositeKey = vec![Some(ColumnValue::Int(3)), Some("Ava".into())];
        let bytes = serializer.serialize(&key).expect("serialize");
        assert_eq!(serializer.deserialize(&bytes).expect("deserialize"), key);
    }

    #[test]
    fn test_multi_column_format() {
        let serializer = serializer();
        let key: CompositeKey = vec![Some(ColumnValue::Int(3)), None];
        assert_eq!(serializer.format(&key), "3|null|");
        assert_eq!(serializer.format(&Vec::new()), "");
    }

    #[test]
    fn test_json_value_roundtrip() {
        let serializer = JsonValueSerializer::<IdData>::new();
        let value = IdData { id: 1, long_id: 10 };
        let bytes = serializer.serialize(&value).expect("serialize");
        assert_eq!(bytes, br#"{"id":1,"long_id":10}"#.to_vec());
        assert_eq!(serializer.deserialize(&bytes).expect("deserialize"), value);
    }

    #[test]
    fn test_json_value_error() {
        let serializer = JsonValueSerializer::<IdData>::new();
        let err = serializer.deserialize(b"not json").expect_err("invalid json");
        assert!(matches!(err, ValueError::Json(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_bytes_value_passthrough() {
        let bytes = BytesValueSerializer.serialize(&vec![1, 2, 3]).expect("serialize");
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(BytesValueSerializer.deserialize(&bytes).expect("deserialize"), bytes);
    }
}
