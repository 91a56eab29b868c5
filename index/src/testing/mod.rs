//! Shared fixtures for unit tests.

use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::btree::{BTree, BTreeError};
use crate::config::TreeConfig;
use crate::serializer::JsonValueSerializer;
use crate::types::{Column, ColumnType, ColumnValue, CompositeKey, KeySchema};

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process. Filter with
/// `RUST_LOG`, e.g. `RUST_LOG=index=debug`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "index=warn".into()))
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}

/// Row payload used by the tree tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdData {
    pub id: i32,
    pub long_id: i64,
}

impl IdData {
    pub const fn new(id: i32, long_id: i64) -> Self {
        Self { id, long_id }
    }

    pub fn key(self) -> CompositeKey {
        id_key(self.id, self.long_id)
    }
}

/// `(count INT, largeCount LONG)`, both ascending.
pub fn int_long_schema() -> KeySchema {
    KeySchema::new(vec![
        Column::new("count", ColumnType::Int),
        Column::new("largeCount", ColumnType::Long),
    ])
}

pub fn id_key(id: i32, long_id: i64) -> CompositeKey {
    vec![Some(ColumnValue::Int(id)), Some(ColumnValue::Long(long_id))]
}

/// Tree over [`int_long_schema`] storing [`IdData`] rows as JSON.
pub fn id_tree(max_keys: usize, allow_duplicate: bool) -> Result<BTree<CompositeKey, IdData>, BTreeError> {
    init_tracing();
    BTree::with_schema(
        "test",
        int_long_schema(),
        TreeConfig::default()
            .with_max_keys(max_keys)
            .with_allow_duplicate(allow_duplicate),
        JsonValueSerializer::new(),
    )
}

/// Values of a full traversal, in order.
pub fn traversed_values<V>(tree: &BTree<CompositeKey, V>) -> Vec<V> {
    tree.traverse()
        .expect("traverse")
        .into_iter()
        .map(|(_, value)| value)
        .collect()
}
