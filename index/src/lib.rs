// Life of an insert:
// 1. Composite key comes in as a list of nullable column values
// 2. Key serializer packs it into order-preserving bytes for the schema
// 3. Tree descends by comparing packed keys with the key comparator
// 4. Entry lands in a leaf; overflowing nodes split upward
//
// Deletes mirror this, except underfull nodes borrow from or merge with a
// sibling on the way back up.
//
// System components:
//  - Key codec and comparator (`codec`)
//  - Key/value serializers (`serializer`)
//  - In-memory B+Tree (`btree`)
//  - Slotted page store (`storage`)

pub mod btree;
pub mod codec;
pub mod config;
pub mod serializer;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

pub use btree::{BTree, BTreeError, Entries, RawEntries, TreeStats};
pub use codec::{
    BytewiseComparator, CodecError, KeyComparator, MultiColumnKeyComparator, compare_values, pack,
    unpack,
};
pub use config::{ConfigError, TreeConfig};
pub use serializer::{
    BytesValueSerializer, JsonValueSerializer, KeySerializer, MultiColumnKeySerializer, ValueError,
    ValueSerializer,
};
pub use types::{
    CaseFoldCollation, Collation, Column, ColumnType, ColumnValue, CompositeKey, KeySchema,
};
