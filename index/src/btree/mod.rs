//! In-memory B+Tree index.
//!
//! # Structure
//!
//! - Internal nodes: separator keys and child ids
//! - Leaf nodes: encoded keys with opaque payloads, doubly linked for ordered
//!   scans
//!
//! Nodes live in an arena and refer to each other by id. A child is owned by
//! exactly one parent slot; leaf sibling links are navigation only.
//!
//! # Usage
//!
//! ```
//! use index::{BTree, BytesValueSerializer, Column, ColumnType, ColumnValue, KeySchema, TreeConfig};
//!
//! let schema = KeySchema::new(vec![Column::new("name", ColumnType::String).descending()]);
//! let mut tree = BTree::with_schema("people", schema, TreeConfig::default(), BytesValueSerializer)?;
//! for name in ["Ava", "Grace", "Elijah"] {
//!     tree.insert(&vec![Some(ColumnValue::from(name))], &name.as_bytes().to_vec())?;
//! }
//!
//! let names: Vec<Vec<u8>> = tree.traverse()?.into_iter().map(|(_, v)| v).collect();
//! assert_eq!(names, vec![b"Grace".to_vec(), b"Elijah".to_vec(), b"Ava".to_vec()]);
//! # Ok::<(), index::BTreeError>(())
//! ```

mod arena;
mod node;
mod tree;

pub use tree::{BTree, BTreeError, Entries, RawEntries, TreeStats};
