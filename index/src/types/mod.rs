//! Key schema and column value types shared by the codec and the tree.

mod column;
mod column_value;

pub use column::{CaseFoldCollation, Collation, Column, ColumnType, KeySchema};
pub use column_value::{ColumnValue, CompositeKey};
