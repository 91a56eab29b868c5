//! B+Tree node types and the split, redistribution and merge primitives.
//!
//! - Internal nodes store separator keys and child ids. Child `i` holds keys
//!   in `[keys[i-1], keys[i])`; a key equal to a separator routes right.
//! - Leaf nodes store encoded keys paired with opaque payloads and are
//!   doubly linked for ordered scans.
//!
//! Primitives here only touch the nodes they are given. Updating the parent
//! separator and relinking neighbours is the caller's job, since only the
//! tree knows node ids.

use std::cmp::Ordering;

use crate::btree::arena::NodeId;
use crate::codec::KeyComparator;

/// An encoded key.
pub type Key = Vec<u8>;

/// Node occupancy bounds derived from `max_keys`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    max_keys: usize,
}

impl Order {
    #[must_use]
    pub const fn new(max_keys: usize) -> Self {
        Self { max_keys }
    }

    #[must_use]
    pub const fn max_keys(self) -> usize {
        self.max_keys
    }

    /// Fewest keys a non-root node may hold.
    ///
    /// Leaves use `ceil(max_keys / 2)`. Internal nodes use
    /// `floor(max_keys / 2)`: splitting an overflowing internal node moves
    /// one key up, so for odd orders the right half can only reach the
    /// floor. The two agree for even orders.
    #[must_use]
    pub const fn min_keys(self, leaf: bool) -> usize {
        if leaf {
            self.max_keys.div_ceil(2)
        } else {
            self.max_keys / 2
        }
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Leaf(LeafNode),
    Internal(InternalNode),
}

impl Node {
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    #[must_use]
    pub fn keys(&self) -> &[Key] {
        match self {
            Self::Leaf(leaf) => &leaf.keys,
            Self::Internal(node) => &node.keys,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    #[must_use]
    pub fn is_overflow(&self, order: Order) -> bool {
        self.len() > order.max_keys()
    }

    #[must_use]
    pub fn is_underflow(&self, order: Order) -> bool {
        self.len() < order.min_keys(self.is_leaf())
    }

    /// Whether the node can lend a key to a sibling and stay within bounds.
    #[must_use]
    pub fn has_surplus_key(&self, order: Order) -> bool {
        self.len() > order.min_keys(self.is_leaf())
    }
}

/// Index of the key moved or copied up when a node with `len` keys splits.
/// Also the split boundary.
#[must_use]
pub const fn promotion_key_index(len: usize) -> usize {
    len / 2
}

/// Lower-bound search: the first index whose key is not less than `key`,
/// and whether the key there is equal.
fn search_keys(keys: &[Key], key: &[u8], comparator: &dyn KeyComparator) -> (usize, bool) {
    let index = keys.partition_point(|k| comparator.compare(k, key) == Ordering::Less);
    let exact = keys
        .get(index)
        .is_some_and(|k| comparator.compare(k, key) == Ordering::Equal);
    (index, exact)
}

/// A leaf node. `keys[i]` pairs with `values[i]`.
#[derive(Debug, Clone, Default)]
pub struct LeafNode {
    pub(crate) keys: Vec<Key>,
    pub(crate) values: Vec<Vec<u8>>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl LeafNode {
    #[must_use]
    pub fn with_entry(key: Key, value: Vec<u8>) -> Self {
        Self {
            keys: vec![key],
            values: vec![value],
            prev: None,
            next: None,
        }
    }

    #[must_use]
    pub fn search(&self, key: &[u8], comparator: &dyn KeyComparator) -> (usize, bool) {
        search_keys(&self.keys, key, comparator)
    }

    pub fn insert_at(&mut self, index: usize, key: Key, value: Vec<u8>) {
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    pub fn remove_at(&mut self, index: usize) -> Option<(Key, Vec<u8>)> {
        if index >= self.keys.len() {
            return None;
        }
        Some((self.keys.remove(index), self.values.remove(index)))
    }

    /// Move `[promotion_key_index, end)` into a new right leaf and return the
    /// right leaf's first key as the separator for the parent.
    ///
    /// The new leaf's `next` is this leaf's old `next`; the caller links the
    /// rest of the chain once the new leaf has an id.
    pub fn split_off(&mut self) -> Option<(Key, Self)> {
        let mid = promotion_key_index(self.keys.len());
        let keys = self.keys.split_off(mid);
        let values = self.values.split_off(mid);
        let separator = keys.first()?.clone();
        Some((
            separator,
            Self {
                keys,
                values,
                prev: None,
                next: self.next,
            },
        ))
    }

    /// Take the right sibling's first entry. Returns the parent's new
    /// separator, which is the sibling's new first key.
    pub fn borrow_from_right(&mut self, right: &mut Self) -> Option<Key> {
        if right.keys.len() < 2 {
            return None;
        }
        self.keys.push(right.keys.remove(0));
        self.values.push(right.values.remove(0));
        right.keys.first().cloned()
    }

    /// Take the left sibling's last entry. Returns the parent's new
    /// separator, which is the borrowed key.
    pub fn borrow_from_left(&mut self, left: &mut Self) -> Option<Key> {
        let key = left.keys.pop()?;
        let value = left.values.pop()?;
        self.keys.insert(0, key.clone());
        self.values.insert(0, value);
        Some(key)
    }

    /// Append every entry of `right` and take over its `next` link.
    pub fn absorb(&mut self, right: Self) {
        self.keys.extend(right.keys);
        self.values.extend(right.values);
        self.next = right.next;
    }
}

/// An internal node. `children.len() == keys.len() + 1`.
#[derive(Debug, Clone)]
pub struct InternalNode {
    pub(crate) keys: Vec<Key>,
    pub(crate) children: Vec<NodeId>,
}

impl InternalNode {
    #[must_use]
    pub const fn new(keys: Vec<Key>, children: Vec<NodeId>) -> Self {
        Self { keys, children }
    }

    /// Child to descend into for `key`. Equal keys route right.
    #[must_use]
    pub fn child_index(&self, key: &[u8], comparator: &dyn KeyComparator) -> usize {
        match search_keys(&self.keys, key, comparator) {
            (index, true) => index + 1,
            (index, false) => index,
        }
    }

    /// Child holding the first key not less than `key`. Used to position a
    /// scan when equal keys may also sit left of a separator.
    #[must_use]
    pub fn lower_child_index(&self, key: &[u8], comparator: &dyn KeyComparator) -> usize {
        search_keys(&self.keys, key, comparator).0
    }

    /// Range of children that may contain `key` when equal keys are allowed
    /// on both sides of a separator.
    #[must_use]
    pub fn candidate_children(
        &self,
        key: &[u8],
        comparator: &dyn KeyComparator,
    ) -> std::ops::RangeInclusive<usize> {
        let lower = self.lower_child_index(key, comparator);
        let upper = self
            .keys
            .partition_point(|k| comparator.compare(k, key) != Ordering::Greater);
        lower..=upper
    }

    /// Insert a separator and its right child after child `child_index`.
    pub fn insert_child(&mut self, child_index: usize, key: Key, right_child: NodeId) {
        self.keys.insert(child_index, key);
        self.children.insert(child_index + 1, right_child);
    }

    /// Remove separator `key_index` together with the child to its right.
    pub fn remove_separator(&mut self, key_index: usize) -> Option<(Key, NodeId)> {
        if key_index >= self.keys.len() || key_index + 1 >= self.children.len() {
            return None;
        }
        Some((self.keys.remove(key_index), self.children.remove(key_index + 1)))
    }

    /// Move keys after the promotion index and their children into a new
    /// right node. The promotion key itself is removed and returned for the
    /// parent.
    pub fn split_off(&mut self) -> Option<(Key, Self)> {
        let mid = promotion_key_index(self.keys.len());
        let keys = self.keys.split_off(mid + 1);
        let children = self.children.split_off(mid + 1);
        let promoted = self.keys.pop()?;
        Some((promoted, Self { keys, children }))
    }

    /// Rotate through the parent from the right sibling: the parent
    /// separator becomes this node's last key, the sibling's first child
    /// becomes this node's last child, and the sibling's first key is
    /// returned as the parent's new separator.
    pub fn borrow_from_right(&mut self, separator: Key, right: &mut Self) -> Option<Key> {
        if right.keys.len() < 2 || right.children.is_empty() {
            return None;
        }
        self.keys.push(separator);
        self.children.push(right.children.remove(0));
        Some(right.keys.remove(0))
    }

    /// Mirror of [`Self::borrow_from_right`] using the left sibling's last
    /// key and child.
    pub fn borrow_from_left(&mut self, separator: Key, left: &mut Self) -> Option<Key> {
        let child = left.children.pop()?;
        let Some(key) = left.keys.pop() else {
            left.children.push(child);
            return None;
        };
        self.keys.insert(0, separator);
        self.children.insert(0, child);
        Some(key)
    }

    /// Pull the separator down and append every key and child of `right`.
    pub fn absorb(&mut self, separator: Key, right: Self) {
        self.keys.push(separator);
        self.keys.extend(right.keys);
        self.children.extend(right.children);
    }
}
