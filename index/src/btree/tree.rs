//! In-memory B+Tree over encoded composite keys.
//!
//! Keys are encoded by the tree's [`KeySerializer`] and ordered by its
//! [`KeyComparator`]; values are stored as opaque bytes produced by the
//! [`ValueSerializer`].
//!
//! Every mutation descends from the root recording a [`DescentPath`] of
//! `(node, child index)` frames. The path is a per-call value: after the
//! leaf is modified it is consumed bottom-up to cascade splits (insert) or
//! resolve underflow (delete).

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::btree::arena::{NodeArena, NodeId};
use crate::btree::node::{InternalNode, Key, LeafNode, Node, Order};
use crate::codec::{CodecError, KeyComparator, MultiColumnKeyComparator};
use crate::config::{MIN_MAX_KEYS, TreeConfig};
use crate::serializer::{KeySerializer, MultiColumnKeySerializer, ValueError, ValueSerializer};
use crate::types::{CompositeKey, KeySchema};

/// One step of a descent: the internal node visited and the child taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PathFrame {
    node: NodeId,
    child_index: usize,
}

/// Route from the root to a leaf.
#[derive(Debug, Clone)]
struct DescentPath {
    frames: Vec<PathFrame>,
    leaf: NodeId,
}

/// Which sibling lends a key during redistribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Shape summary returned by [`BTree::validate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub height: usize,
    pub leaf_nodes: usize,
    pub internal_nodes: usize,
    pub entries: usize,
}

/// A B+Tree index.
pub struct BTree<K, V> {
    name: String,
    arena: NodeArena,
    root: Option<NodeId>,
    order: Order,
    allow_duplicate: bool,
    len: usize,
    key_serializer: Box<dyn KeySerializer<K>>,
    value_serializer: Box<dyn ValueSerializer<V>>,
    comparator: Arc<dyn KeyComparator>,
}

impl<V> BTree<CompositeKey, V> {
    /// Create a tree over composite keys described by `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`BTreeError::InvalidOrder`] if `config.max_keys` is too small.
    pub fn with_schema(
        name: impl Into<String>,
        schema: KeySchema,
        config: TreeConfig,
        value_serializer: impl ValueSerializer<V> + 'static,
    ) -> Result<Self, BTreeError> {
        let schema = Arc::new(schema);
        Self::new(
            name,
            config,
            MultiColumnKeySerializer::new(Arc::clone(&schema)),
            value_serializer,
            Arc::new(MultiColumnKeyComparator::new(schema)),
        )
    }
}

impl<K, V> BTree<K, V> {
    /// Create an empty tree. The root is created by the first insert.
    ///
    /// # Errors
    ///
    /// Returns [`BTreeError::InvalidOrder`] if `config.max_keys` is too small.
    pub fn new(
        name: impl Into<String>,
        config: TreeConfig,
        key_serializer: impl KeySerializer<K> + 'static,
        value_serializer: impl ValueSerializer<V> + 'static,
        comparator: Arc<dyn KeyComparator>,
    ) -> Result<Self, BTreeError> {
        if config.max_keys < MIN_MAX_KEYS {
            return Err(BTreeError::InvalidOrder {
                max_keys: config.max_keys,
            });
        }
        let name = name.into();
        debug!(tree = %name, max_keys = config.max_keys, allow_duplicate = config.allow_duplicate, "created tree");
        Ok(Self {
            name,
            arena: NodeArena::new(),
            root: None,
            order: Order::new(config.max_keys),
            allow_duplicate: config.allow_duplicate,
            len: 0,
            key_serializer: Box::new(key_serializer),
            value_serializer: Box::new(value_serializer),
            comparator,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn max_keys(&self) -> usize {
        self.order.max_keys()
    }

    #[must_use]
    pub const fn allow_duplicate(&self) -> bool {
        self.allow_duplicate
    }

    /// Number of stored entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels from the root to the leaves, 0 before the first
    /// insert.
    pub fn height(&self) -> Result<usize, BTreeError> {
        let mut height = 0;
        let mut current = self.root;
        while let Some(id) = current {
            height += 1;
            current = match self.arena.get(id)? {
                Node::Leaf(_) => None,
                Node::Internal(node) => Some(first_child(node, id)?),
            };
        }
        Ok(height)
    }

    /// Drop every entry and node.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.len = 0;
    }

    /// Insert an entry.
    ///
    /// Without duplicates an existing equal key has its payload replaced and
    /// the previous value is returned. If that value cannot be decoded the
    /// tree is left unchanged. With duplicates the entry is added
    /// next to the existing ones and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or value cannot be serialized, or if the
    /// tree structure is inconsistent.
    pub fn insert(&mut self, key: &K, value: &V) -> Result<Option<V>, BTreeError> {
        let encoded = self.key_serializer.serialize(key)?;
        let payload = self.value_serializer.serialize(value)?;
        trace!(tree = %self.name, key = %self.key_serializer.format(key), "insert");

        let Some(path) = self.descend(&encoded)? else {
            let root = self.arena.alloc(Node::Leaf(LeafNode::with_entry(encoded, payload)));
            self.root = Some(root);
            self.len = 1;
            debug!(tree = %self.name, root = %root, "created root leaf");
            return Ok(None);
        };

        let leaf = self.arena.leaf_mut(path.leaf)?;
        let (index, exact) = leaf.search(&encoded, self.comparator.as_ref());
        if exact && !self.allow_duplicate {
            let old = self.value_serializer.deserialize(&leaf.values[index])?;
            leaf.values[index] = payload;
            return Ok(Some(old));
        }
        leaf.insert_at(index, encoded, payload);
        self.len += 1;

        self.split_upwards(path)?;
        Ok(None)
    }

    /// Remove one entry with an equal key and return its value. Deleting an
    /// absent key is a no-op, and so is a failure to decode the stored value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be serialized, the stored value
    /// cannot be deserialized, or the tree structure is inconsistent.
    pub fn delete(&mut self, key: &K) -> Result<Option<V>, BTreeError> {
        let encoded = self.key_serializer.serialize(key)?;
        trace!(tree = %self.name, key = %self.key_serializer.format(key), "delete");

        let Some((path, index)) = self.locate(&encoded)? else {
            return Ok(None);
        };
        let leaf_id = path.leaf;
        let missing = || BTreeError::Inconsistent(format!("leaf {leaf_id} has no entry {index}"));
        let leaf = self.arena.leaf_mut(leaf_id)?;
        let payload = leaf.values.get(index).ok_or_else(missing)?;
        let old = self.value_serializer.deserialize(payload)?;
        leaf.remove_at(index).ok_or_else(missing)?;
        self.len -= 1;

        self.rebalance_after_delete(path)?;
        Ok(Some(old))
    }

    /// Look up the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be serialized or the stored value
    /// cannot be deserialized.
    pub fn search(&self, key: &K) -> Result<Option<V>, BTreeError> {
        let encoded = self.key_serializer.serialize(key)?;
        trace!(tree = %self.name, key = %self.key_serializer.format(key), "search");

        let Some((path, index)) = self.locate(&encoded)? else {
            return Ok(None);
        };
        let leaf = self.arena.leaf(path.leaf)?;
        let payload = leaf.values.get(index).ok_or_else(|| {
            BTreeError::Inconsistent(format!("leaf {} has no entry {index}", path.leaf))
        })?;
        Ok(Some(self.value_serializer.deserialize(payload)?))
    }

    /// Every entry in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns [`BTreeError::EmptyTree`] if nothing was ever inserted, or a
    /// decoding error.
    pub fn traverse(&self) -> Result<Vec<(K, V)>, BTreeError> {
        if self.root.is_none() {
            return Err(BTreeError::EmptyTree);
        }
        self.iter()?.collect()
    }

    /// Lazily iterate every entry in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the leftmost leaf cannot be reached.
    #[allow(clippy::iter_not_returning_iterator)] // descent to the first leaf can fail
    pub fn iter(&self) -> Result<Entries<'_, K, V>, BTreeError> {
        let leaf = match self.root {
            Some(root) => Some(self.leftmost_leaf(root)?),
            None => None,
        };
        Ok(self.entries(RawEntries::new(&self.arena, leaf, 0)))
    }

    /// Lazily iterate entries whose key is not less than `start`.
    ///
    /// `start` may be a prefix key, in which case iteration begins at the
    /// first key extending it.
    ///
    /// # Errors
    ///
    /// Returns an error if `start` cannot be serialized.
    pub fn range_from(&self, start: &K) -> Result<Entries<'_, K, V>, BTreeError> {
        let encoded = self.key_serializer.serialize(start)?;
        trace!(tree = %self.name, start = %self.key_serializer.format(start), "range scan");

        let Some(mut current) = self.root else {
            return Ok(self.entries(RawEntries::new(&self.arena, None, 0)));
        };
        loop {
            match self.arena.get(current)? {
                Node::Internal(node) => {
                    let index = node.lower_child_index(&encoded, self.comparator.as_ref());
                    current = child_at(node, current, index)?;
                }
                Node::Leaf(leaf) => {
                    let (index, _) = leaf.search(&encoded, self.comparator.as_ref());
                    return Ok(self.entries(RawEntries::new(&self.arena, Some(current), index)));
                }
            }
        }
    }

    /// Iterate raw `(encoded key, payload)` pairs in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the leftmost leaf cannot be reached.
    pub fn raw_entries(&self) -> Result<RawEntries<'_>, BTreeError> {
        let leaf = match self.root {
            Some(root) => Some(self.leftmost_leaf(root)?),
            None => None,
        };
        Ok(RawEntries::new(&self.arena, leaf, 0))
    }

    fn entries<'a>(&'a self, raw: RawEntries<'a>) -> Entries<'a, K, V> {
        Entries {
            raw,
            key_serializer: self.key_serializer.as_ref(),
            value_serializer: self.value_serializer.as_ref(),
        }
    }

    fn leftmost_leaf(&self, root: NodeId) -> Result<NodeId, BTreeError> {
        let mut current = root;
        loop {
            match self.arena.get(current)? {
                Node::Leaf(_) => return Ok(current),
                Node::Internal(node) => current = first_child(node, current)?,
            }
        }
    }

    /// Follow right-routing from the root to the leaf that would hold
    /// `key`. Returns `None` when the tree has no root.
    fn descend(&self, key: &[u8]) -> Result<Option<DescentPath>, BTreeError> {
        let Some(mut current) = self.root else {
            return Ok(None);
        };
        let mut frames = Vec::new();
        loop {
            match self.arena.get(current)? {
                Node::Leaf(_) => return Ok(Some(DescentPath { frames, leaf: current })),
                Node::Internal(node) => {
                    let child_index = node.child_index(key, self.comparator.as_ref());
                    frames.push(PathFrame {
                        node: current,
                        child_index,
                    });
                    current = child_at(node, current, child_index)?;
                }
            }
        }
    }

    /// Find an entry equal to `key`, returning the path to its leaf and its
    /// index there.
    fn locate(&self, key: &[u8]) -> Result<Option<(DescentPath, usize)>, BTreeError> {
        let Some(path) = self.descend(key)? else {
            return Ok(None);
        };
        let (index, exact) = self.arena.leaf(path.leaf)?.search(key, self.comparator.as_ref());
        if exact {
            return Ok(Some((path, index)));
        }
        if !self.allow_duplicate {
            return Ok(None);
        }

        // Equal keys can sit on both sides of an equal separator, so the
        // right-routed leaf is not the only candidate.
        let Some(root) = self.root else {
            return Ok(None);
        };
        let mut frames = Vec::new();
        self.locate_in_subtree(root, key, &mut frames)
    }

    fn locate_in_subtree(
        &self,
        id: NodeId,
        key: &[u8],
        frames: &mut Vec<PathFrame>,
    ) -> Result<Option<(DescentPath, usize)>, BTreeError> {
        match self.arena.get(id)? {
            Node::Leaf(leaf) => {
                let (index, exact) = leaf.search(key, self.comparator.as_ref());
                Ok(exact.then(|| {
                    (
                        DescentPath {
                            frames: frames.clone(),
                            leaf: id,
                        },
                        index,
                    )
                }))
            }
            Node::Internal(node) => {
                for child_index in node.candidate_children(key, self.comparator.as_ref()) {
                    let child = child_at(node, id, child_index)?;
                    frames.push(PathFrame {
                        node: id,
                        child_index,
                    });
                    if let Some(found) = self.locate_in_subtree(child, key, frames)? {
                        return Ok(Some(found));
                    }
                    frames.pop();
                }
                Ok(None)
            }
        }
    }

    /// Split overflowing nodes from the leaf upwards, growing a new root if
    /// the old root splits.
    fn split_upwards(&mut self, path: DescentPath) -> Result<(), BTreeError> {
        let DescentPath { mut frames, leaf } = path;
        let mut current = leaf;

        while self.arena.get(current)?.is_overflow(self.order) {
            let (promoted, sibling) = self.split_node(current)?;
            if let Some(frame) = frames.pop() {
                self.arena
                    .internal_mut(frame.node)?
                    .insert_child(frame.child_index, promoted, sibling);
                current = frame.node;
            } else {
                let root = self.arena.alloc(Node::Internal(InternalNode::new(
                    vec![promoted],
                    vec![current, sibling],
                )));
                self.root = Some(root);
                debug!(tree = %self.name, root = %root, left = %current, right = %sibling, "grew new root");
                break;
            }
        }
        Ok(())
    }

    /// Split one node, returning the key for the parent and the new right
    /// sibling's id.
    fn split_node(&mut self, id: NodeId) -> Result<(Key, NodeId), BTreeError> {
        let split = match self.arena.get_mut(id)? {
            Node::Leaf(leaf) => leaf.split_off().map(|(key, mut right)| {
                right.prev = Some(id);
                (key, Node::Leaf(right))
            }),
            Node::Internal(node) => node
                .split_off()
                .map(|(key, right)| (key, Node::Internal(right))),
        };
        let (promoted, right) =
            split.ok_or_else(|| BTreeError::Inconsistent(format!("node {id} is too small to split")))?;

        let old_next = match &right {
            Node::Leaf(leaf) => leaf.next,
            Node::Internal(_) => None,
        };
        let is_leaf = right.is_leaf();
        let right_id = self.arena.alloc(right);
        if is_leaf {
            self.arena.leaf_mut(id)?.next = Some(right_id);
            if let Some(next) = old_next {
                self.arena.leaf_mut(next)?.prev = Some(right_id);
            }
        }

        debug!(tree = %self.name, node = %id, sibling = %right_id, leaf = is_leaf, "split node");
        Ok((promoted, right_id))
    }

    /// Walk the path upwards fixing underflow: borrow from a sibling with a
    /// spare key (left first) and stop, or merge (left first) and continue
    /// with the parent. An internal root left without keys is replaced by
    /// its only child.
    fn rebalance_after_delete(&mut self, path: DescentPath) -> Result<(), BTreeError> {
        let DescentPath { mut frames, leaf } = path;
        let mut current = leaf;

        while let Some(frame) = frames.pop() {
            if !self.arena.get(current)?.is_underflow(self.order) {
                return Ok(());
            }

            let parent = self.arena.internal(frame.node)?;
            let index = frame.child_index;
            let left = index.checked_sub(1).and_then(|i| parent.children.get(i).copied());
            let right = parent.children.get(index + 1).copied();

            if let Some(left) = left
                && self.arena.get(left)?.has_surplus_key(self.order)
            {
                return self.redistribute(frame.node, index - 1, current, left, Side::Left);
            }
            if let Some(right) = right
                && self.arena.get(right)?.has_surplus_key(self.order)
            {
                return self.redistribute(frame.node, index, current, right, Side::Right);
            }

            match (left, right) {
                (Some(left), _) => self.merge(frame.node, index - 1, left, current)?,
                (None, Some(right)) => self.merge(frame.node, index, current, right)?,
                (None, None) => {
                    return Err(BTreeError::Inconsistent(format!(
                        "node {current} has no siblings under {}",
                        frame.node
                    )));
                }
            }
            current = frame.node;
        }

        self.collapse_root()
    }

    /// Move one key from `donor` into `node` through the parent separator
    /// at `separator_index`.
    fn redistribute(
        &mut self,
        parent: NodeId,
        separator_index: usize,
        node: NodeId,
        donor: NodeId,
        side: Side,
    ) -> Result<(), BTreeError> {
        let separator = self
            .arena
            .internal(parent)?
            .keys
            .get(separator_index)
            .cloned()
            .ok_or_else(|| missing_separator(parent, separator_index))?;

        let new_separator = match self.arena.pair_mut(node, donor)? {
            (Node::Leaf(target), Node::Leaf(lender)) => match side {
                Side::Left => target.borrow_from_left(lender),
                Side::Right => target.borrow_from_right(lender),
            },
            (Node::Internal(target), Node::Internal(lender)) => match side {
                Side::Left => target.borrow_from_left(separator, lender),
                Side::Right => target.borrow_from_right(separator, lender),
            },
            _ => {
                return Err(BTreeError::Inconsistent(format!(
                    "siblings {node} and {donor} are different node kinds"
                )));
            }
        }
        .ok_or_else(|| BTreeError::Inconsistent(format!("node {donor} has no key to lend")))?;

        let slot = self
            .arena
            .internal_mut(parent)?
            .keys
            .get_mut(separator_index)
            .ok_or_else(|| missing_separator(parent, separator_index))?;
        *slot = new_separator;

        debug!(tree = %self.name, node = %node, donor = %donor, side = ?side, "redistributed key");
        Ok(())
    }

    /// Absorb `right` into `left` and drop separator `separator_index`
    /// from the parent.
    fn merge(
        &mut self,
        parent: NodeId,
        separator_index: usize,
        left: NodeId,
        right: NodeId,
    ) -> Result<(), BTreeError> {
        let (separator, removed) = self
            .arena
            .internal_mut(parent)?
            .remove_separator(separator_index)
            .ok_or_else(|| missing_separator(parent, separator_index))?;
        if removed != right {
            return Err(BTreeError::Inconsistent(format!(
                "separator {separator_index} of {parent} points at {removed}, expected {right}"
            )));
        }

        let next = match self.arena.free(right)? {
            Node::Leaf(right_leaf) => {
                let next = right_leaf.next;
                self.arena.leaf_mut(left)?.absorb(right_leaf);
                next
            }
            Node::Internal(right_node) => {
                self.arena.internal_mut(left)?.absorb(separator, right_node);
                None
            }
        };
        if let Some(next) = next {
            self.arena.leaf_mut(next)?.prev = Some(left);
        }

        debug!(tree = %self.name, left = %left, right = %right, "merged nodes");
        Ok(())
    }

    /// Replace an internal root that has no keys with its only child.
    fn collapse_root(&mut self) -> Result<(), BTreeError> {
        let Some(root) = self.root else {
            return Ok(());
        };
        let child = match self.arena.get(root)? {
            Node::Internal(node) if node.keys.is_empty() => first_child(node, root)?,
            _ => return Ok(()),
        };
        self.arena.free(root)?;
        self.root = Some(child);
        debug!(tree = %self.name, old_root = %root, new_root = %child, "collapsed root");
        Ok(())
    }

    /// Render the tree level by level, one line per level, using the key
    /// serializer's `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree structure is inconsistent.
    pub fn format_tree(&self) -> Result<String, BTreeError> {
        let mut out = String::new();
        let Some(root) = self.root else {
            out.push_str("<empty>\n");
            return Ok(out);
        };

        let mut level = vec![root];
        while !level.is_empty() {
            let mut next_level = Vec::new();
            let mut rendered = Vec::with_capacity(level.len());
            for id in level {
                let node = self.arena.get(id)?;
                let keys: Vec<String> = node.keys().iter().map(|key| self.format_key(key)).collect();
                rendered.push(format!("[{}]", keys.join(", ")));
                if let Node::Internal(internal) = node {
                    next_level.extend_from_slice(&internal.children);
                }
            }
            let _ = writeln!(out, "{}", rendered.join(" "));
            level = next_level;
        }
        Ok(out)
    }

    fn format_key(&self, key: &[u8]) -> String {
        self.key_serializer.deserialize(key).map_or_else(
            |_| format!("{key:02x?}"),
            |decoded| self.key_serializer.format(&decoded),
        )
    }

    /// Check every structural invariant and return a shape summary.
    ///
    /// Verified: key order within nodes, separator bounds, occupancy of
    /// non-root nodes, child counts, uniform leaf depth, the leaf chain in
    /// both directions, and the entry count.
    ///
    /// # Errors
    ///
    /// Returns [`BTreeError::Inconsistent`] describing the first violation.
    pub fn validate(&self) -> Result<TreeStats, BTreeError> {
        let mut stats = TreeStats::default();
        let Some(root) = self.root else {
            if self.len != 0 {
                return Err(BTreeError::Inconsistent(format!(
                    "no root but {} entries recorded",
                    self.len
                )));
            }
            return Ok(stats);
        };

        let mut leaves = Vec::new();
        let mut leaf_depth = None;
        self.validate_node(root, None, None, 1, &mut leaf_depth, &mut leaves, &mut stats)?;
        stats.height = leaf_depth.unwrap_or_default();

        for (position, &leaf_id) in leaves.iter().enumerate() {
            let leaf = self.arena.leaf(leaf_id)?;
            let expected_prev = position.checked_sub(1).map(|i| leaves[i]);
            let expected_next = leaves.get(position + 1).copied();
            if leaf.prev != expected_prev || leaf.next != expected_next {
                return Err(BTreeError::Inconsistent(format!(
                    "leaf {leaf_id} links prev={:?} next={:?}, expected prev={expected_prev:?} next={expected_next:?}",
                    leaf.prev, leaf.next
                )));
            }
        }

        if stats.entries != self.len {
            return Err(BTreeError::Inconsistent(format!(
                "found {} entries, recorded {}",
                stats.entries, self.len
            )));
        }
        if stats.internal_nodes + stats.leaf_nodes != self.arena.live() {
            return Err(BTreeError::Inconsistent(format!(
                "{} reachable nodes, {} allocated",
                stats.internal_nodes + stats.leaf_nodes,
                self.arena.live()
            )));
        }
        Ok(stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn validate_node(
        &self,
        id: NodeId,
        lower: Option<&[u8]>,
        upper: Option<&[u8]>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        leaves: &mut Vec<NodeId>,
        stats: &mut TreeStats,
    ) -> Result<(), BTreeError> {
        use std::cmp::Ordering;

        let node = self.arena.get(id)?;
        let is_root = Some(id) == self.root;
        let fail = |message: String| Err(BTreeError::Inconsistent(format!("node {id}: {message}")));

        if node.is_overflow(self.order) {
            return fail(format!("{} keys exceeds max {}", node.len(), self.order.max_keys()));
        }
        if !is_root && node.is_underflow(self.order) {
            return fail(format!("{} keys is below the minimum", node.len()));
        }

        let keys = node.keys();
        for pair in keys.windows(2) {
            let ordering = self.comparator.compare(&pair[0], &pair[1]);
            if ordering == Ordering::Greater || (!self.allow_duplicate && ordering == Ordering::Equal) {
                return fail("keys out of order".to_string());
            }
        }
        for key in keys {
            if lower.is_some_and(|bound| self.comparator.compare(key, bound) == Ordering::Less) {
                return fail("key below its separator bound".to_string());
            }
            let above = upper.is_some_and(|bound| match self.comparator.compare(key, bound) {
                Ordering::Greater => true,
                Ordering::Equal => !self.allow_duplicate,
                Ordering::Less => false,
            });
            if above {
                return fail("key above its separator bound".to_string());
            }
        }

        match node {
            Node::Leaf(leaf) => {
                if leaf.values.len() != leaf.keys.len() {
                    return fail("key and value counts differ".to_string());
                }
                match *leaf_depth {
                    None => *leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return fail(format!("leaf at depth {depth}, expected {expected}"));
                    }
                    Some(_) => {}
                }
                stats.leaf_nodes += 1;
                stats.entries += leaf.keys.len();
                leaves.push(id);
            }
            Node::Internal(internal) => {
                if internal.children.len() != internal.keys.len() + 1 {
                    return fail(format!(
                        "{} keys but {} children",
                        internal.keys.len(),
                        internal.children.len()
                    ));
                }
                if is_root && internal.keys.is_empty() {
                    return fail("internal root has no keys".to_string());
                }
                stats.internal_nodes += 1;
                for (index, &child) in internal.children.iter().enumerate() {
                    let child_lower = index.checked_sub(1).map(|i| internal.keys[i].as_slice()).or(lower);
                    let child_upper = internal.keys.get(index).map(Vec::as_slice).or(upper);
                    self.validate_node(child, child_lower, child_upper, depth + 1, leaf_depth, leaves, stats)?;
                }
            }
        }
        Ok(())
    }
}

impl<K, V> std::fmt::Debug for BTree<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BTree")
            .field("name", &self.name)
            .field("max_keys", &self.order.max_keys())
            .field("allow_duplicate", &self.allow_duplicate)
            .field("len", &self.len)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

fn child_at(node: &InternalNode, id: NodeId, index: usize) -> Result<NodeId, BTreeError> {
    node.children
        .get(index)
        .copied()
        .ok_or_else(|| BTreeError::Inconsistent(format!("node {id} has no child {index}")))
}

fn first_child(node: &InternalNode, id: NodeId) -> Result<NodeId, BTreeError> {
    child_at(node, id, 0)
}

fn missing_separator(parent: NodeId, index: usize) -> BTreeError {
    BTreeError::Inconsistent(format!("node {parent} has no separator {index}"))
}

/// Iterator over raw `(encoded key, payload)` pairs, following leaf links.
#[derive(Debug)]
pub struct RawEntries<'a> {
    arena: &'a NodeArena,
    leaf: Option<NodeId>,
    index: usize,
}

impl<'a> RawEntries<'a> {
    const fn new(arena: &'a NodeArena, leaf: Option<NodeId>, index: usize) -> Self {
        Self { arena, leaf, index }
    }
}

impl<'a> Iterator for RawEntries<'a> {
    type Item = Result<(&'a [u8], &'a [u8]), BTreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.leaf?;
            let leaf = match self.arena.leaf(id) {
                Ok(leaf) => leaf,
                Err(e) => {
                    self.leaf = None;
                    return Some(Err(e));
                }
            };
            if let (Some(key), Some(value)) = (leaf.keys.get(self.index), leaf.values.get(self.index)) {
                self.index += 1;
                return Some(Ok((key.as_slice(), value.as_slice())));
            }
            self.leaf = leaf.next;
            self.index = 0;
        }
    }
}

/// Iterator over decoded entries in key order.
pub struct Entries<'a, K, V> {
    raw: RawEntries<'a>,
    key_serializer: &'a dyn KeySerializer<K>,
    value_serializer: &'a dyn ValueSerializer<V>,
}

impl<K, V> Iterator for Entries<'_, K, V> {
    type Item = Result<(K, V), BTreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.raw.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        let (key, value) = entry;
        Some(
            self.key_serializer
                .deserialize(key)
                .map_err(BTreeError::from)
                .and_then(|key| Ok((key, self.value_serializer.deserialize(value)?))),
        )
    }
}

/// Errors that can occur in B-tree operations.
#[derive(Debug)]
pub enum BTreeError {
    /// Key encoding or decoding failed.
    Codec(CodecError),
    /// Value encoding or decoding failed.
    Value(ValueError),
    /// The tree has never had an entry inserted.
    EmptyTree,
    /// The configured order cannot form a valid tree.
    InvalidOrder { max_keys: usize },
    /// The node structure violates an invariant.
    Inconsistent(String),
}

impl std::fmt::Display for BTreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "key codec error: {e}"),
            Self::Value(e) => write!(f, "value error: {e}"),
            Self::EmptyTree => write!(f, "tree is empty"),
            Self::InvalidOrder { max_keys } => {
                write!(f, "invalid tree order {max_keys}: must be at least {MIN_MAX_KEYS}")
            }
            Self::Inconsistent(message) => write!(f, "inconsistent tree: {message}"),
        }
    }
}

impl std::error::Error for BTreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            Self::Value(e) => Some(e),
            Self::EmptyTree | Self::InvalidOrder { .. } | Self::Inconsistent(_) => None,
        }
    }
}

impl From<CodecError> for BTreeError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<ValueError> for BTreeError {
    fn from(e: ValueError) -> Self {
        Self::Value(e)
    }
}
