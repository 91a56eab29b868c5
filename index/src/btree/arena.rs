//! Node storage for the in-memory tree.
//!
//! Nodes live in a slot vector and are addressed by [`NodeId`]. Freed slots
//! are recycled through a free list, so an id is only meaningful while the
//! node it names is alive; the tree removes every reference to a node
//! before freeing it.

use std::fmt;

use crate::btree::node::{InternalNode, LeafNode, Node};
use crate::btree::tree::BTreeError;

/// Stable handle to a node in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
}

impl NodeArena {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store `node` and return its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(node);
            NodeId(index)
        } else {
            self.slots.push(Some(node));
            NodeId(self.slots.len() - 1)
        }
    }

    /// Remove the node from the arena and hand back ownership.
    pub fn free(&mut self, id: NodeId) -> Result<Node, BTreeError> {
        let node = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| missing(id))?;
        self.free.push(id.0);
        Ok(node)
    }

    /// Number of live nodes.
    #[must_use]
    pub const fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, BTreeError> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| missing(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, BTreeError> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| missing(id))
    }

    pub fn leaf(&self, id: NodeId) -> Result<&LeafNode, BTreeError> {
        match self.get(id)? {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(wrong_kind(id, "leaf")),
        }
    }

    pub fn leaf_mut(&mut self, id: NodeId) -> Result<&mut LeafNode, BTreeError> {
        match self.get_mut(id)? {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(wrong_kind(id, "leaf")),
        }
    }

    pub fn internal(&self, id: NodeId) -> Result<&InternalNode, BTreeError> {
        match self.get(id)? {
            Node::Internal(node) => Ok(node),
            Node::Leaf(_) => Err(wrong_kind(id, "internal")),
        }
    }

    pub fn internal_mut(&mut self, id: NodeId) -> Result<&mut InternalNode, BTreeError> {
        match self.get_mut(id)? {
            Node::Internal(node) => Ok(node),
            Node::Leaf(_) => Err(wrong_kind(id, "internal")),
        }
    }

    /// Borrow two distinct nodes mutably at once.
    pub fn pair_mut(&mut self, a: NodeId, b: NodeId) -> Result<(&mut Node, &mut Node), BTreeError> {
        if a == b {
            return Err(BTreeError::Inconsistent(format!(
                "node {a} borrowed twice"
            )));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let split = high.0.min(self.slots.len());
        let (head, tail) = self.slots.split_at_mut(split);
        let low_node = head
            .get_mut(low.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| missing(low))?;
        let high_node = tail
            .first_mut()
            .and_then(Option::as_mut)
            .ok_or_else(|| missing(high))?;
        if a < b {
            Ok((low_node, high_node))
        } else {
            Ok((high_node, low_node))
        }
    }
}

fn missing(id: NodeId) -> BTreeError {
    BTreeError::Inconsistent(format!("node {id} does not exist"))
}

fn wrong_kind(id: NodeId, expected: &str) -> BTreeError {
    BTreeError::Inconsistent(format!("node {id} is not a {expected} node"))
}
