//! Node records and the three-bucket delta shape
//!
//! The wire shape matches what the topology source sends:
//!
//! ```text
//! { "add": [Node] | null, "update": [Node] | null, "remove": [NodeId] | null }
//! ```

use crate::consolidate::Consolidate;
use crate::merge::merge;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Identifier of a graph node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A full node record.
///
/// Only `id` is interpreted; every other field is carried through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// One batch of node changes observed between two points in time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodesDelta {
    #[serde(default)]
    pub add: Option<Vec<Node>>,
    #[serde(default)]
    pub update: Option<Vec<Node>>,
    #[serde(default)]
    pub remove: Option<Vec<NodeId>>,
}

impl NodesDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_add(mut self, nodes: Vec<Node>) -> Self {
        self.add = Some(nodes);
        self
    }

    pub fn with_update(mut self, nodes: Vec<Node>) -> Self {
        self.update = Some(nodes);
        self
    }

    pub fn with_remove<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        self.remove = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn added(&self) -> &[Node] {
        self.add.as_deref().unwrap_or(&[])
    }

    pub fn updated(&self) -> &[Node] {
        self.update.as_deref().unwrap_or(&[])
    }

    pub fn removed(&self) -> &[NodeId] {
        self.remove.as_deref().unwrap_or(&[])
    }

    /// `(add, update, remove)` sizes, mostly for logging.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.added().len(), self.updated().len(), self.removed().len())
    }

    /// A delta with nothing in any bucket.
    pub fn is_empty(&self) -> bool {
        self.added().is_empty() && self.updated().is_empty() && self.removed().is_empty()
    }

    /// Every node id mentioned in any bucket.
    pub fn touched_ids(&self) -> HashSet<&NodeId> {
        self.added()
            .iter()
            .chain(self.updated())
            .map(|n| &n.id)
            .chain(self.removed())
            .collect()
    }

    /// Normalize the delta as received from the source.
    ///
    /// Duplicate ids within one bucket collapse to a single entry: the last
    /// occurrence's record at the first occurrence's position. Empty buckets
    /// become absent.
    pub fn canonicalize(self) -> Self {
        Self {
            add: self.add.map(dedup_nodes).and_then(non_empty),
            update: self.update.map(dedup_nodes).and_then(non_empty),
            remove: self.remove.map(dedup_ids).and_then(non_empty),
        }
    }
}

impl Consolidate for NodesDelta {
    fn is_degenerate(&self) -> bool {
        self.is_empty()
    }

    fn consolidate(&self, newer: &Self) -> Self {
        debug!(
            older = ?self.counts(),
            newer = ?newer.counts(),
            "Consolidating nodes deltas"
        );
        let merged = merge(self, newer);
        let (add, update, remove) = merged.counts();
        debug!(add, update, remove, "Consolidated nodes delta");
        merged
    }
}

pub(crate) fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Keep one record per id: the last one seen, in the slot of the first.
pub(crate) fn dedup_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut slots: HashMap<NodeId, usize> = HashMap::with_capacity(nodes.len());
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match slots.get(&node.id) {
            Some(&slot) => out[slot] = node,
            None => {
                slots.insert(node.id.clone(), out.len());
                out.push(node);
            }
        }
    }
    out
}

pub(crate) fn dedup_ids(ids: Vec<NodeId>) -> Vec<NodeId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
