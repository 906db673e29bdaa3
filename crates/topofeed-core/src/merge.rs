//! Merging two ordered node deltas into one
//!
//! Only bucket membership by node id is considered; node payloads are never
//! diffed, the newer copy simply wins.
//!
//! | older    | newer    | merged                       |
//! |----------|----------|------------------------------|
//! | add a    | update a | add a (newer record)         |
//! | add a    | remove a | nothing                      |
//! | update a | remove a | remove a                     |
//! | update a | update a | update a (newer record)      |
//! | remove a | add a    | remove a + add a (unchanged) |
//!
//! An entry that already carries `remove a + add a` keeps its removal when a
//! later `remove a` cancels the add.

use crate::delta::{dedup_ids, dedup_nodes, non_empty, Node, NodeId, NodesDelta};
use std::collections::{HashMap, HashSet};

/// Combine `older` then `newer` into a single delta.
pub fn merge(older: &NodesDelta, newer: &NodesDelta) -> NodesDelta {
    let mut to_add = union_nodes(older.added(), newer.added());
    let mut to_update = union_nodes(older.updated(), newer.updated());
    let mut to_remove = union_ids(older.removed(), newer.removed());

    let older_added: HashSet<&NodeId> = older.added().iter().map(|n| &n.id).collect();
    let older_updated: HashSet<&NodeId> = older.updated().iter().map(|n| &n.id).collect();
    let newer_updates: HashMap<&NodeId, &Node> =
        newer.updated().iter().map(|n| (&n.id, n)).collect();
    let newer_removed: HashSet<&NodeId> = newer.removed().iter().collect();

    // added, then updated: still an add, carrying the latest record
    let mut absorbed: HashSet<NodeId> = HashSet::new();
    for node in to_add.iter_mut() {
        if !older_added.contains(&node.id) {
            continue;
        }
        if let Some(latest) = newer_updates.get(&node.id) {
            *node = (*latest).clone();
            absorbed.insert(node.id.clone());
        }
    }
    to_update.retain(|n| !absorbed.contains(&n.id));

    // added, then removed: the consumer never needs to see it, unless the
    // add itself followed a removal of a node the consumer still shows
    let older_removed: HashSet<&NodeId> = older.removed().iter().collect();
    let cancelled: HashSet<&NodeId> = older_added.intersection(&newer_removed).copied().collect();
    to_add.retain(|n| !cancelled.contains(&n.id));
    to_remove.retain(|id| !cancelled.contains(id) || older_removed.contains(id));

    // updated, then removed: only the removal is reported
    to_update.retain(|n| !(older_updated.contains(&n.id) && newer_removed.contains(&n.id)));

    NodesDelta {
        add: non_empty(to_add),
        update: non_empty(to_update),
        remove: non_empty(to_remove),
    }
}

fn union_nodes(older: &[Node], newer: &[Node]) -> Vec<Node> {
    dedup_nodes(older.iter().chain(newer).cloned().collect())
}

fn union_ids(older: &[NodeId], newer: &[NodeId]) -> Vec<NodeId> {
    dedup_ids(older.iter().chain(newer).cloned().collect())
}
