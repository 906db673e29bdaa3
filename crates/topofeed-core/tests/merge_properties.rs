//! Property tests for delta merging

use proptest::prelude::*;
use std::collections::HashSet;
use topofeed_core::{merge, Node, NodeId, NodesDelta};

/// A delta over ids drawn from a small alphabet, so buckets collide often.
fn arb_delta() -> impl Strategy<Value = NodesDelta> {
    let ids = || prop::collection::vec(0u8..8, 0..4);
    (ids(), ids(), ids()).prop_map(|(add, update, remove)| {
        NodesDelta {
            add: Some(add.iter().map(|i| Node::new(format!("n{}", i))).collect()),
            update: Some(
                update
                    .iter()
                    .map(|i| Node::new(format!("n{}", i)).with_attr("v", *i))
                    .collect(),
            ),
            remove: Some(remove.iter().map(|i| NodeId::new(format!("n{}", i))).collect()),
        }
        .canonicalize()
    })
}

fn bucket_ids(nodes: &[Node]) -> HashSet<NodeId> {
    nodes.iter().map(|n| n.id.clone()).collect()
}

proptest! {
    #[test]
    fn merged_buckets_never_hold_duplicates(older in arb_delta(), newer in arb_delta()) {
        let merged = merge(&older, &newer);
        prop_assert_eq!(bucket_ids(merged.added()).len(), merged.added().len());
        prop_assert_eq!(bucket_ids(merged.updated()).len(), merged.updated().len());
        let removed: HashSet<_> = merged.removed().iter().collect();
        prop_assert_eq!(removed.len(), merged.removed().len());
    }

    #[test]
    fn only_add_then_remove_drops_ids(older in arb_delta(), newer in arb_delta()) {
        let merged = merge(&older, &newer);

        let before: HashSet<&NodeId> = older
            .touched_ids()
            .union(&newer.touched_ids())
            .copied()
            .collect();
        let after = merged.touched_ids();

        let older_added = bucket_ids(older.added());
        let newer_removed: HashSet<NodeId> = newer.removed().iter().cloned().collect();

        for id in before.difference(&after) {
            prop_assert!(older_added.contains(*id) && newer_removed.contains(*id));
        }
        prop_assert!(after.is_subset(&before));
    }

    #[test]
    fn repeated_removal_always_survives(older in arb_delta(), newer in arb_delta()) {
        let merged = merge(&older, &newer);
        let kept: HashSet<&NodeId> = merged.removed().iter().collect();

        for id in newer.removed() {
            if older.removed().contains(id) {
                prop_assert!(kept.contains(id));
            }
        }
    }

    #[test]
    fn merging_with_empty_changes_nothing(delta in arb_delta()) {
        let empty = NodesDelta::new();
        prop_assert_eq!(merge(&delta, &empty), delta.clone());
        prop_assert_eq!(merge(&empty, &delta), delta);
    }
}
