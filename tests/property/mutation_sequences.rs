//! Random mutation sequences against the digest invariants

use proptest::prelude::*;
use std::collections::HashMap;
use treehash::access::{NodeCursor, Resource, WriteTrx};
use treehash::config::ResourceConfig;
use treehash::error::ApiError;
use treehash::hash::HashKind;
use treehash::store::NodeArena;
use treehash::types::{Digest, NodeKey, NodeKind, DOCUMENT_NODE_KEY};

/// Upper bound on tree size before copies are skipped
const MAX_NODES: usize = 200;

const NAMES: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Clone, Copy)]
enum Pos {
    FirstChild,
    RightSibling,
    LeftSibling,
}

#[derive(Debug, Clone)]
enum Op {
    Element(usize, usize, Pos),
    Text(usize, usize, Pos),
    Attribute(usize, usize, usize),
    Remove(usize),
    Rename(usize, usize),
    SetValue(usize, usize),
    Move(usize, usize),
    Copy(usize, usize),
}

fn pos_strategy() -> impl Strategy<Value = Pos> {
    prop_oneof![
        Just(Pos::FirstChild),
        Just(Pos::RightSibling),
        Just(Pos::LeftSibling),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let name = 0..NAMES.len();
    prop_oneof![
        4 => (any::<usize>(), name.clone(), pos_strategy()).prop_map(|(n, i, p)| Op::Element(n, i, p)),
        2 => (any::<usize>(), name.clone(), pos_strategy()).prop_map(|(n, i, p)| Op::Text(n, i, p)),
        2 => (any::<usize>(), name.clone(), name.clone()).prop_map(|(n, i, v)| Op::Attribute(n, i, v)),
        2 => any::<usize>().prop_map(Op::Remove),
        1 => (any::<usize>(), name.clone()).prop_map(|(n, i)| Op::Rename(n, i)),
        1 => (any::<usize>(), name.clone()).prop_map(|(n, i)| Op::SetValue(n, i)),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Move(a, b)),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Copy(a, b)),
    ]
}

fn kind_strategy() -> impl Strategy<Value = HashKind> {
    prop_oneof![
        Just(HashKind::None),
        Just(HashKind::Rolling),
        Just(HashKind::Postorder),
    ]
}

fn pick(wtx: &WriteTrx<'_>, index: usize) -> NodeKey {
    let keys: Vec<NodeKey> = wtx.tree().records().map(|r| r.key).collect();
    keys[index % keys.len()]
}

fn go(wtx: &mut WriteTrx<'_>, index: usize) -> Result<(), ApiError> {
    let key = pick(wtx, index);
    wtx.move_to(key)
}

fn apply(wtx: &mut WriteTrx<'_>, op: &Op) -> Result<(), ApiError> {
    match *op {
        Op::Element(n, i, pos) => {
            go(wtx, n)?;
            match pos {
                Pos::FirstChild => wtx.insert_element_as_first_child(NAMES[i]),
                Pos::RightSibling => wtx.insert_element_as_right_sibling(NAMES[i]),
                Pos::LeftSibling => wtx.insert_element_as_left_sibling(NAMES[i]),
            }
            .map(|_| ())
        }
        Op::Text(n, i, pos) => {
            go(wtx, n)?;
            match pos {
                Pos::FirstChild => wtx.insert_text_as_first_child(NAMES[i]),
                Pos::RightSibling => wtx.insert_text_as_right_sibling(NAMES[i]),
                Pos::LeftSibling => wtx.insert_text_as_left_sibling(NAMES[i]),
            }
            .map(|_| ())
        }
        Op::Attribute(n, i, v) => {
            go(wtx, n)?;
            wtx.insert_attribute(NAMES[i], NAMES[v]).map(|_| ())
        }
        Op::Remove(n) => {
            go(wtx, n)?;
            wtx.remove()
        }
        Op::Rename(n, i) => {
            go(wtx, n)?;
            wtx.set_name(NAMES[i])
        }
        Op::SetValue(n, i) => {
            go(wtx, n)?;
            wtx.set_value(NAMES[i])
        }
        Op::Move(from, to) => {
            let from = pick(wtx, from);
            go(wtx, to)?;
            wtx.move_subtree_to_first_child(from)
        }
        Op::Copy(from, to) => {
            if wtx.tree().len() > MAX_NODES {
                return Ok(());
            }
            let from = pick(wtx, from);
            go(wtx, to)?;
            wtx.copy_subtree_as_first_child(from).map(|_| ())
        }
    }
}

fn apply_all(wtx: &mut WriteTrx<'_>, ops: &[Op]) {
    for op in ops {
        match apply(wtx, op) {
            Ok(()) | Err(ApiError::InvalidOperation(_)) => {}
            Err(e) => panic!("{:?} failed: {}", op, e),
        }
    }
}

fn target_index(op: &Op) -> usize {
    match *op {
        Op::Element(n, ..) | Op::Text(n, ..) | Op::Attribute(n, ..) => n,
        _ => 0,
    }
}

fn snapshot(wtx: &WriteTrx<'_>) -> HashMap<NodeKey, (Digest, u64)> {
    wtx.tree()
        .records()
        .map(|r| (r.key, (r.digest, r.descendant_count)))
        .collect()
}

fn children(tree: &NodeArena, key: NodeKey) -> Vec<NodeKey> {
    let mut out = Vec::new();
    let mut next = tree.record(key).unwrap().first_child;
    while let Some(child) = next {
        out.push(child);
        next = tree.record(child).unwrap().right_sibling;
    }
    out
}

/// Rebuild `src` under `dst_parent`, inserting children right to left and attributes last
fn rebuild(src: &NodeArena, key: NodeKey, wtx: &mut WriteTrx<'_>, dst_parent: NodeKey) {
    for child in children(src, key).into_iter().rev() {
        wtx.move_to(dst_parent).unwrap();
        let record = src.record(child).unwrap();
        let copy = match record.kind {
            NodeKind::Element => wtx.insert_element_as_first_child(&record.name).unwrap(),
            NodeKind::Text => wtx.insert_text_as_first_child(record.value.clone()).unwrap(),
            other => panic!("unexpected structural child kind {}", other),
        };
        rebuild(src, child, wtx, copy);
    }
    for &attribute in &src.record(key).unwrap().attributes {
        wtx.move_to(dst_parent).unwrap();
        let record = src.record(attribute).unwrap();
        wtx.insert_attribute(&record.name, record.value.clone()).unwrap();
    }
}

fn document_order(tree: &NodeArena) -> Vec<(NodeKind, String, Vec<u8>, Digest, u64)> {
    treehash::tree::walker::preorder(tree, DOCUMENT_NODE_KEY)
        .unwrap()
        .into_iter()
        .map(|key| {
            let r = tree.record(key).unwrap();
            (r.kind, r.name.clone(), r.value.clone(), r.digest, r.descendant_count)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_mutations_keep_every_digest_consistent(
        kind in kind_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let resource = Resource::create(ResourceConfig::new(kind)).unwrap();
        let mut wtx = resource.begin_write().unwrap();
        apply_all(&mut wtx, &ops);
        let mismatches = wtx.verify().unwrap();
        prop_assert!(mismatches.is_empty(), "{:?}", mismatches);

        wtx.commit().unwrap();
        drop(wtx);
        let rtx = resource.begin_read(None).unwrap();
        prop_assert!(rtx.verify().unwrap().is_empty());
    }

    #[test]
    fn rolling_insert_then_remove_is_identity(
        base in prop::collection::vec(op_strategy(), 0..25),
        subtree in prop::collection::vec(op_strategy(), 0..15),
        anchor in any::<usize>(),
    ) {
        let resource = Resource::create(ResourceConfig::new(HashKind::Rolling)).unwrap();
        let mut wtx = resource.begin_write().unwrap();
        apply_all(&mut wtx, &base);

        let parent = pick(&wtx, anchor);
        wtx.move_to(parent).unwrap();
        prop_assume!(wtx.kind() == Some(NodeKind::Element) || wtx.kind() == Some(NodeKind::Document));
        let before = snapshot(&wtx);

        let root = wtx.insert_element_as_first_child("inserted").unwrap();
        // Grow the new subtree only: every op is redirected below `root`.
        for op in &subtree {
            let inside: Vec<NodeKey> = treehash::tree::walker::preorder(wtx.tree(), root).unwrap();
            let target = inside[target_index(op) % inside.len()];
            wtx.move_to(target).unwrap();
            let _ = match *op {
                Op::Element(_, i, _) => wtx.insert_element_as_first_child(NAMES[i]).map(|_| ()),
                Op::Text(_, i, _) => wtx.insert_text_as_first_child(NAMES[i]).map(|_| ()),
                Op::Attribute(_, i, v) => wtx.insert_attribute(NAMES[i], NAMES[v]).map(|_| ()),
                _ => Ok(()),
            };
        }

        wtx.move_to(root).unwrap();
        wtx.remove().unwrap();
        prop_assert_eq!(snapshot(&wtx), before);
    }

    #[test]
    fn rolling_ignores_sibling_order(
        names in prop::collection::vec(0..NAMES.len(), 1..8),
    ) {
        let mut digests = Vec::new();
        for order in [names.clone(), names.iter().rev().copied().collect()] {
            let resource = Resource::create(ResourceConfig::new(HashKind::Rolling)).unwrap();
            let mut wtx = resource.begin_write().unwrap();
            let parent = wtx.insert_element_as_first_child("p").unwrap();
            for i in order {
                wtx.move_to(parent).unwrap();
                wtx.insert_element_as_first_child(NAMES[i]).unwrap();
            }
            wtx.move_to(parent).unwrap();
            digests.push(wtx.digest());
        }
        prop_assert_eq!(digests[0], digests[1]);
    }

    #[test]
    fn rebuilt_tree_has_identical_digests(
        kind in kind_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..30),
    ) {
        let original = Resource::create(ResourceConfig::new(kind)).unwrap();
        let mut wtx = original.begin_write().unwrap();
        apply_all(&mut wtx, &ops);

        let replica = Resource::create(ResourceConfig::new(kind)).unwrap();
        let mut rebuilt = replica.begin_write().unwrap();
        rebuild(wtx.tree(), DOCUMENT_NODE_KEY, &mut rebuilt, DOCUMENT_NODE_KEY);

        prop_assert_eq!(document_order(wtx.tree()), document_order(rebuilt.tree()));
    }
}
