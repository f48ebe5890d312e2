//! End-to-end digest scenarios run under both strategies

use crate::integration::test_utils::{assert_consistent, resource, STRATEGIES};
use treehash::access::NodeCursor;
use treehash::hash::HashKind;
use treehash::types::{DOCUMENT_NODE_KEY, NULL_DIGEST};

/// <a>a<b b="a"/></a>, then drop <b>: the root must fall back to the digest it had before <b>
#[test]
fn test_insert_then_remove_restores_root() {
    for kind in STRATEGIES {
        let resource = resource(kind);
        let mut wtx = resource.begin_write().unwrap();

        let a = wtx.insert_element_as_first_child("a").unwrap();
        let h1 = wtx.digest();

        wtx.insert_text_as_first_child("a").unwrap();
        wtx.move_to(a).unwrap();
        let h2 = wtx.digest();
        assert_ne!(h1, h2, "{}", kind);

        wtx.move_to_first_child();
        let b = wtx.insert_element_as_right_sibling("b").unwrap();
        wtx.insert_attribute("b", "a").unwrap();
        wtx.move_to(a).unwrap();
        let h3 = wtx.digest();
        assert_ne!(h3, h1, "{}", kind);
        assert_ne!(h3, h2, "{}", kind);
        assert_eq!(wtx.descendant_count(), 4);

        wtx.move_to(b).unwrap();
        wtx.remove().unwrap();
        wtx.move_to(a).unwrap();
        assert_eq!(wtx.digest(), h2, "{}", kind);
        assert_eq!(wtx.descendant_count(), 2);
        assert_consistent(&wtx);
    }
}

/// A four level chain is cut at its second level and rebuilt with the same content
#[test]
fn test_rebuilt_subtree_restores_ancestor() {
    for kind in STRATEGIES {
        let resource = resource(kind);
        let mut wtx = resource.begin_write().unwrap();

        let a = wtx.insert_element_as_first_child("a").unwrap();
        let b = wtx.insert_element_as_first_child("b").unwrap();
        wtx.insert_element_as_first_child("c").unwrap();
        wtx.insert_element_as_first_child("d").unwrap();
        wtx.insert_text_as_first_child("leaf").unwrap();
        wtx.move_to(a).unwrap();
        let recorded = wtx.digest();
        let document = {
            wtx.move_to_document_root();
            wtx.digest()
        };

        wtx.move_to(b).unwrap();
        wtx.remove().unwrap();
        assert_eq!(wtx.node_key(), a);
        assert_ne!(wtx.digest(), recorded);

        let b2 = wtx.insert_element_as_first_child("b").unwrap();
        assert_ne!(b2, b);
        wtx.insert_element_as_first_child("c").unwrap();
        wtx.insert_element_as_first_child("d").unwrap();
        wtx.insert_text_as_first_child("leaf").unwrap();

        wtx.move_to(a).unwrap();
        assert_eq!(wtx.digest(), recorded, "{}", kind);
        assert_eq!(wtx.descendant_count(), 5);
        wtx.move_to_document_root();
        assert_eq!(wtx.digest(), document, "{}", kind);
        assert_consistent(&wtx);
    }
}

/// Renaming the leaf of a three level chain and renaming it back
#[test]
fn test_rename_round_trip() {
    for kind in STRATEGIES {
        let resource = resource(kind);
        let mut wtx = resource.begin_write().unwrap();

        let a = wtx.insert_element_as_first_child("a").unwrap();
        wtx.insert_element_as_first_child("b").unwrap();
        let c = wtx.insert_element_as_first_child("c").unwrap();
        let leaf_before = wtx.digest();
        wtx.move_to(a).unwrap();
        let root_before = wtx.digest();

        wtx.move_to(c).unwrap();
        wtx.set_name("renamed").unwrap();
        let leaf_renamed = wtx.digest();
        wtx.move_to(a).unwrap();
        let root_renamed = wtx.digest();
        assert_ne!(leaf_renamed, leaf_before, "{}", kind);
        assert_ne!(root_renamed, root_before, "{}", kind);

        wtx.move_to(c).unwrap();
        wtx.set_name("c").unwrap();
        assert_eq!(wtx.digest(), leaf_before, "{}", kind);
        wtx.move_to(a).unwrap();
        assert_eq!(wtx.digest(), root_before, "{}", kind);
        assert_consistent(&wtx);
    }
}

#[test]
fn test_disabled_hashing_leaves_sentinel_everywhere() {
    let resource = resource(HashKind::None);
    let mut wtx = resource.begin_write().unwrap();
    let a = wtx.insert_element_as_first_child("a").unwrap();
    wtx.insert_text_as_first_child("a").unwrap();
    wtx.insert_element_as_right_sibling("b").unwrap();
    wtx.insert_attribute("b", "a").unwrap();
    wtx.move_to(a).unwrap();
    wtx.set_name("z").unwrap();

    for record in wtx.tree().records() {
        assert_eq!(record.digest, NULL_DIGEST);
        assert_eq!(record.descendant_count, 0);
    }
    wtx.commit().unwrap();
    drop(wtx);

    let rtx = resource.begin_read(None).unwrap();
    assert_eq!(rtx.node_key(), DOCUMENT_NODE_KEY);
    assert_eq!(rtx.digest(), NULL_DIGEST);
    assert_consistent(&rtx);
}

#[test]
fn test_strategies_disagree_on_the_same_tree() {
    let mut roots = Vec::new();
    for kind in STRATEGIES {
        let resource = resource(kind);
        let mut wtx = resource.begin_write().unwrap();
        wtx.insert_element_as_first_child("a").unwrap();
        wtx.insert_text_as_first_child("a").unwrap();
        wtx.move_to_document_root();
        roots.push(wtx.digest());
    }
    assert_ne!(roots[0], roots[1]);
}
