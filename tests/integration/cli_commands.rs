//! CLI route table against real resource directories

use crate::integration::test_utils::with_isolated_env;
use treehash::cli::{Commands, InspectFormat, RunContext};
use treehash::error::{ApiError, HashError};
use treehash::hash::HashKind;
use treehash::store::{NodeStore, SledRevisionStore};
use treehash::types::NodeKind;

#[test]
fn test_init_demo_inspect_verify() {
    with_isolated_env(|home| {
        let dir = home.path().join("res");
        let context = RunContext::new(None).unwrap();

        let out = context
            .execute(&Commands::Init {
                dir: dir.clone(),
                hash_kind: Some(HashKind::Postorder),
            })
            .unwrap();
        assert!(out.contains("postorder"));

        let out = context.execute(&Commands::Demo { dir: dir.clone() }).unwrap();
        assert!(out.contains("Committed revision 1"));

        let out = context
            .execute(&Commands::Inspect {
                dir: dir.clone(),
                revision: None,
                format: InspectFormat::Json,
            })
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["revision"], 1);
        assert_eq!(json["nodes"].as_array().unwrap().len(), 5);
        assert_eq!(json["nodes"][0]["descendant_count"], 5);

        let out = context
            .execute(&Commands::Inspect {
                dir: dir.clone(),
                revision: Some(0),
                format: InspectFormat::Text,
            })
            .unwrap();
        assert!(out.starts_with("Revision 0"));

        let out = context
            .execute(&Commands::Verify {
                dir: dir.clone(),
                revision: None,
            })
            .unwrap();
        assert!(out.contains("All digests consistent"));

        let out = context.execute(&Commands::Info { dir }).unwrap();
        assert!(out.contains("Revisions: 2"));
    });
}

#[test]
fn test_init_uses_configured_default() {
    with_isolated_env(|home| {
        let dir = home.path().join("res");
        let context = RunContext::new(None).unwrap();
        let out = context
            .execute(&Commands::Init {
                dir,
                hash_kind: None,
            })
            .unwrap();
        assert!(out.contains("Hash kind: rolling"));
    });
}

#[test]
fn test_commands_on_missing_resource_fail() {
    with_isolated_env(|home| {
        let context = RunContext::new(None).unwrap();
        let result = context.execute(&Commands::Verify {
            dir: home.path().join("nothing"),
            revision: None,
        });
        assert!(matches!(result, Err(ApiError::ConfigError(_))));
    });
}

#[test]
fn test_verify_reports_tampered_revision() {
    with_isolated_env(|home| {
        let dir = home.path().join("res");
        let context = RunContext::new(None).unwrap();
        context
            .execute(&Commands::Init {
                dir: dir.clone(),
                hash_kind: Some(HashKind::Rolling),
            })
            .unwrap();
        context.execute(&Commands::Demo { dir: dir.clone() }).unwrap();

        // Corrupt <b> in the committed revision on disk
        let (a, b) = {
            let store = SledRevisionStore::new(dir.join("store")).unwrap();
            let mut revision = store.get_revision(1).unwrap().unwrap();
            let key_of = |name: &str| {
                revision
                    .tree
                    .records()
                    .find(|r| r.kind == NodeKind::Element && r.name == name)
                    .map(|r| r.key)
                    .unwrap()
            };
            let (a, b) = (key_of("a"), key_of("b"));
            let digest = revision.tree.read_digest(b).unwrap();
            revision.tree.write_digest(b, digest ^ 1).unwrap();
            store.put_revision(&revision).unwrap();
            store.flush().unwrap();
            (a, b)
        };

        let err = context
            .execute(&Commands::Verify {
                dir: dir.clone(),
                revision: None,
            })
            .unwrap_err();
        match err {
            ApiError::Hash(HashError::InvariantViolation { node, reason }) => {
                assert_eq!(node, a);
                assert!(reason.contains("2 digests disagree"), "{}", reason);
                assert!(reason.contains(&format!("node {}:", b)), "{}", reason);
            }
            other => panic!("unexpected error: {}", other),
        }

        let out = context
            .execute(&Commands::Verify {
                dir,
                revision: Some(0),
            })
            .unwrap();
        assert!(out.contains("All digests consistent"));
    });
}
