// File: ./tests/proptest_migration.rs
//! Property-based tests for the migration driver.
//!
//! Uses proptest to verify that:
//! - Priority mapping follows `7 - 2 * max(p, 0)` with no clamping
//! - Every distinct task identity is written exactly once, whatever the nesting
//! - Children always point at a uid written earlier in the run

use bc2t_migrate::export::parse_export;
use bc2t_migrate::lists::{ListAnswer, ListPolicy};
use bc2t_migrate::migrate::{MigrationOptions, MigrationReport, migrate};
use bc2t_migrate::store::MemoryStore;
use bc2t_migrate::transform::{SequentialUids, map_priority};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;

type Shape = Vec<(u8, Vec<u8>)>;

/// Top-level ids, each with child ids that also appear at top level somewhere.
fn shapes() -> impl Strategy<Value = Shape> {
    prop::collection::vec((0u8..12, prop::collection::vec(0u8..12, 0..4)), 1..20).prop_map(
        |mut shape| {
            let top: HashSet<u8> = shape.iter().map(|(id, _)| *id).collect();
            for (_, children) in &mut shape {
                children.retain(|c| top.contains(c));
            }
            shape
        },
    )
}

fn run(shape: &Shape) -> (MigrationReport, MemoryStore) {
    let tasks: Vec<_> = shape
        .iter()
        .map(|(id, children)| {
            json!({
                "id": id,
                "title": format!("task {id}"),
                "collectionName": if id % 2 == 0 { "Even" } else { "Odd" },
                "hasSubTasks": !children.is_empty(),
                "subTasks": children.iter().map(|c| json!({"id": c})).collect::<Vec<_>>(),
            })
        })
        .collect();
    let export = parse_export(&serde_json::to_string(&tasks).unwrap()).unwrap();

    let store = MemoryStore::new();
    let ids = SequentialUids::new("p");
    let mut decider = |_: &str, _: bool| ListAnswer::Create;
    let options = MigrationOptions {
        lists: ListPolicy::NewAndExisting,
        ..Default::default()
    };
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let report = runtime
        .block_on(migrate(&export, &store, &mut decider, &ids, options))
        .unwrap();
    (report, store)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..Default::default()
    })]

    #[test]
    fn priority_mapping_is_linear_below_seven(p in -1_000i64..1_000) {
        let mapped = map_priority(p);
        prop_assert_eq!(mapped, 7 - 2 * p.max(0));
        prop_assert!(mapped <= 7);
        prop_assert!(mapped % 2 != 0);
    }

    #[test]
    fn each_identity_is_written_once(shape in shapes()) {
        let distinct: HashSet<u8> = shape.iter().map(|(id, _)| *id).collect();
        let (report, store) = run(&shape);

        prop_assert_eq!(report.migrated, distinct.len());
        prop_assert_eq!(store.tasks().len(), distinct.len());
        let sources: HashSet<_> = report.persisted.iter().map(|t| t.source_id.clone()).collect();
        prop_assert_eq!(sources.len(), report.persisted.len());
    }

    #[test]
    fn children_follow_their_parents(shape in shapes()) {
        let (report, _) = run(&shape);
        let mut written = HashSet::new();
        for task in &report.persisted {
            if let Some(parent) = &task.parent_uid {
                prop_assert!(written.contains(parent));
            }
            written.insert(task.uid.clone());
        }
    }
}
