// File: ./tests/migration_flow.rs
use bc2t_migrate::export::{SEGMENT_DELIMITER, parse_export};
use bc2t_migrate::lists::{ListAnswer, ListPolicy};
use bc2t_migrate::migrate::{MigrationOptions, migrate};
use bc2t_migrate::model::{AlarmTrigger, TaskStatus, TriggerAnchor};
use bc2t_migrate::store::{MemoryStore, StoreCall};
use bc2t_migrate::transform::{IdentityPolicy, SequentialUids};
use chrono::NaiveDate;
use std::collections::HashSet;

fn new_and_existing() -> MigrationOptions {
    MigrationOptions {
        lists: ListPolicy::NewAndExisting,
        ..Default::default()
    }
}

fn no_prompt(_: &str, _: bool) -> ListAnswer {
    panic!("no prompt expected")
}

#[tokio::test]
async fn test_end_to_end_parent_child_and_reminder() {
    let raw = format!(
        r#"[{{"id":1,"title":"Parent A","collectionName":"Work","priority":2,"status":false,
             "dtstart":9223372036854775807,"hasSubTasks":true,
             "subTasks":[{{"id":2,"title":"Child B","priority":-1,"status":true,"dtstart":1704902400000}}]}}]{}[{{"itemId":2,"minutes":15}}]"#,
        SEGMENT_DELIMITER
    );
    let export = parse_export(&raw).unwrap();
    let store = MemoryStore::new();
    let ids = SequentialUids::new("uid");
    let mut decider = no_prompt;

    let report = migrate(&export, &store, &mut decider, &ids, new_and_existing())
        .await
        .unwrap();

    assert_eq!(report.migrated, 2);
    assert_eq!(report.alarms_attached, 1);
    assert_eq!(store.lists().len(), 1);
    assert_eq!(store.lists()[0].name, "Work");

    let a = store.task("uid-1").expect("A persisted");
    assert_eq!(a.summary, "Parent A");
    assert_eq!(a.priority, 3);
    assert_eq!(a.status, TaskStatus::NeedsAction);
    assert_eq!(a.due, None);
    assert_eq!(a.parent_uid, None);
    assert!(a.alarms.is_empty());

    let b = store.task("uid-2").expect("B persisted");
    assert_eq!(b.priority, 7);
    assert_eq!(b.status, TaskStatus::Completed);
    assert_eq!(b.due, NaiveDate::from_ymd_opt(2024, 1, 10));
    assert_eq!(b.parent_uid.as_deref(), Some("uid-1"));
    assert_eq!(b.alarms.len(), 1);
    assert_eq!(
        b.alarms[0].trigger,
        AlarmTrigger::Relative {
            minutes: -15,
            anchor: TriggerAnchor::Due
        }
    );
    assert_eq!(b.alarms[0].description.as_deref(), Some("Child B"));

    assert_eq!(store.tasks_in("Work").len(), 2);
}

#[tokio::test]
async fn test_children_link_to_earlier_writes() {
    let export = parse_export(
        r#"[{"id":1,"collectionName":"W","hasSubTasks":true,"subTasks":[{"id":2},{"id":3}]},
            {"id":4,"collectionName":"X","hasSubTasks":true,"subTasks":[{"id":5}]}]"#,
    )
    .unwrap();
    let store = MemoryStore::new();
    let ids = SequentialUids::new("t");
    let mut decider = no_prompt;
    let report = migrate(&export, &store, &mut decider, &ids, new_and_existing())
        .await
        .unwrap();

    let mut written = HashSet::new();
    for task in &report.persisted {
        if let Some(parent) = &task.parent_uid {
            assert!(written.contains(parent), "{} written before its parent", task.uid);
        }
        written.insert(task.uid.clone());
    }
    assert_eq!(report.persisted.len(), 5);
}

#[tokio::test]
async fn test_task_nested_and_top_level_is_written_once() {
    // id 2 shows up as a child of 1 and later on its own.
    let export = parse_export(
        r#"[{"id":1,"collectionName":"W","hasSubTasks":true,"subTasks":[{"id":2}]},
            {"id":2,"collectionName":"W"},
            {"id":3,"collectionName":"W","hasSubTasks":true,"subTasks":[{"id":1}]}]"#,
    )
    .unwrap();
    let store = MemoryStore::new();
    let ids = SequentialUids::new("t");
    let mut decider = no_prompt;
    let report = migrate(&export, &store, &mut decider, &ids, new_and_existing())
        .await
        .unwrap();

    assert_eq!(report.migrated, 3);
    assert_eq!(report.duplicates, 2);
    assert_eq!(store.tasks().len(), 3);
}

#[tokio::test]
async fn test_skipped_list_leaves_children_unseen() {
    let export = parse_export(
        r#"[{"id":1,"collectionName":"Home","hasSubTasks":true,"subTasks":[{"id":2}]},
            {"id":3,"collectionName":"Work","hasSubTasks":true,"subTasks":[{"id":2}]}]"#,
    )
    .unwrap();
    let store = MemoryStore::with_lists(&["Home"]);
    let ids = SequentialUids::new("t");
    let mut decider = no_prompt;
    let report = migrate(
        &export,
        &store,
        &mut decider,
        &ids,
        MigrationOptions {
            lists: ListPolicy::AvoidExisting,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(report.skipped_by_list, 2);
    assert!(store.tasks_in("Home").is_empty());
    // Child 2 was never marked seen under the skipped list, so it lands in Work.
    let work = store.tasks_in("Work");
    assert_eq!(work.len(), 2);
    assert_eq!(report.duplicates, 0);
}

#[tokio::test]
async fn test_one_lookup_and_decision_per_list_name() {
    let export = parse_export(
        r#"[{"id":1,"collectionName":"Work"},{"id":2,"collectionName":"Work"},
            {"id":3,"collectionName":"Home"},{"id":4,"collectionName":"Work"}]"#,
    )
    .unwrap();
    let store = MemoryStore::new();
    let ids = SequentialUids::new("t");
    let mut asked = Vec::new();
    let mut decider = |name: &str, _: bool| {
        asked.push(name.to_string());
        ListAnswer::Create
    };
    migrate(
        &export,
        &store,
        &mut decider,
        &ids,
        MigrationOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(asked, vec!["Work", "Home"]);
    let lookups = store
        .calls()
        .into_iter()
        .filter(|c| matches!(c, StoreCall::FindList(_) | StoreCall::CreateList(_)))
        .count();
    assert_eq!(lookups, 4);
}

#[tokio::test]
async fn test_reuse_identity_overwrites_on_rerun() {
    let export = parse_export(r#"[{"id":1,"itemId":"abc","title":"Once","collectionName":"W"}]"#)
        .unwrap();
    let store = MemoryStore::new();
    let ids = SequentialUids::new("t");
    let mut decider = no_prompt;

    for _ in 0..2 {
        migrate(&export, &store, &mut decider, &ids, new_and_existing())
            .await
            .unwrap();
    }
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].uid, "abc");

    let fresh = MigrationOptions {
        identity: IdentityPolicy::Fresh,
        ..new_and_existing()
    };
    migrate(&export, &store, &mut decider, &ids, fresh)
        .await
        .unwrap();
    assert_eq!(store.tasks().len(), 2);
}

#[tokio::test]
async fn test_absolute_reminder_on_due_date() {
    let raw = format!(
        r#"[{{"id":7,"collectionName":"W","dtstart":1704902400000}}]{}[{{"itemId":7,"minutes":-60}}]"#,
        SEGMENT_DELIMITER
    );
    let export = parse_export(&raw).unwrap();
    let store = MemoryStore::new();
    let ids = SequentialUids::new("t");
    let mut decider = no_prompt;
    migrate(&export, &store, &mut decider, &ids, new_and_existing())
        .await
        .unwrap();

    let todo = store.task("t-1").unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(1, 0, 0)
        .unwrap()
        .and_utc();
    assert_eq!(todo.alarms[0].trigger, AlarmTrigger::Absolute(expected));
}

#[test]
fn test_parse_error_surfaces_before_any_store_call() {
    let raw = format!(r#"[{{"id":1}}]{}[{{"itemId":}}]"#, SEGMENT_DELIMITER);
    assert!(parse_export(&raw).is_err());
    assert!(parse_export(r#"[{"id":1}] trailing"#).is_err());
}
