// File: ./src/transform.rs
//! Turns one exported task into the VTODO that will be written.
use crate::model::{NO_DATE_SENTINEL, SourceTask, TaskStatus, Todo};
use chrono::{DateTime, NaiveDate};
use std::cell::Cell;
use strum::{Display, EnumString};
use uuid::Uuid;

/// Where a migrated task's uid comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum IdentityPolicy {
    /// Reuse the export's `itemId`, so a re-run overwrites instead of duplicating.
    /// Tasks without an `itemId` get a generated uid.
    #[default]
    Reuse,
    /// Always generate a new uid.
    Fresh,
}

pub trait UidGenerator {
    fn next_uid(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl UidGenerator for UuidGenerator {
    fn next_uid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Predictable uids (`<prefix>-1`, `<prefix>-2`, ...).
#[derive(Debug, Default)]
pub struct SequentialUids {
    prefix: String,
    next: Cell<u64>,
}

impl SequentialUids {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: Cell::new(1),
        }
    }
}

impl UidGenerator for SequentialUids {
    fn next_uid(&self) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}-{}", self.prefix, n)
    }
}

/// 7 - 2 * max(p, 0), unclamped: source priorities above 3 map below zero.
pub fn map_priority(priority: i64) -> i64 {
    7i64.saturating_sub(priority.max(0).saturating_mul(2))
}

/// Calendar day of `dtstart` in UTC, or `None` for the sentinel (and for
/// values chrono cannot represent).
pub fn map_due(dtstart: i64) -> Option<NaiveDate> {
    if dtstart == NO_DATE_SENTINEL {
        return None;
    }
    let secs = dtstart.div_euclid(1000);
    let due = DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive());
    if due.is_none() {
        log::warn!("dtstart {} is out of range, migrating without a due date", dtstart);
    }
    due
}

pub fn transform(
    task: &SourceTask,
    parent_uid: Option<&str>,
    identity: IdentityPolicy,
    ids: &dyn UidGenerator,
) -> Todo {
    let uid = match (identity, &task.item_id) {
        (IdentityPolicy::Reuse, Some(item_id)) if !item_id.as_str().is_empty() => {
            item_id.to_string()
        }
        _ => ids.next_uid(),
    };

    Todo {
        uid,
        summary: task.title.clone(),
        description: task.description.clone(),
        status: TaskStatus::from_done(task.status),
        priority: map_priority(task.priority),
        due: map_due(task.dtstart),
        parent_uid: parent_uid.map(str::to_string),
        alarms: Vec::new(),
    }
}
