// File: ./src/migrate.rs
//! Walks the export and writes it to the destination store.
//!
//! Processing is strictly sequential: a child is written only after its
//! parent's write returned the uid the child links to. Nothing is rolled back;
//! a store failure ends the run with earlier writes left in place.
use crate::alarms::synthesize;
use crate::error::MigrateError;
use crate::export::Export;
use crate::lists::{ListDecider, ListPolicy, ListResolver};
use crate::model::{CalendarListEntry, SourceId, SourceTask};
use crate::reminders::ReminderIndex;
use crate::store::CalendarStore;
use crate::transform::{IdentityPolicy, UidGenerator, transform};
use std::collections::HashSet;

const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationOptions {
    pub lists: ListPolicy,
    pub identity: IdentityPolicy,
    /// Halt as soon as the top-level counter reaches this value.
    pub debug_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratedTask {
    pub source_id: SourceId,
    pub uid: String,
    pub parent_uid: Option<String>,
    pub list: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Top-level tasks handled, skipped ones included.
    pub visited: usize,
    pub migrated: usize,
    pub duplicates: usize,
    /// Tasks (children included) left out because their list was skipped.
    pub skipped_by_list: usize,
    pub alarms_attached: usize,
    pub unanchored_reminders: usize,
    pub halted_at_limit: bool,
    /// Every write, in the order it happened.
    pub persisted: Vec<MigratedTask>,
}

/// State owned by a single run.
#[derive(Debug, Default)]
pub struct RunContext {
    seen: HashSet<SourceId>,
    lists: ListResolver,
    counter: usize,
    report: MigrationReport,
}

impl RunContext {
    pub fn has_seen(&self, id: &SourceId) -> bool {
        self.seen.contains(id)
    }

    pub fn report(&self) -> &MigrationReport {
        &self.report
    }
}

pub struct Migrator<'a, S, D: ?Sized> {
    store: &'a S,
    decider: &'a mut D,
    ids: &'a dyn UidGenerator,
    options: MigrationOptions,
}

impl<'a, S, D> Migrator<'a, S, D>
where
    S: CalendarStore,
    D: ListDecider + ?Sized,
{
    pub fn new(
        store: &'a S,
        decider: &'a mut D,
        ids: &'a dyn UidGenerator,
        options: MigrationOptions,
    ) -> Self {
        Self {
            store,
            decider,
            ids,
            options,
        }
    }

    pub async fn run(&mut self, export: &Export) -> Result<MigrationReport, MigrateError> {
        let index = ReminderIndex::build(&export.reminders);
        if !index.is_empty() {
            log::debug!("{} reminders indexed", index.len());
        }
        let mut ctx = RunContext::default();

        for task in &export.tasks {
            ctx.counter += 1;
            if ctx.counter.is_multiple_of(PROGRESS_EVERY) {
                log::info!("completed {} so far", ctx.counter);
            }
            if let Some(limit) = self.options.debug_limit
                && ctx.counter >= limit
            {
                log::warn!("Debug limit {} reached, stopping", limit);
                ctx.report.halted_at_limit = true;
                break;
            }
            ctx.report.visited += 1;
            self.migrate_top_level(&mut ctx, task, &index).await?;
        }

        let report = ctx.report();
        log::info!(
            "migrated {} tasks ({} top-level visited, {} duplicates, {} skipped by list, {} alarms)",
            report.migrated,
            report.visited,
            report.duplicates,
            report.skipped_by_list,
            report.alarms_attached
        );
        Ok(ctx.report)
    }

    async fn migrate_top_level(
        &mut self,
        ctx: &mut RunContext,
        task: &SourceTask,
        index: &ReminderIndex,
    ) -> Result<(), MigrateError> {
        let resolution = ctx
            .lists
            .resolve(
                &task.collection_name,
                self.options.lists,
                self.store,
                &mut *self.decider,
            )
            .await?;

        let Some(list) = resolution.target() else {
            let skipped = 1 + if task.has_sub_tasks {
                task.sub_tasks.len()
            } else {
                0
            };
            log::debug!(
                "List '{}' skipped, leaving out {} ({} task(s))",
                task.collection_name,
                task.short_title(),
                skipped
            );
            ctx.report.skipped_by_list += skipped;
            return Ok(());
        };

        let Some(parent_uid) = self.migrate_one(ctx, task, list, None, index).await? else {
            return Ok(());
        };

        if task.has_sub_tasks {
            // Children are assumed to live in their parent's list.
            for child in &task.sub_tasks {
                self.migrate_one(ctx, child, list, Some(&parent_uid), index)
                    .await?;
            }
        }
        Ok(())
    }

    /// Returns the issued uid, or `None` when the task was already migrated.
    async fn migrate_one(
        &mut self,
        ctx: &mut RunContext,
        task: &SourceTask,
        list: &CalendarListEntry,
        parent_uid: Option<&str>,
        index: &ReminderIndex,
    ) -> Result<Option<String>, MigrateError> {
        if ctx.has_seen(&task.id) {
            log::info!("skipping double: {}", task.short_title());
            ctx.report.duplicates += 1;
            return Ok(None);
        }
        ctx.seen.insert(task.id.clone());

        let todo = transform(task, parent_uid, self.options.identity, self.ids);
        log::info!("migrating {}...", task.short_title());
        if todo.is_top_level() {
            log::debug!("this_uid: {}, done: {}", todo.uid, todo.status.is_done());
        } else {
            log::debug!(
                "this_uid: {}, parent_uid: {:?}, done: {}",
                todo.uid,
                todo.parent_uid,
                todo.status.is_done()
            );
        }

        let persisted = self.store.upsert_task(list, &todo).await?;

        let set = synthesize(index.for_task(task), todo.due);
        for reminder in &set.unanchored {
            log::warn!(
                "Reminder ({} min) on '{}' needs a due date, not migrated",
                reminder.minutes,
                task.short_title()
            );
        }
        ctx.report.unanchored_reminders += set.unanchored.len();

        if !set.alarms.is_empty() {
            let alarms: Vec<_> = set
                .alarms
                .into_iter()
                .map(|mut a| {
                    a.description = Some(todo.summary.clone());
                    a
                })
                .collect();
            self.store.attach_alarms(&persisted, &alarms).await?;
            ctx.report.alarms_attached += alarms.len();
        }

        ctx.report.migrated += 1;
        ctx.report.persisted.push(MigratedTask {
            source_id: task.id.clone(),
            uid: persisted.uid.clone(),
            parent_uid: todo.parent_uid.clone(),
            list: list.name.clone(),
        });
        Ok(Some(persisted.uid))
    }
}

/// Runs one migration with a fresh [`RunContext`].
pub async fn migrate<S, D>(
    export: &Export,
    store: &S,
    decider: &mut D,
    ids: &dyn UidGenerator,
    options: MigrationOptions,
) -> Result<MigrationReport, MigrateError>
where
    S: CalendarStore,
    D: ListDecider + ?Sized,
{
    Migrator::new(store, decider, ids, options).run(export).await
}
