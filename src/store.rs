// File: ./src/store.rs
//! The destination store as seen by the migration driver.
//!
//! Persisting a task and attaching its alarms are two separate round trips:
//! alarms are added to the task as the store holds it after the upsert.
use crate::error::StoreError;
use crate::model::{Alarm, CalendarListEntry, Todo};
use std::sync::Mutex;

/// Handle to a task the store has accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTask {
    pub uid: String,
    pub list_href: String,
    pub href: String,
    pub etag: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait CalendarStore {
    /// `Ok(None)` when no list carries that name.
    async fn find_list(&self, name: &str) -> Result<Option<CalendarListEntry>, StoreError>;

    async fn create_list(&self, name: &str) -> Result<CalendarListEntry, StoreError>;

    /// Creates the task, or overwrites it in place when its uid already exists.
    async fn upsert_task(
        &self,
        list: &CalendarListEntry,
        todo: &Todo,
    ) -> Result<PersistedTask, StoreError>;

    async fn attach_alarms(&self, task: &PersistedTask, alarms: &[Alarm])
    -> Result<(), StoreError>;
}

/// One call made against a [`MemoryStore`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    FindList(String),
    CreateList(String),
    Upsert { list: String, uid: String },
    AttachAlarms { uid: String, count: usize },
}

#[derive(Debug, Default)]
struct MemoryState {
    lists: Vec<CalendarListEntry>,
    /// (list href, task) in first-write order.
    tasks: Vec<(String, Todo)>,
    calls: Vec<StoreCall>,
}

/// In-process store used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with the given lists already present.
    pub fn with_lists(names: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            for name in names {
                let entry = Self::entry_for(name);
                state.lists.push(entry);
            }
        }
        store
    }

    fn entry_for(name: &str) -> CalendarListEntry {
        CalendarListEntry {
            name: name.to_string(),
            href: format!("memory://{}/", name),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn lists(&self) -> Vec<CalendarListEntry> {
        self.lock().lists.clone()
    }

    pub fn tasks(&self) -> Vec<Todo> {
        self.lock().tasks.iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn tasks_in(&self, list_name: &str) -> Vec<Todo> {
        let href = Self::entry_for(list_name).href;
        self.lock()
            .tasks
            .iter()
            .filter(|(h, _)| *h == href)
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn task(&self, uid: &str) -> Option<Todo> {
        self.lock()
            .tasks
            .iter()
            .find(|(_, t)| t.uid == uid)
            .map(|(_, t)| t.clone())
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }
}

impl CalendarStore for MemoryStore {
    async fn find_list(&self, name: &str) -> Result<Option<CalendarListEntry>, StoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::FindList(name.to_string()));
        Ok(state.lists.iter().find(|l| l.name == name).cloned())
    }

    async fn create_list(&self, name: &str) -> Result<CalendarListEntry, StoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::CreateList(name.to_string()));
        let entry = Self::entry_for(name);
        state.lists.push(entry.clone());
        Ok(entry)
    }

    async fn upsert_task(
        &self,
        list: &CalendarListEntry,
        todo: &Todo,
    ) -> Result<PersistedTask, StoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::Upsert {
            list: list.name.clone(),
            uid: todo.uid.clone(),
        });

        let mut stored = todo.clone();
        stored.alarms.clear();
        if let Some(idx) = state.tasks.iter().position(|(_, t)| t.uid == todo.uid) {
            state.tasks[idx] = (list.href.clone(), stored);
        } else {
            state.tasks.push((list.href.clone(), stored));
        }

        Ok(PersistedTask {
            uid: todo.uid.clone(),
            list_href: list.href.clone(),
            href: format!("{}{}.ics", list.href, todo.uid),
            etag: None,
        })
    }

    async fn attach_alarms(
        &self,
        task: &PersistedTask,
        alarms: &[Alarm],
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::AttachAlarms {
            uid: task.uid.clone(),
            count: alarms.len(),
        });
        let (_, stored) = state
            .tasks
            .iter_mut()
            .find(|(_, t)| t.uid == task.uid)
            .ok_or_else(|| StoreError::MissingTask {
                uid: task.uid.clone(),
            })?;
        stored.alarms.extend_from_slice(alarms);
        Ok(())
    }
}
