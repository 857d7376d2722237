// File: ./src/reminders.rs
// Groups exported reminders by the task they belong to.
use crate::model::{SourceId, SourceReminder, SourceTask};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ReminderIndex {
    by_task: HashMap<SourceId, Vec<SourceReminder>>,
}

impl ReminderIndex {
    /// Builds the index in one pass; per-task order follows the export.
    pub fn build(reminders: &[SourceReminder]) -> Self {
        let mut by_task: HashMap<SourceId, Vec<SourceReminder>> = HashMap::new();
        for reminder in reminders {
            by_task
                .entry(reminder.item_id.clone())
                .or_default()
                .push(reminder.clone());
        }
        Self { by_task }
    }

    pub fn get(&self, id: &SourceId) -> &[SourceReminder] {
        self.by_task.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reminders for `task`: looked up by its `id`, then by its `itemId`.
    pub fn for_task(&self, task: &SourceTask) -> &[SourceReminder] {
        let by_id = self.get(&task.id);
        if !by_id.is_empty() {
            return by_id;
        }
        match &task.item_id {
            Some(item_id) if *item_id != task.id => self.get(item_id),
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.by_task.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_task.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rem(id: i64, minutes: i64) -> SourceReminder {
        SourceReminder {
            item_id: SourceId::from(id),
            minutes,
        }
    }

    #[test]
    fn test_groups_and_keeps_order() {
        let index = ReminderIndex::build(&[rem(1, 30), rem(2, 5), rem(1, -60), rem(1, 10)]);
        let minutes: Vec<_> = index.get(&SourceId::from(1)).iter().map(|r| r.minutes).collect();
        assert_eq!(minutes, vec![30, -60, 10]);
        assert_eq!(index.get(&SourceId::from(2)).len(), 1);
        assert!(index.get(&SourceId::from(3)).is_empty());
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_for_task_falls_back_to_item_id() {
        let index = ReminderIndex::build(&[SourceReminder {
            item_id: SourceId::from("ext-9"),
            minutes: 15,
        }]);
        let mut task: SourceTask = serde_json::from_str(r#"{"id": 9}"#).unwrap();
        assert!(index.for_task(&task).is_empty());

        task.item_id = Some(SourceId::from("ext-9"));
        assert_eq!(index.for_task(&task).len(), 1);
    }

    #[test]
    fn test_empty_index() {
        let index = ReminderIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }
}
