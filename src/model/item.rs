// File: ./src/model/item.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A task list (calendar collection) on the destination server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarListEntry {
    pub name: String,
    pub href: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum TaskStatus {
    NeedsAction,
    Completed,
}

impl TaskStatus {
    pub fn from_done(done: bool) -> Self {
        if done { Self::Completed } else { Self::NeedsAction }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

// --- ALARMS ---

/// What a relative trigger is measured from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum TriggerAnchor {
    /// The task's DUE (RELATED=END for a VTODO).
    Due,
    /// The start of the task (the RFC 5545 default).
    Start,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum AlarmTrigger {
    /// Signed offset in minutes; negative means "before".
    Relative { minutes: i64, anchor: TriggerAnchor },
    Absolute(DateTime<Utc>),
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub action: String, // always DISPLAY
    pub trigger: AlarmTrigger,
    pub description: Option<String>,
}

impl Alarm {
    pub fn new_relative(minutes_before: i64, anchor: TriggerAnchor) -> Self {
        Self {
            action: "DISPLAY".to_string(),
            trigger: AlarmTrigger::Relative {
                minutes: -minutes_before,
                anchor,
            },
            description: None,
        }
    }

    pub fn new_absolute(dt: DateTime<Utc>) -> Self {
        Self {
            action: "DISPLAY".to_string(),
            trigger: AlarmTrigger::Absolute(dt),
            description: None,
        }
    }
}

/// A VTODO as it will be written to the destination list.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub status: TaskStatus,
    /// 0-9 scale, lower is more urgent. May go negative for very high source
    /// priorities; that value is written as-is.
    pub priority: i64,
    pub due: Option<NaiveDate>,
    pub parent_uid: Option<String>,
    #[serde(default)]
    pub alarms: Vec<Alarm>,
}

impl Todo {
    pub fn new(uid: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            summary: summary.into(),
            description: String::new(),
            status: TaskStatus::NeedsAction,
            priority: 0,
            due: None,
            parent_uid: None,
            alarms: Vec::new(),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_uid.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_alarm_is_negative_before() {
        let a = Alarm::new_relative(30, TriggerAnchor::Due);
        assert_eq!(a.action, "DISPLAY");
        assert_eq!(
            a.trigger,
            AlarmTrigger::Relative {
                minutes: -30,
                anchor: TriggerAnchor::Due
            }
        );
    }

    #[test]
    fn test_status_from_done() {
        assert_eq!(TaskStatus::from_done(true), TaskStatus::Completed);
        assert!(!TaskStatus::from_done(false).is_done());
    }
}
