// File: ./src/model/adapter.rs
use crate::model::item::{Alarm, AlarmTrigger, TaskStatus, Todo, TriggerAnchor};
use chrono::Utc;
use icalendar::{Calendar, Component, Property, TodoStatus};

pub const VTODO_CONTENT_TYPE: &str = "text/calendar; charset=utf-8; component=VTODO";

fn format_iso_duration(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let mins = minutes.unsigned_abs();
    if mins == 0 {
        "PT0M".to_string()
    } else if mins.is_multiple_of(24 * 60) {
        format!("{}P{}D", sign, mins / (24 * 60))
    } else if mins.is_multiple_of(60) {
        format!("{}PT{}H", sign, mins / 60)
    } else {
        format!("{}PT{}M", sign, mins)
    }
}

fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
}

impl Alarm {
    /// The `TRIGGER` content line for this alarm.
    pub fn trigger_line(&self) -> String {
        match &self.trigger {
            AlarmTrigger::Relative {
                minutes,
                anchor: TriggerAnchor::Due,
            } => format!("TRIGGER;RELATED=END:{}", format_iso_duration(*minutes)),
            AlarmTrigger::Relative {
                minutes,
                anchor: TriggerAnchor::Start,
            } => format!("TRIGGER:{}", format_iso_duration(*minutes)),
            AlarmTrigger::Absolute(dt) => format!(
                "TRIGGER;VALUE=DATE-TIME:{}",
                dt.format("%Y%m%dT%H%M%SZ")
            ),
        }
    }

    pub fn to_valarm(&self) -> String {
        let description = self.description.as_deref().unwrap_or("Reminder");
        format!(
            "BEGIN:VALARM\r\nACTION:{}\r\nDESCRIPTION:{}\r\n{}\r\nEND:VALARM\r\n",
            self.action,
            escape_text(description),
            self.trigger_line()
        )
    }
}

/// Inserts VALARM blocks right before the last `END:VTODO` of `ics`.
/// Returns `None` when the payload holds no VTODO.
pub fn inject_alarms(ics: &str, alarms: &[Alarm]) -> Option<String> {
    let idx = ics.rfind("END:VTODO")?;
    let (start, end) = ics.split_at(idx);
    let mut buffer = String::with_capacity(ics.len() + alarms.len() * 120);
    buffer.push_str(start);
    if !start.ends_with('\n') {
        buffer.push_str("\r\n");
    }
    for alarm in alarms {
        buffer.push_str(&alarm.to_valarm());
    }
    buffer.push_str(end);
    Some(buffer)
}

impl Todo {
    pub fn to_ics(&self) -> String {
        let mut todo = icalendar::Todo::new();
        todo.uid(&self.uid);
        todo.summary(&self.summary);
        if !self.description.is_empty() {
            todo.description(&self.description);
        }
        todo.timestamp(Utc::now());

        match self.status {
            TaskStatus::NeedsAction => todo.status(TodoStatus::NeedsAction),
            TaskStatus::Completed => todo.status(TodoStatus::Completed),
        };

        // Written verbatim, negative values included.
        todo.add_property("PRIORITY", self.priority.to_string());

        if let Some(day) = self.due {
            let mut prop = Property::new("DUE", day.format("%Y%m%d").to_string());
            prop.add_parameter("VALUE", "DATE");
            todo.append_property(prop);
        }

        if let Some(p_uid) = &self.parent_uid {
            let prop = Property::new("RELATED-TO", p_uid.as_str());
            todo.append_multi_property(prop);
        }

        let mut calendar = Calendar::new();
        calendar.push(todo);
        let ics = calendar.to_string();

        if self.alarms.is_empty() {
            return ics;
        }
        inject_alarms(&ics, &self.alarms).unwrap_or(ics)
    }
}
