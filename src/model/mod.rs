// File: ./src/model/mod.rs
pub mod adapter;
pub mod item;
pub mod source;

pub use item::{Alarm, AlarmTrigger, CalendarListEntry, TaskStatus, Todo, TriggerAnchor};
pub use source::{NO_DATE_SENTINEL, SourceId, SourceReminder, SourceTask};
