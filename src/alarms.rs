// File: ./src/alarms.rs
//! Converts exported reminders into VALARMs.
//!
//! A positive `minutes` is an offset before the due date. Zero or a negative
//! value is an absolute time: midnight (UTC) of the due date plus `-minutes`.
//! The absolute form has nothing to anchor to when the task has no due date;
//! such reminders are reported back instead of being converted.
use crate::model::{Alarm, SourceReminder, TriggerAnchor};
use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmSet {
    /// In the order of the input reminders.
    pub alarms: Vec<Alarm>,
    /// Absolute-style reminders on a task without a due date.
    pub unanchored: Vec<SourceReminder>,
}

pub fn synthesize(reminders: &[SourceReminder], due: Option<NaiveDate>) -> AlarmSet {
    let mut set = AlarmSet::default();

    for reminder in reminders {
        if reminder.minutes > 0 {
            let anchor = if due.is_some() {
                TriggerAnchor::Due
            } else {
                TriggerAnchor::Start
            };
            set.alarms.push(Alarm::new_relative(reminder.minutes, anchor));
            continue;
        }

        let Some(day) = due else {
            set.unanchored.push(reminder.clone());
            continue;
        };
        let midnight = day.and_time(chrono::NaiveTime::MIN).and_utc();
        let at = reminder
            .minutes
            .checked_neg()
            .and_then(Duration::try_minutes)
            .and_then(|d| midnight.checked_add_signed(d));
        match at {
            Some(at) => set.alarms.push(Alarm::new_absolute(at)),
            None => set.unanchored.push(reminder.clone()),
        }
    }
    set
}
