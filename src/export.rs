// File: ./src/export.rs
//! Reads a BC2 Tasks export.
//!
//! The payload is one JSON array of tasks, optionally followed by
//! [`SEGMENT_DELIMITER`] and a JSON array of reminders. The exporter is known
//! to double or triple the `,` between reminder records; such runs are folded
//! back into one separator before the reminder segment is parsed.

use crate::error::ParseError;
use crate::model::{SourceReminder, SourceTask};

/// Literal marker between the task and the reminder segment.
pub const SEGMENT_DELIMITER: &str = "@@REMINDERS@@";

/// Character the exporter repeats by mistake inside the reminder segment.
pub const REPAIR_CHAR: char = ',';

/// Longest run of [`REPAIR_CHAR`] that is still treated as the known defect.
const MAX_REPAIR_RUN: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Export {
    pub tasks: Vec<SourceTask>,
    pub reminders: Vec<SourceReminder>,
}

/// Folds runs of 2..=3 separators (outside JSON strings) into one.
/// Longer runs are left alone and will fail to parse.
pub fn repair_separators(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = segment.chars().peekable();

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
            out.push(c);
            continue;
        }
        if c != REPAIR_CHAR {
            out.push(c);
            continue;
        }

        let mut run = 1;
        while chars.peek() == Some(&REPAIR_CHAR) {
            chars.next();
            run += 1;
        }
        let keep = if run <= MAX_REPAIR_RUN { 1 } else { run };
        out.extend(std::iter::repeat_n(REPAIR_CHAR, keep));
    }
    out
}

pub fn parse_export(raw: &str) -> Result<Export, ParseError> {
    let raw = raw.trim_start_matches('\u{feff}');

    let mut stream = serde_json::Deserializer::from_str(raw).into_iter::<Vec<SourceTask>>();
    let tasks = match stream.next() {
        Some(Ok(tasks)) => tasks,
        Some(Err(e)) => return Err(ParseError::Tasks(e)),
        // Empty input: let serde produce the EOF error.
        None => serde_json::from_str::<Vec<SourceTask>>(raw).map_err(ParseError::Tasks)?,
    };
    let rest = raw[stream.byte_offset()..].trim();

    if rest.is_empty() {
        return Ok(Export {
            tasks,
            reminders: Vec::new(),
        });
    }

    let Some(segment) = rest.strip_prefix(SEGMENT_DELIMITER) else {
        return Err(ParseError::TrailingData {
            offset: raw.len() - raw[stream.byte_offset()..].trim_start().len(),
        });
    };

    let segment = segment.trim();
    let reminders = if segment.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&repair_separators(segment)).map_err(ParseError::Reminders)?
    };

    log::debug!(
        "Parsed export: {} top-level tasks, {} reminders",
        tasks.len(),
        reminders.len()
    );
    Ok(Export { tasks, reminders })
}
