// File: ./src/model/source.rs
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// `dtstart` value meaning "no date set".
pub const NO_DATE_SENTINEL: i64 = i64::MAX;

fn no_date() -> i64 {
    NO_DATE_SENTINEL
}

/// Identifier as it appears in the export. The exporter writes these either
/// as JSON numbers or strings, so both are accepted and kept in text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for SourceId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for SourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => SourceId(n.to_string()),
            RawId::Text(s) => SourceId(s),
        })
    }
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<SourceId>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Int(n) => SourceId(n.to_string()),
        RawId::Text(s) => SourceId(s),
    }))
}

/// One task record of the export. Subtasks carry the same shape but are only
/// ever followed one level deep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTask {
    pub id: SourceId,
    #[serde(default, deserialize_with = "optional_id")]
    pub item_id: Option<SourceId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `true` when the task is done.
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub priority: i64,
    /// Milliseconds since the epoch, or [`NO_DATE_SENTINEL`].
    #[serde(default = "no_date")]
    pub dtstart: i64,
    #[serde(default)]
    pub collection_name: String,
    #[serde(default)]
    pub has_sub_tasks: bool,
    #[serde(default)]
    pub sub_tasks: Vec<SourceTask>,
}

impl SourceTask {
    /// Short title for log lines.
    pub fn short_title(&self) -> String {
        self.title.chars().take(8).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReminder {
    pub item_id: SourceId,
    /// Positive: minutes before the due date. Zero or negative: minutes after
    /// midnight of the due date.
    pub minutes: i64,
}
