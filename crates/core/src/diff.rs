//! Shallow changed-field detection between two JSON snapshots of a record.
//!
//! Both snapshots must come from the same serializer (the stored row before
//! and after the write) so that equal values render identically. Values are
//! compared by their string form, which is how nested objects and arrays are
//! compared too.

use serde::Serialize;
use serde_json::Value;

/// Task fields whose changes are reported to the assignee.
pub const TASK_TRACKED_FIELDS: &[&str] = &[
    "title",
    "description",
    "project",
    "assignedTo",
    "status",
    "priority",
    "dueDate",
    "timeTracking.estimatedHours",
    "tags",
];

/// Project fields recorded in the activity log. `notes` is deliberately
/// absent: it is append-only and stamped on every write that carries it.
pub const PROJECT_TRACKED_FIELDS: &[&str] = &[
    "name",
    "description",
    "client",
    "manager",
    "team",
    "status",
    "budget",
    "startDate",
    "endDate",
];

/// One field whose value differs between snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

impl FieldChange {
    /// `field: old → new`
    pub fn summary(&self) -> String {
        format!("{}: {} → {}", self.field, render(&self.old), render(&self.new))
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Look up a possibly dotted path (`timeTracking.estimatedHours`).
fn lookup(snapshot: &Value, path: &str) -> Value {
    path.split('.')
        .try_fold(snapshot, |value, key| value.get(key))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Collect the tracked fields whose rendered values differ.
///
/// A field missing from a snapshot is treated as `null`.
pub fn changed_fields(before: &Value, after: &Value, tracked: &[&str]) -> Vec<FieldChange> {
    tracked
        .iter()
        .filter_map(|field| {
            let old = lookup(before, field);
            let new = lookup(after, field);
            (render(&old) != render(&new)).then(|| FieldChange {
                field: (*field).to_string(),
                old,
                new,
            })
        })
        .collect()
}

/// Multi-line summary, one `field: old → new` per line.
pub fn summarize(changes: &[FieldChange]) -> String {
    changes
        .iter()
        .map(FieldChange::summary)
        .collect::<Vec<_>>()
        .join("\n")
}
