//! Pure decisions taken by the lifecycle handlers: which timestamps a status
//! change stamps, which event a task update emits, and derived project
//! progress.

use crate::diff::FieldChange;
use crate::status::TaskStatus;
use crate::types::{DbId, Timestamp};

/// Timestamps to write alongside a task status change. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStamps {
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

/// Stamps for a task moving from `from` to `to`.
///
/// Leaving `pending` for `in-progress` stamps the start once; entering
/// `completed` from any other state stamps the completion time.
pub fn task_stamps(
    from: TaskStatus,
    to: TaskStatus,
    already_started: Option<Timestamp>,
    now: Timestamp,
) -> TaskStamps {
    let started_at = (from == TaskStatus::Pending
        && to == TaskStatus::InProgress
        && already_started.is_none())
    .then_some(now);
    let completed_at = (to == TaskStatus::Completed && from != TaskStatus::Completed).then_some(now);
    TaskStamps {
        started_at,
        completed_at,
    }
}

/// The one event a task update emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskUpdateKind {
    /// The assignee changed. Suppresses the generic update for the same
    /// request.
    Reassigned,
    /// Other tracked fields changed.
    Updated,
}

/// Decide which event, if any, a task update emits.
///
/// Who gets notified is decided downstream; the acting user is filtered out
/// there so the activity log still records self-made changes.
pub fn task_update_kind(
    changes: &[FieldChange],
    assignee_before: Option<DbId>,
    assignee_after: Option<DbId>,
) -> Option<TaskUpdateKind> {
    if assignee_before != assignee_after {
        Some(TaskUpdateKind::Reassigned)
    } else if changes.is_empty() {
        None
    } else {
        Some(TaskUpdateKind::Updated)
    }
}

/// Percentage of tasks that are completed or further along, rounded.
pub fn completion_percentage(statuses: &[TaskStatus]) -> u8 {
    if statuses.is_empty() {
        return 0;
    }
    let done = statuses.iter().filter(|s| s.is_done()).count();
    ((done as f64 / statuses.len() as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::diff::{changed_fields, TASK_TRACKED_FIELDS};

    fn now() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn starting_a_pending_task_stamps_start_once() {
        let stamps = task_stamps(TaskStatus::Pending, TaskStatus::InProgress, None, now());
        assert_eq!(stamps.started_at, Some(now()));
        assert_eq!(stamps.completed_at, None);

        let again = task_stamps(TaskStatus::Pending, TaskStatus::InProgress, Some(now()), now());
        assert_eq!(again.started_at, None);
    }

    #[test]
    fn completing_stamps_completion() {
        let stamps = task_stamps(TaskStatus::UnderReview, TaskStatus::Completed, None, now());
        assert_eq!(stamps.completed_at, Some(now()));
        assert_eq!(stamps.started_at, None);
    }

    #[test]
    fn reasserting_completed_does_not_restamp() {
        let stamps = task_stamps(TaskStatus::Completed, TaskStatus::Completed, None, now());
        assert_eq!(stamps, TaskStamps::default());
    }

    #[test]
    fn reassignment_wins_over_field_changes() {
        let before = json!({"assignedTo": 1, "priority": "low"});
        let after = json!({"assignedTo": 2, "priority": "high"});
        let changes = changed_fields(&before, &after, TASK_TRACKED_FIELDS);
        assert_eq!(changes.len(), 2);

        assert_eq!(
            task_update_kind(&changes, Some(1), Some(2)),
            Some(TaskUpdateKind::Reassigned)
        );
    }

    #[test]
    fn field_changes_without_reassignment_are_updates() {
        let before = json!({"assignedTo": 5, "title": "a"});
        let after = json!({"assignedTo": 5, "title": "b"});
        let changes = changed_fields(&before, &after, TASK_TRACKED_FIELDS);

        assert_eq!(
            task_update_kind(&changes, Some(5), Some(5)),
            Some(TaskUpdateKind::Updated)
        );
    }

    #[test]
    fn no_changes_no_event() {
        assert_eq!(task_update_kind(&[], Some(5), Some(5)), None);
        assert_eq!(task_update_kind(&[], None, None), None);
    }

    #[test]
    fn unassigning_counts_as_reassignment() {
        assert_matches!(
            task_update_kind(&[], Some(3), None),
            Some(TaskUpdateKind::Reassigned)
        );
    }

    #[test]
    fn completion_percentage_rounds() {
        use TaskStatus::*;
        assert_eq!(completion_percentage(&[]), 0);
        assert_eq!(completion_percentage(&[Completed, Pending, InProgress]), 33);
        assert_eq!(completion_percentage(&[Completed, Invoiced]), 100);
        assert_eq!(completion_percentage(&[Invoiceable, Pending]), 50);
    }
}
