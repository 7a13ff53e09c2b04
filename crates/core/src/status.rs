//! Status enums and transition tables for tasks, projects, and invoices.
//!
//! Each status type exposes `valid_transitions(from)` and `allowed(from, to)`.
//! Re-asserting the current status is always allowed so that repeated
//! requests are idempotent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

fn unknown_value(kind: &str, value: &str, valid: &[&str]) -> CoreError {
    CoreError::Validation(format!(
        "Invalid {kind} status '{value}'. Must be one of: {}",
        valid.join(", ")
    ))
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    UnderReview,
    Review,
    Completed,
    Invoiceable,
    Invoiced,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 8] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::UnderReview,
        TaskStatus::Review,
        TaskStatus::Completed,
        TaskStatus::Invoiceable,
        TaskStatus::Invoiced,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::UnderReview => "under-review",
            TaskStatus::Review => "review",
            TaskStatus::Completed => "completed",
            TaskStatus::Invoiceable => "invoiceable",
            TaskStatus::Invoiced => "invoiced",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses the status endpoint may move a task to from `self`.
    ///
    /// `invoiced` never appears here: only invoice creation enters it and
    /// only invoice deletion leaves it.
    ///
    /// - `pending`                -> `in-progress`, `cancelled`
    /// - `in-progress`            -> `under-review`, `review`, `completed`, `cancelled`
    /// - `under-review`, `review` -> `completed`, `in-progress`, `cancelled`
    /// - `completed`              -> `invoiceable`, `in-progress`, `cancelled`
    /// - `invoiceable`            -> `completed`, `cancelled`
    /// - `invoiced`, `cancelled`  -> (terminal)
    pub fn valid_transitions(self) -> &'static [TaskStatus] {
        use TaskStatus::*;
        match self {
            Pending => &[InProgress, Cancelled],
            InProgress => &[UnderReview, Review, Completed, Cancelled],
            UnderReview | Review => &[Completed, InProgress, Cancelled],
            Completed => &[Invoiceable, InProgress, Cancelled],
            Invoiceable => &[Completed, Cancelled],
            Invoiced | Cancelled => &[],
        }
    }

    pub fn allowed(from: TaskStatus, to: TaskStatus) -> bool {
        from == to || from.valid_transitions().contains(&to)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Invoiced | TaskStatus::Cancelled)
    }

    /// Whether the invoicing workflow may mark this task invoiced.
    pub fn can_be_invoiced(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Invoiceable)
    }

    /// Counts toward a project's completion percentage.
    pub fn is_done(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Invoiceable | TaskStatus::Invoiced
        )
    }

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.as_str()).collect()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| unknown_value("task", s, &Self::names()))
    }
}

/// Validate a status-endpoint transition for a task.
pub fn validate_task_transition(from: TaskStatus, to: TaskStatus) -> Result<(), CoreError> {
    if to == TaskStatus::Invoiced && from != TaskStatus::Invoiced {
        return Err(CoreError::Validation(
            "Tasks become 'invoiced' only by being added to an invoice".into(),
        ));
    }
    if TaskStatus::allowed(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: "task",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    OnHold,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Planning,
        ProjectStatus::InProgress,
        ProjectStatus::OnHold,
        ProjectStatus::Completed,
        ProjectStatus::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::InProgress => "in-progress",
            ProjectStatus::OnHold => "on-hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }

    /// - `planning`    -> `in-progress`, `on-hold`, `archived`
    /// - `in-progress` -> `on-hold`, `completed`
    /// - `on-hold`     -> `in-progress`, `completed`, `archived`
    /// - `completed`   -> `archived`, `in-progress`
    /// - `archived`    -> (terminal)
    pub fn valid_transitions(self) -> &'static [ProjectStatus] {
        use ProjectStatus::*;
        match self {
            Planning => &[InProgress, OnHold, Archived],
            InProgress => &[OnHold, Completed],
            OnHold => &[InProgress, Completed, Archived],
            Completed => &[Archived, InProgress],
            Archived => &[],
        }
    }

    pub fn allowed(from: ProjectStatus, to: ProjectStatus) -> bool {
        from == to || from.valid_transitions().contains(&to)
    }

    /// Parse either a canonical status or one of the labels used by older
    /// clients of the status endpoint (`Not Started`, `In Progress`,
    /// `Completed`).
    pub fn parse_label(label: &str) -> Result<ProjectStatus, CoreError> {
        match label {
            "Not Started" => Ok(ProjectStatus::Planning),
            "In Progress" => Ok(ProjectStatus::InProgress),
            "Completed" => Ok(ProjectStatus::Completed),
            other => other.parse(),
        }
    }

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.as_str()).collect()
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| unknown_value("project", s, &Self::names()))
    }
}

pub fn validate_project_transition(
    from: ProjectStatus,
    to: ProjectStatus,
) -> Result<(), CoreError> {
    if ProjectStatus::allowed(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: "project",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Invoice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Cancelled,
    Overdue,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Cancelled,
        InvoiceStatus::Overdue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// - `draft`     -> `sent`, `cancelled`
    /// - `sent`      -> `paid`, `overdue`, `cancelled`
    /// - `overdue`   -> `paid`, `sent`, `cancelled`
    /// - `paid`      -> `cancelled`
    /// - `cancelled` -> `draft`
    pub fn valid_transitions(self) -> &'static [InvoiceStatus] {
        use InvoiceStatus::*;
        match self {
            Draft => &[Sent, Cancelled],
            Sent => &[Paid, Overdue, Cancelled],
            Overdue => &[Paid, Sent, Cancelled],
            Paid => &[Cancelled],
            Cancelled => &[Draft],
        }
    }

    pub fn allowed(from: InvoiceStatus, to: InvoiceStatus) -> bool {
        from == to || from.valid_transitions().contains(&to)
    }

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.as_str()).collect()
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| unknown_value("invoice", s, &Self::names()))
    }
}

pub fn validate_invoice_transition(
    from: InvoiceStatus,
    to: InvoiceStatus,
) -> Result<(), CoreError> {
    if InvoiceStatus::allowed(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: "invoice",
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
