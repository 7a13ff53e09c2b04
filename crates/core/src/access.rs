//! Record-level access rules.
//!
//! Role-only checks live in the API extractors; the rules here need the
//! record (assignee, manager, team) to decide.

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// The resolved identity of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: DbId,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: DbId, role: Role) -> Self {
        Self { user_id, role }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Task detail, update, status, time, and comments: admin or the assignee.
pub fn can_access_task(caller: &Caller, assigned_to: Option<DbId>) -> bool {
    caller.role.is_admin() || assigned_to == Some(caller.user_id)
}

pub fn ensure_task_access(caller: &Caller, assigned_to: Option<DbId>) -> Result<(), CoreError> {
    if can_access_task(caller, assigned_to) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Not authorized to access this task".into(),
        ))
    }
}

/// The assignee filter a task listing must apply.
///
/// Admins get whatever they asked for; everyone else is pinned to their own
/// tasks regardless of the requested filter.
pub fn task_list_assignee(caller: &Caller, requested: Option<DbId>) -> Option<DbId> {
    if caller.role.is_admin() {
        requested
    } else {
        Some(caller.user_id)
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

fn is_project_member(caller: &Caller, manager: Option<DbId>, team: &[DbId]) -> bool {
    manager == Some(caller.user_id) || team.contains(&caller.user_id)
}

/// Admins, managers, and finance see every project; staff see the projects
/// they manage or belong to.
pub fn can_view_project(caller: &Caller, manager: Option<DbId>, team: &[DbId]) -> bool {
    caller.role != Role::Staff || is_project_member(caller, manager, team)
}

/// Project update, status, notes, and documents: admin, manager, or a
/// member of the project.
pub fn can_modify_project(caller: &Caller, manager: Option<DbId>, team: &[DbId]) -> bool {
    caller.role.is_manager_or_admin() || is_project_member(caller, manager, team)
}

pub fn ensure_project_view(
    caller: &Caller,
    manager: Option<DbId>,
    team: &[DbId],
) -> Result<(), CoreError> {
    if can_view_project(caller, manager, team) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Not authorized to view this project".into(),
        ))
    }
}

pub fn ensure_project_modify(
    caller: &Caller,
    manager: Option<DbId>,
    team: &[DbId],
) -> Result<(), CoreError> {
    if can_modify_project(caller, manager, team) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Not authorized to update this project".into(),
        ))
    }
}

/// Member filter for project listings (`None` = unrestricted).
pub fn project_list_member(caller: &Caller) -> Option<DbId> {
    (caller.role == Role::Staff).then_some(caller.user_id)
}

/// Whether the caller may see a project's budget.
pub fn sees_budget(caller: &Caller) -> bool {
    caller.role.is_finance_or_admin()
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// User detail is readable by admins and by the user themself.
pub fn ensure_self_or_admin(caller: &Caller, user_id: DbId) -> Result<(), CoreError> {
    if caller.role.is_admin() || caller.user_id == user_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Not authorized to view this user".into(),
        ))
    }
}
