//! Well-known role names and the [`Role`] enum.
//!
//! These must match the `CHECK` constraint on `users.role`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_FINANCE: &str = "finance";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_MANAGER, ROLE_STAFF, ROLE_FINANCE];

/// Caller role resolved from the bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Staff,
    Finance,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Manager => ROLE_MANAGER,
            Role::Staff => ROLE_STAFF,
            Role::Finance => ROLE_FINANCE,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Admins and managers run projects, clients, and task creation.
    pub fn is_manager_or_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Admins and finance staff own invoices and see budgets.
    pub fn is_finance_or_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Finance)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_MANAGER => Ok(Role::Manager),
            ROLE_STAFF => Ok(Role::Staff),
            ROLE_FINANCE => Ok(Role::Finance),
            other => Err(CoreError::Validation(format!(
                "Invalid role '{other}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            ))),
        }
    }
}

pub const USER_STATUS_ACTIVE: &str = "active";
pub const USER_STATUS_INACTIVE: &str = "inactive";

/// Statuses shared by users and clients.
pub const VALID_ACCOUNT_STATUSES: &[&str] = &[USER_STATUS_ACTIVE, USER_STATUS_INACTIVE];

/// Validate a user or client status string.
pub fn validate_account_status(status: &str) -> Result<(), CoreError> {
    if VALID_ACCOUNT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid status '{status}'. Must be one of: {}",
            VALID_ACCOUNT_STATUSES.join(", ")
        )))
    }
}
