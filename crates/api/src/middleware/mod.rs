//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Resolves the JWT Bearer token to an active user.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::RequireManager`] -- Requires `manager` or `admin`.
//! - [`rbac::RequireFinance`] -- Requires `finance` or `admin`.
//! - [`rbac::RequireAuth`] -- Requires any authenticated user.
//!
//! Rules that depend on the record itself (assignee, team) live in
//! `opsdesk_core::access` and are checked inside the handlers.

pub mod auth;
pub mod rbac;
