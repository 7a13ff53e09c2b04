//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement, so authorization is visible in the handler
//! signature.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use opsdesk_core::error::CoreError;
use opsdesk_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn require(
    parts: &mut Parts,
    state: &AppState,
    allowed: fn(Role) -> bool,
    message: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !allowed(user.role) {
        return Err(AppError::Core(CoreError::Forbidden(message.into())));
    }
    Ok(user)
}

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(parts, state, Role::is_admin, "Admin role required")
            .await
            .map(RequireAdmin)
    }
}

/// Requires `manager` or `admin`.
pub struct RequireManager(pub AuthUser);

impl FromRequestParts<AppState> for RequireManager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(
            parts,
            state,
            Role::is_manager_or_admin,
            "Manager or Admin role required",
        )
        .await
        .map(RequireManager)
    }
}

/// Requires `finance` or `admin`.
pub struct RequireFinance(pub AuthUser);

impl FromRequestParts<AppState> for RequireFinance {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(
            parts,
            state,
            Role::is_finance_or_admin,
            "Finance or Admin role required",
        )
        .await
        .map(RequireFinance)
    }
}

/// Requires any authenticated user (any valid role).
///
/// Equivalent to [`AuthUser`] but self-documenting in route handlers.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        AuthUser::from_request_parts(parts, state)
            .await
            .map(RequireAuth)
    }
}
