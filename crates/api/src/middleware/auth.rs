//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use opsdesk_core::access::Caller;
use opsdesk_core::error::CoreError;
use opsdesk_core::roles::{Role, USER_STATUS_ACTIVE};
use opsdesk_core::types::DbId;
use opsdesk_db::repositories::UserRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// The token only identifies the user; role and account status come from the
/// current user record, so a deactivation or role change applies to tokens
/// already in circulation.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    pub role: Role,
}

impl AuthUser {
    /// The caller as seen by the record-level access rules.
    pub fn caller(&self) -> Caller {
        Caller::new(self.user_id, self.role)
    }
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

/// Resolve a raw token to an active user. Shared by the header extractor and
/// the WebSocket upgrade, which carries the token in the query string.
pub async fn resolve_token(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| unauthorized("Invalid or expired token"))?;

    let user = UserRepo::find_by_id(&state.pool, claims.sub)
        .await?
        .ok_or_else(|| unauthorized("User no longer exists"))?;

    if user.status != USER_STATUS_ACTIVE {
        return Err(unauthorized("Account is deactivated"));
    }

    let role: Role = user.role.parse().map_err(|_| {
        tracing::error!(user_id = user.id, role = %user.role, "Stored role is not recognised");
        unauthorized("Account has no valid role")
    })?;

    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?;

        resolve_token(state, token).await
    }
}
