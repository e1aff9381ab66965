//! Role-based access control (RBAC) checks.
//!
//! Extractors wrap [`AuthUser`] and reject requests whose roles do not
//! meet the requirement, enforcing authorization at the type level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jqlgate_core::error::CoreError;
use jqlgate_core::roles::JIRA_ROLES;

use super::auth::AuthUser;
use crate::auth::session::Identity;
use crate::error::AppError;
use crate::state::AppState;

/// Pass if `roles` is empty or intersects the identity's roles; otherwise
/// 403 Forbidden.
pub fn require_any_role(identity: &Identity, roles: &[&str]) -> Result<(), AppError> {
    if roles.is_empty() || identity.has_any_role(roles) {
        return Ok(());
    }

    tracing::info!(user_id = %identity.id, required = ?roles, "Insufficient role");
    Err(AppError::Core(CoreError::Forbidden(
        "Insufficient permissions to access this resource".into(),
    )))
}

/// Requires a role allowed to use the Jira proxy (`user` or `admin`).
///
/// ```ignore
/// async fn proxy(RequireMember(identity): RequireMember) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireMember(pub Identity);

impl FromRequestParts<AppState> for RequireMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        require_any_role(&identity, JIRA_ROLES)?;
        Ok(RequireMember(identity))
    }
}
