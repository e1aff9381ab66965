//! Bearer-token authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jqlgate_core::error::{AuthFailure, CoreError};

use crate::auth::session::Identity;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a Bearer token in the `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires authentication:
///
/// ```ignore
/// async fn my_handler(AuthUser(identity): AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %identity.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
///
/// Rejections: no token → 401 `TOKEN_REQUIRED`, expired → 401
/// `TOKEN_EXPIRED`, anything else → 403 `INVALID_TOKEN`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// The token from `Authorization: Bearer <token>`, if present.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            AppError::Core(CoreError::unauthorized(
                AuthFailure::TokenRequired,
                "Access token required. Log in to continue.",
            ))
        })?;

        let identity = state.sessions.verify(token)?;

        tracing::info!(
            user_id = %identity.id,
            email = %identity.email,
            method = %parts.method,
            path = %parts.uri.path(),
            "Authenticated request"
        );

        Ok(AuthUser(identity))
    }
}

/// Optional authentication: yields `None` instead of rejecting when the
/// token is missing, expired, or invalid.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Identity>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = bearer_token(parts).and_then(|token| state.sessions.verify(token).ok());
        Ok(MaybeAuthUser(identity))
    }
}
