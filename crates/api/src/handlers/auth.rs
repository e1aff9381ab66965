//! Handlers for the `/auth` resource (register, login, verify, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use jqlgate_db::models::user::UserResponse;
use serde::Serialize;

use crate::auth::session::{Identity, LoginInput, RegisterInput, Session};
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::auth::AuthUser;
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Returned by register and login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: String,
    pub user: UserResponse,
}

impl SessionResponse {
    fn new(message: &'static str, session: Session) -> Self {
        Self {
            success: true,
            message,
            token: session.token,
            user: session.user,
        }
    }
}

/// Returned by verify: the identity the token carries.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: Identity,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create an account and sign the new user in.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let session = state.sessions.register(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new("User created successfully", session)),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginInput>,
) -> AppResult<Json<SessionResponse>> {
    let session = state.sessions.login(input).await?;
    Ok(Json(SessionResponse::new("Login successful", session)))
}

/// GET /api/auth/verify (requires auth)
pub async fn verify(AuthUser(identity): AuthUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        success: true,
        message: "Token is valid",
        user: identity,
    })
}

/// POST /api/auth/logout (requires auth)
///
/// Tokens are not revoked server-side; the client discards its copy.
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Json<MessageResponse> {
    state.sessions.logout(&identity);
    Json(MessageResponse::ok("Logged out successfully"))
}
