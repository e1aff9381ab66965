use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::header::RETRY_AFTER;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jqlgate_core::error::{AuthFailure, CoreError};
use jqlgate_jira::JiraError;

use crate::response::ErrorBody;

/// Whether internal error detail may be sent to clients. Set once at
/// startup from the deployment mode; off unless development.
static EXPOSE_ERROR_DETAILS: AtomicBool = AtomicBool::new(false);

pub fn set_expose_error_details(expose: bool) {
    EXPOSE_ERROR_DETAILS.store(expose, Ordering::Relaxed);
}

pub fn expose_error_details() -> bool {
    EXPOSE_ERROR_DETAILS.load(Ordering::Relaxed)
}

/// Generic text sent in place of hidden internal detail.
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`JiraError`] for upstream
/// failures, and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `jqlgate_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failed outbound Jira call.
    #[error(transparent)]
    Jira(#[from] JiraError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// The client used up its request allowance.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// Message sent with a 429.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation { message, details } => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new(message, "VALIDATION_ERROR").with_details(details),
                ),
                CoreError::Conflict(msg) => {
                    (StatusCode::BAD_REQUEST, ErrorBody::new(msg, "CONFLICT"))
                }
                CoreError::Unauthorized { reason, message } => {
                    (auth_status(reason), ErrorBody::new(message, reason.code()))
                }
                CoreError::Forbidden(msg) => {
                    (StatusCode::FORBIDDEN, ErrorBody::new(msg, "FORBIDDEN"))
                }
                CoreError::Internal(msg) => internal(&msg),
            },

            // --- Jira errors ---
            AppError::Jira(jira) => match jira {
                JiraError::Upstream {
                    message, details, ..
                } => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new(message, "UPSTREAM_ERROR").with_details(details),
                ),
                JiraError::Connectivity { message, .. } => (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody::new(message, "CONNECTIVITY_ERROR"),
                ),
                JiraError::Decode(msg) => {
                    tracing::error!(error = %msg, "Undecodable Jira response");
                    (
                        StatusCode::BAD_GATEWAY,
                        ErrorBody::new("Unexpected response from Jira", "UPSTREAM_DECODE_ERROR"),
                    )
                }
                JiraError::Client(msg) => internal(&msg),
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(msg, "BAD_REQUEST"))
            }
            AppError::InternalError(msg) => internal(&msg),
            AppError::RateLimited { retry_after_secs } => {
                let body = ErrorBody::new(RATE_LIMIT_MESSAGE, "RATE_LIMITED");
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(RETRY_AFTER, retry_after_secs.to_string())],
                    Json(body),
                )
                    .into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Expired and missing tokens ask the client to log in again (401); a token
/// that fails its signature check is refused outright (403).
fn auth_status(reason: AuthFailure) -> StatusCode {
    match reason {
        AuthFailure::InvalidToken => StatusCode::FORBIDDEN,
        AuthFailure::TokenRequired | AuthFailure::TokenExpired | AuthFailure::InvalidCredentials => {
            StatusCode::UNAUTHORIZED
        }
    }
}

fn internal(detail: &str) -> (StatusCode, ErrorBody) {
    tracing::error!(error = %detail, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        internal_body(detail, expose_error_details()),
    )
}

/// Body for a 500; `detail` is only included when `expose` is set.
pub fn internal_body(detail: &str, expose: bool) -> ErrorBody {
    let message = if expose { detail } else { GENERIC_FAILURE };
    ErrorBody::new("Internal server error", "INTERNAL_ERROR").with_message(message)
}
