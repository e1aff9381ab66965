/// Why an authentication attempt or token check was rejected.
///
/// The machine-readable [`code`](AuthFailure::code) lets the browser decide
/// whether to prompt for a fresh login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No bearer token was presented.
    TokenRequired,
    /// The token signature is valid but `exp` has passed.
    TokenExpired,
    /// The token is malformed or signed with another secret.
    InvalidToken,
    /// Email/password did not match a registered account.
    InvalidCredentials,
}

impl AuthFailure {
    pub fn code(self) -> &'static str {
        match self {
            AuthFailure::TokenRequired => "TOKEN_REQUIRED",
            AuthFailure::TokenExpired => "TOKEN_EXPIRED",
            AuthFailure::InvalidToken => "INVALID_TOKEN",
            AuthFailure::InvalidCredentials => "INVALID_CREDENTIALS",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed or missing input; `details` holds one entry per violation.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized ({}): {message}", reason.code())]
    Unauthorized {
        reason: AuthFailure,
        message: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a validation error with a single detail line.
    pub fn invalid(message: impl Into<String>, detail: impl Into<String>) -> Self {
        CoreError::Validation {
            message: message.into(),
            details: vec![detail.into()],
        }
    }

    pub fn unauthorized(reason: AuthFailure, message: impl Into<String>) -> Self {
        CoreError::Unauthorized {
            reason,
            message: message.into(),
        }
    }
}
