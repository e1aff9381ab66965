//! Session manager: turns credential checks into signed, time-limited tokens
//! and back.
//!
//! Verification is stateless, so logout cannot revoke anything server-side;
//! the client discards its token.

use chrono::DateTime;
use jqlgate_core::error::{AuthFailure, CoreError};
use jqlgate_core::roles::ROLE_USER;
use jqlgate_core::types::{Timestamp, UserId};
use jqlgate_core::validation::violation_details;
use jqlgate_db::models::user::{CreateUser, UserResponse};
use jqlgate_db::repositories::RepoError;
use jqlgate_db::UserStore;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::jwt::{generate_token, verify_token, Claims, JwtConfig, TokenError};
use super::password::{
    hash_password, validate_password_strength, verify_credentials, MIN_PASSWORD_LENGTH,
};

/// Message shared by every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// Request body for registration.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(
        required(message = "name is required"),
        length(min = 1, message = "name must not be empty")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "email is required"),
        email(message = "email must be a valid email address")
    )]
    pub email: Option<String>,
    #[validate(required(message = "password is required"))]
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(
        required(message = "email is required"),
        length(min = 1, message = "email must not be empty")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "password is required"),
        length(min = 1, message = "password must not be empty")
    )]
    pub password: Option<String>,
}

/// A freshly issued token and the user it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserResponse,
    pub token: String,
}

/// The identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            roles: claims.roles,
            issued_at: DateTime::from_timestamp(claims.iat, 0).unwrap_or_default(),
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_default(),
        }
    }
}

impl Identity {
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.roles.iter().any(|r| roles.contains(&r.as_str()))
    }
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Issues and verifies session tokens for users in the injected store.
pub struct SessionManager {
    users: UserStore,
    jwt: JwtConfig,
}

impl SessionManager {
    pub fn new(users: UserStore, jwt: JwtConfig) -> Self {
        Self { users, jwt }
    }

    /// Create an account and sign the caller in.
    ///
    /// Fails with `Validation` for missing fields, a malformed email or a
    /// short password, and with `Conflict` when the email is taken.
    pub async fn register(&self, mut input: RegisterInput) -> Result<Session, CoreError> {
        input.name = input.name.map(|name| name.trim().to_string());

        let mut details = match input.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => violation_details(&errors),
        };
        if let Some(password) = &input.password {
            if let Err(msg) = validate_password_strength(password, MIN_PASSWORD_LENGTH) {
                details.push(msg);
            }
        }

        let (Some(name), Some(email), Some(password)) = (input.name, input.email, input.password)
        else {
            return Err(registration_invalid(details));
        };
        if !details.is_empty() {
            return Err(registration_invalid(details));
        }

        if self.users.find_by_email(&email).await.is_some() {
            return Err(duplicate_email());
        }

        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| CoreError::Internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| CoreError::Internal(format!("Password hashing error: {e}")))?;

        let user = self
            .users
            .insert_if_absent(CreateUser {
                name,
                email,
                password_hash,
                roles: vec![ROLE_USER.to_string()],
            })
            .await
            .map_err(|e| match e {
                RepoError::DuplicateEmail(_) => duplicate_email(),
            })?;

        let registered_users = self.users.count().await;
        tracing::info!(
            user_id = %user.id,
            registered_users,
            "User registered"
        );

        let token = self.issue(&user.id, &user.email, &user.name, &user.roles)?;
        Ok(Session {
            user: UserResponse::from(&user),
            token,
        })
    }

    /// Check email and password and issue a fresh token.
    ///
    /// An unknown email and a wrong password produce the same error so the
    /// response does not reveal which accounts exist.
    pub async fn login(&self, input: LoginInput) -> Result<Session, CoreError> {
        if let Err(errors) = input.validate() {
            return Err(CoreError::Validation {
                message: "Email and password are required".to_string(),
                details: violation_details(&errors),
            });
        }
        let (Some(email), Some(password)) = (input.email, input.password) else {
            return Err(CoreError::invalid(
                "Email and password are required",
                "email and password are required",
            ));
        };

        let user = self.users.find_by_email(&email).await;
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let valid = tokio::task::spawn_blocking(move || {
            verify_credentials(&password, stored_hash.as_deref())
        })
        .await
        .map_err(|e| CoreError::Internal(format!("Password verification task failed: {e}")))?
        .map_err(|e| CoreError::Internal(format!("Password verification error: {e}")))?;

        let user = match user {
            Some(user) if valid => user,
            Some(user) => {
                tracing::info!(user_id = %user.id, "Login failed: wrong password");
                return Err(invalid_credentials());
            }
            None => {
                tracing::info!("Login failed: unknown email");
                return Err(invalid_credentials());
            }
        };

        tracing::info!(user_id = %user.id, "User logged in");

        let token = self.issue(&user.id, &user.email, &user.name, &user.roles)?;
        Ok(Session {
            user: UserResponse::from(&user),
            token,
        })
    }

    /// Verify a token and return the identity it carries.
    pub fn verify(&self, token: &str) -> Result<Identity, CoreError> {
        match verify_token(token, &self.jwt) {
            Ok(claims) => Ok(Identity::from(claims)),
            Err(TokenError::Expired) => Err(CoreError::unauthorized(
                AuthFailure::TokenExpired,
                "Token expired. Please log in again.",
            )),
            Err(TokenError::Invalid(e)) => {
                tracing::debug!(error = %e, "Rejected session token");
                Err(CoreError::unauthorized(
                    AuthFailure::InvalidToken,
                    "Invalid token.",
                ))
            }
        }
    }

    /// Advisory only: there is no revocation list, so this records the
    /// event and the caller discards the token.
    pub fn logout(&self, identity: &Identity) {
        tracing::info!(user_id = %identity.id, "User logged out");
    }

    fn issue(
        &self,
        user_id: &str,
        email: &str,
        name: &str,
        roles: &[String],
    ) -> Result<String, CoreError> {
        generate_token(user_id, email, name, roles, &self.jwt)
            .map_err(|e| CoreError::Internal(format!("Token generation error: {e}")))
    }
}

fn registration_invalid(details: Vec<String>) -> CoreError {
    CoreError::Validation {
        message: "Name, email and a valid password are required".to_string(),
        details,
    }
}

fn duplicate_email() -> CoreError {
    CoreError::Conflict("A user with this email already exists".to_string())
}

fn invalid_credentials() -> CoreError {
    CoreError::unauthorized(AuthFailure::InvalidCredentials, INVALID_CREDENTIALS)
}
