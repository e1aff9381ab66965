//! Repository for registered users.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::user::{normalize_email, CreateUser, User};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Another account already owns this email (compared case-insensitively).
    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),
}

/// Storage operations the session layer needs.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Find a user by email, ignoring case.
    async fn find_by_email(&self, email: &str) -> Option<User>;

    /// Insert a new user unless the email is taken.
    ///
    /// The uniqueness check and the insert are a single atomic step, so two
    /// concurrent registrations for the same email cannot both succeed.
    async fn insert_if_absent(&self, input: CreateUser) -> Result<User, RepoError>;

    /// Number of registered users.
    async fn count(&self) -> usize;
}

/// Process-memory user store, keyed by normalized email.
///
/// Thread-safe via interior `RwLock`; wrap in `Arc` and share.
#[derive(Default)]
pub struct InMemoryUserRepo {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users
            .read()
            .await
            .get(&normalize_email(email))
            .cloned()
    }

    async fn insert_if_absent(&self, input: CreateUser) -> Result<User, RepoError> {
        let email = normalize_email(&input.email);

        let mut users = self.users.write().await;
        if users.contains_key(&email) {
            return Err(RepoError::DuplicateEmail(email));
        }

        let user = User {
            id: Uuid::now_v7().to_string(),
            name: input.name,
            email: email.clone(),
            password_hash: input.password_hash,
            roles: input.roles,
            created_at: chrono::Utc::now(),
        };
        users.insert(email, user.clone());
        tracing::debug!(user_id = %user.id, total = users.len(), "User stored");

        Ok(user)
    }

    async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}
