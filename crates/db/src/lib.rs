//! Credential store for registered application users.
//!
//! Storage is process memory only; everything here is lost on restart.
//! Callers depend on the [`repositories::UserRepo`] trait so the backend can
//! be swapped without touching the session layer.

pub mod models;
pub mod repositories;

use std::sync::Arc;

use repositories::{InMemoryUserRepo, UserRepo};

/// Shared handle to the user repository.
pub type UserStore = Arc<dyn UserRepo>;

/// Build the default (in-memory) user store.
pub fn create_user_store() -> UserStore {
    Arc::new(InMemoryUserRepo::new())
}
