//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- session token signing and verification.
//! - [`session`] -- register / login / verify / logout on top of the user store.

pub mod jwt;
pub mod password;
pub mod session;
