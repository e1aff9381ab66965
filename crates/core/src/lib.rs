//! Domain types shared by every jqlgate crate: the error taxonomy, role
//! names, Jira request schemas and their validation.

pub mod error;
pub mod jira;
pub mod roles;
pub mod types;
pub mod validation;
