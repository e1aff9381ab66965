//! Authentication and authorization extractors, plus request limiting.
//!
//! - [`auth::AuthUser`] -- Requires a valid Bearer token.
//! - [`auth::MaybeAuthUser`] -- Same extraction, never rejects.
//! - [`rbac::RequireMember`] -- Requires a role allowed to use the Jira proxy.
//! - [`rate_limit::rate_limit`] -- Per-client request allowance (429 when spent).

pub mod auth;
pub mod rate_limit;
pub mod rbac;
