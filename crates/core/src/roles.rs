//! Well-known role name constants.

/// Assigned to every self-registered account.
pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Roles allowed to call the Jira proxy routes.
pub const JIRA_ROLES: &[&str] = &[ROLE_USER, ROLE_ADMIN];
