pub mod auth;
pub mod jira;
