//! Outbound client for the Jira Cloud REST API.
//!
//! Every call takes the caller's [`JiraConnectionConfig`] by reference and
//! keeps nothing afterwards: credentials are never cached or logged.
//!
//! [`JiraConnectionConfig`]: jqlgate_core::jira::JiraConnectionConfig

pub mod client;
pub mod error;
pub mod models;

pub use client::{JiraClient, JiraTimeouts};
pub use error::{JiraError, JiraOperation};
