//! Request schemas for the Jira proxy and the validated values they produce.
//!
//! Input structs keep every field optional so a missing field is reported
//! as a validation detail instead of a deserialization failure.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::validation::validate_input;

/// Default `startAt` for a JQL search.
pub const DEFAULT_START_AT: u64 = 0;
/// Default `maxResults` for a JQL search.
pub const DEFAULT_MAX_RESULTS: u32 = 50;
/// Largest page size a caller may request.
pub const MAX_RESULTS_LIMIT: i64 = 100;
/// Fields requested when the caller does not name any.
pub const DEFAULT_FIELDS: &[&str] = &["summary", "status", "assignee", "created", "updated"];

// ---------------------------------------------------------------------------
// Connection config
// ---------------------------------------------------------------------------

/// Caller-supplied Jira connection parameters, as received on the wire.
#[derive(Default, Deserialize, Validate)]
pub struct JiraConnectionInput {
    #[validate(
        required(message = "domain is required"),
        url(message = "domain must be a valid URI")
    )]
    pub domain: Option<String>,
    #[validate(
        required(message = "email is required"),
        email(message = "email must be a valid email address")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "token is required"),
        length(min = 1, message = "token must not be empty")
    )]
    pub token: Option<String>,
}

impl fmt::Debug for JiraConnectionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraConnectionInput")
            .field("domain", &self.domain)
            .field("email", &self.email)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl JiraConnectionInput {
    /// Validate every field and build a [`JiraConnectionConfig`].
    ///
    /// `message` heads the resulting validation error so each route can
    /// phrase it for its own context.
    pub fn into_config(self, message: &str) -> Result<JiraConnectionConfig, CoreError> {
        validate_input(&self, message)?;

        match (self.domain, self.email, self.token) {
            (Some(domain), Some(email), Some(api_token)) => Ok(JiraConnectionConfig {
                domain: domain.trim_end_matches('/').to_string(),
                email,
                api_token,
            }),
            _ => Err(CoreError::invalid(message, "domain, email and token are required")),
        }
    }

    /// Length of the supplied token, for logging without exposing it.
    pub fn token_len(&self) -> usize {
        self.token.as_deref().map_or(0, str::len)
    }
}

/// A validated Jira connection. Lives only for the duration of one call.
#[derive(Clone)]
pub struct JiraConnectionConfig {
    /// Base URL without a trailing slash.
    pub domain: String,
    pub email: String,
    pub api_token: String,
}

impl JiraConnectionConfig {
    /// Absolute URL of a REST path such as `/rest/api/3/myself`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.domain, path)
    }
}

impl fmt::Debug for JiraConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraConnectionConfig")
            .field("domain", &self.domain)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// JQL query
// ---------------------------------------------------------------------------

/// Caller-supplied JQL query parameters, as received on the wire.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JqlQueryInput {
    #[validate(
        required(message = "jql is required"),
        length(min = 1, message = "jql must not be empty")
    )]
    pub jql: Option<String>,
    #[validate(range(min = 0, message = "startAt must be greater than or equal to 0"))]
    pub start_at: Option<i64>,
    #[validate(range(
        min = 1,
        max = MAX_RESULTS_LIMIT,
        message = "maxResults must be between 1 and 100"
    ))]
    pub max_results: Option<i64>,
    pub fields: Option<Vec<String>>,
}

impl JqlQueryInput {
    /// Validate and apply defaults, producing the body sent to Jira.
    pub fn into_spec(self, message: &str) -> Result<JqlQuerySpec, CoreError> {
        validate_input(&self, message)?;

        let jql = self
            .jql
            .ok_or_else(|| CoreError::invalid(message, "jql is required"))?;

        // Both ranges were checked above: start_at is non-negative and
        // max_results lies in 1..=MAX_RESULTS_LIMIT.
        let start_at = self
            .start_at
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(DEFAULT_START_AT);
        let max_results = self
            .max_results
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(DEFAULT_MAX_RESULTS);
        let fields = self
            .fields
            .unwrap_or_else(|| DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect());

        Ok(JqlQuerySpec {
            jql,
            start_at,
            max_results,
            fields,
        })
    }
}

/// A validated JQL search, serialized as the upstream request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JqlQuerySpec {
    pub jql: String,
    pub start_at: u64,
    pub max_results: u32,
    pub fields: Vec<String>,
}
