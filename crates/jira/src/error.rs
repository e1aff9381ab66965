//! Jira failure classification.
//!
//! Upstream responses are turned into human-readable messages here, per
//! operation, so the HTTP layer only decides status codes.

use std::fmt;
use std::time::Duration;

/// The proxy operation a failure belongs to. Message wording depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JiraOperation {
    TestConnection,
    Search,
    Fields,
}

impl fmt::Display for JiraOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JiraOperation::TestConnection => "test-connection",
            JiraOperation::Search => "search",
            JiraOperation::Fields => "fields",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JiraError {
    /// Jira answered with a non-2xx status.
    #[error("{message}")]
    Upstream {
        operation: JiraOperation,
        status: u16,
        message: String,
        /// Upstream-provided messages, surfaced verbatim.
        details: Vec<String>,
    },

    /// No response: timeout, DNS, TLS or connection failure.
    #[error("{message}")]
    Connectivity {
        operation: JiraOperation,
        message: String,
    },

    /// Jira answered 2xx with a body we could not parse.
    #[error("Unexpected response from Jira: {0}")]
    Decode(String),

    /// The HTTP client itself could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl JiraError {
    /// Classify a non-2xx upstream response.
    ///
    /// `body` is the upstream JSON error document, or `Null` when the body
    /// was empty or not JSON.
    pub fn from_status(operation: JiraOperation, status: u16, body: &serde_json::Value) -> Self {
        let upstream_message = body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);

        let (message, details) = match (operation, status) {
            (JiraOperation::Search, 400) => {
                ("Invalid JQL query".to_string(), error_messages(body))
            }
            (JiraOperation::Search, 401) => ("Invalid credentials".to_string(), Vec::new()),
            (JiraOperation::Search, 403) => {
                ("Access denied for this query".to_string(), Vec::new())
            }
            (JiraOperation::Search, _) => (
                format!("HTTP error {status}"),
                upstream_message.into_iter().collect(),
            ),

            (_, 401) => (
                "Invalid credentials. Check the email and API token.".to_string(),
                Vec::new(),
            ),
            (_, 403) => (
                "Access denied. Check the API token permissions.".to_string(),
                Vec::new(),
            ),
            (_, 404) => (
                "Jira domain not found. Check the URL.".to_string(),
                Vec::new(),
            ),
            (_, _) => (
                format!(
                    "HTTP error {status}: {}",
                    upstream_message.as_deref().unwrap_or("Unknown error")
                ),
                Vec::new(),
            ),
        };

        JiraError::Upstream {
            operation,
            status,
            message,
            details,
        }
    }

    /// Classify a transport failure (no HTTP response received).
    pub fn from_transport(operation: JiraOperation, err: &reqwest::Error, timeout: Duration) -> Self {
        let message = if err.is_timeout() {
            format!(
                "Jira did not respond within {} seconds",
                timeout.as_secs_f64()
            )
        } else {
            match operation {
                JiraOperation::Search => "Could not execute the query on Jira".to_string(),
                _ => "Could not connect to Jira".to_string(),
            }
        };

        JiraError::Connectivity { operation, message }
    }
}

/// `errorMessages` from a Jira error document, verbatim.
fn error_messages(body: &serde_json::Value) -> Vec<String> {
    body.get("errorMessages")
        .and_then(serde_json::Value::as_array)
        .map(|messages| {
            messages
                .iter()
                .filter_map(|m| m.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn message_of(err: JiraError) -> (String, Vec<String>) {
        match err {
            JiraError::Upstream {
                message, details, ..
            } => (message, details),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn connection_statuses_map_to_fixed_messages() {
        let (msg, _) = message_of(JiraError::from_status(
            JiraOperation::TestConnection,
            401,
            &json!(null),
        ));
        assert!(msg.starts_with("Invalid credentials"));

        let (msg, _) = message_of(JiraError::from_status(
            JiraOperation::TestConnection,
            403,
            &json!(null),
        ));
        assert!(msg.starts_with("Access denied"));

        let (msg, _) = message_of(JiraError::from_status(
            JiraOperation::Fields,
            404,
            &json!(null),
        ));
        assert!(msg.contains("domain not found"));
    }

    #[test]
    fn connection_other_status_includes_upstream_message() {
        let (msg, _) = message_of(JiraError::from_status(
            JiraOperation::TestConnection,
            503,
            &json!({ "message": "Site is under maintenance" }),
        ));
        assert_eq!(msg, "HTTP error 503: Site is under maintenance");

        let (msg, _) = message_of(JiraError::from_status(
            JiraOperation::TestConnection,
            500,
            &json!(null),
        ));
        assert_eq!(msg, "HTTP error 500: Unknown error");
    }

    #[test]
    fn search_400_surfaces_error_messages() {
        let body = json!({
            "errorMessages": ["Field 'prio' does not exist or you do not have permission to view it."],
            "errors": {}
        });
        let (msg, details) =
            message_of(JiraError::from_status(JiraOperation::Search, 400, &body));
        assert_eq!(msg, "Invalid JQL query");
        assert_eq!(
            details,
            vec!["Field 'prio' does not exist or you do not have permission to view it."]
        );
    }

    #[test]
    fn search_other_statuses() {
        let (msg, details) =
            message_of(JiraError::from_status(JiraOperation::Search, 401, &json!({})));
        assert_eq!(msg, "Invalid credentials");
        assert!(details.is_empty());

        let (msg, _) = message_of(JiraError::from_status(JiraOperation::Search, 403, &json!({})));
        assert_eq!(msg, "Access denied for this query");

        let (msg, details) = message_of(JiraError::from_status(
            JiraOperation::Search,
            429,
            &json!({ "message": "Rate limit exceeded" }),
        ));
        assert_eq!(msg, "HTTP error 429");
        assert_eq!(details, vec!["Rate limit exceeded"]);
    }

    #[test]
    fn status_is_preserved() {
        let err = JiraError::from_status(JiraOperation::Fields, 418, &json!(null));
        assert_matches!(err, JiraError::Upstream { status: 418, operation: JiraOperation::Fields, .. });
    }
}
