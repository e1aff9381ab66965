//! Jira payloads: what the upstream API returns and the reshaped values
//! handed back to the browser.

use serde::{Deserialize, Serialize};

/// Subset of `GET /rest/api/3/myself` we expose. The raw payload is never
/// passed through.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraAccount {
    #[serde(default)]
    pub display_name: Option<String>,
    /// Hidden by Jira when the account's privacy settings require it.
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Upstream `POST /rest/api/3/search` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSearchResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    #[serde(default)]
    pub issues: Vec<IssueSummary>,
}

/// One search hit. `fields` is upstream-defined and copied verbatim.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IssueSummary {
    pub key: String,
    pub id: String,
    #[serde(rename = "self")]
    pub self_url: String,
    #[serde(default)]
    pub fields: serde_json::Value,
}

/// Reshaped search result returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub total: u64,
    pub start_at: u64,
    pub max_results: u64,
    pub issues: Vec<IssueSummary>,
}

impl From<RawSearchResponse> for SearchResults {
    fn from(raw: RawSearchResponse) -> Self {
        Self {
            total: raw.total,
            start_at: raw.start_at,
            max_results: raw.max_results,
            issues: raw.issues,
        }
    }
}

/// Field metadata from `GET /rest/api/3/field`, reduced to what the query
/// builder needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub navigable: bool,
}
