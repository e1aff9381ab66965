//! Handlers for the `/jira` resource.
//!
//! Every call carries its own Jira credentials in the body. They are
//! validated, used for one outbound request and dropped; nothing here
//! stores or logs the token.

use axum::extract::State;
use axum::Json;
use jqlgate_core::jira::{JiraConnectionInput, JqlQueryInput};
use jqlgate_jira::models::{FieldDescriptor, JiraAccount, SearchResults};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::rbac::RequireMember;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /jira/search`: connection and query fields side by side.
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(flatten)]
    pub connection: JiraConnectionInput,
    #[serde(flatten)]
    pub query: JqlQueryInput,
}

#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: JiraAccount,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    /// The JQL that was executed.
    pub query: String,
    pub results: SearchResults,
}

#[derive(Debug, Serialize)]
pub struct FieldsResponse {
    pub success: bool,
    pub fields: Vec<FieldDescriptor>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/jira/test-connection
///
/// Confirms the supplied credentials against `/rest/api/3/myself` and
/// returns the account they belong to.
pub async fn test_connection(
    State(state): State<AppState>,
    RequireMember(identity): RequireMember,
    JsonBody(input): JsonBody<JiraConnectionInput>,
) -> AppResult<Json<ConnectionResponse>> {
    tracing::info!(
        user_id = %identity.id,
        domain = ?input.domain,
        email = ?input.email,
        token_len = input.token_len(),
        "Testing Jira connection"
    );

    let conn = input.into_config("Invalid data")?;
    let account = state.jira.myself(&conn).await?;

    tracing::info!(domain = %conn.domain, account_id = ?account.account_id, "Jira connection established");

    Ok(Json(ConnectionResponse {
        success: true,
        message: "Connection established",
        user: account,
    }))
}

/// POST /api/jira/search
///
/// Connection and query are validated separately so each failure reports
/// its own field-level details.
pub async fn search(
    State(state): State<AppState>,
    RequireMember(identity): RequireMember,
    JsonBody(input): JsonBody<SearchRequest>,
) -> AppResult<Json<SearchResponse>> {
    let conn = input.connection.into_config("Invalid Jira configuration")?;
    let query = input.query.into_spec("Invalid JQL query")?;

    tracing::info!(
        user_id = %identity.id,
        domain = %conn.domain,
        jql = %query.jql,
        start_at = query.start_at,
        max_results = query.max_results,
        "Executing JQL search"
    );

    let results = state.jira.search(&conn, &query).await?;

    tracing::debug!(total = results.total, returned = results.issues.len(), "JQL search complete");

    Ok(Json(SearchResponse {
        success: true,
        query: query.jql,
        results,
    }))
}

/// POST /api/jira/fields
pub async fn fields(
    State(state): State<AppState>,
    RequireMember(_identity): RequireMember,
    JsonBody(input): JsonBody<JiraConnectionInput>,
) -> AppResult<Json<FieldsResponse>> {
    let conn = input.into_config("Invalid Jira configuration")?;
    let fields = state.jira.fields(&conn).await?;

    Ok(Json(FieldsResponse {
        success: true,
        fields,
    }))
}
