//! Route definitions for the `/jira` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::jira;
use crate::state::AppState;

/// Routes mounted at `/jira`. All require an authenticated member.
///
/// ```text
/// POST /test-connection -> test_connection
/// POST /search          -> search
/// POST /fields          -> fields
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/test-connection", post(jira::test_connection))
        .route("/search", post(jira::search))
        .route("/fields", post(jira::fields))
}
