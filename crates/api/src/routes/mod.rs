pub mod auth;
pub mod health;
pub mod jira;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                  register (public)
/// /auth/login                     login (public)
/// /auth/verify                    verify token (requires auth)
/// /auth/logout                    logout (requires auth)
///
/// /jira/test-connection           check credentials (requires user role)
/// /jira/search                    run a JQL query (requires user role)
/// /jira/fields                    list fields (requires user role)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/jira", jira::router())
}
