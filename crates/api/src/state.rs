use std::sync::Arc;

use jqlgate_jira::{JiraClient, JiraError};

use crate::auth::session::SessionManager;
use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Session manager over the in-memory user store.
    pub sessions: Arc<SessionManager>,
    /// Outbound Jira client (connection reuse only, no stored credentials).
    pub jira: Arc<JiraClient>,
    /// Per-client request counters.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wire up a fresh user store, session manager, Jira client and rate
    /// limiter.
    pub fn from_config(config: ServerConfig) -> Result<Self, JiraError> {
        let jira = JiraClient::new(config.jira_timeouts)?;
        let sessions = SessionManager::new(jqlgate_db::create_user_store(), config.jwt.clone());

        let rate_limiter = RateLimiter::new(config.rate_limit);

        Ok(Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            jira: Arc::new(jira),
            rate_limiter: Arc::new(rate_limiter),
        })
    }
}
