//! REST API client for the Jira Cloud endpoints the proxy relays.
//!
//! Wraps `myself`, `search` and `field` using [`reqwest`]. Each request
//! carries its own timeout and is attempted exactly once.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jqlgate_core::jira::{JiraConnectionConfig, JqlQuerySpec};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;

use crate::error::{JiraError, JiraOperation};
use crate::models::{FieldDescriptor, JiraAccount, RawSearchResponse, SearchResults};

const MYSELF_PATH: &str = "/rest/api/3/myself";
const SEARCH_PATH: &str = "/rest/api/3/search";
const FIELD_PATH: &str = "/rest/api/3/field";

/// Default timeout for identity and metadata calls.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(10);
/// Default timeout for JQL searches.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-operation upper bounds on a single Jira call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JiraTimeouts {
    /// `myself` and `field`.
    pub metadata: Duration,
    /// `search`.
    pub search: Duration,
}

impl Default for JiraTimeouts {
    fn default() -> Self {
        Self {
            metadata: DEFAULT_METADATA_TIMEOUT,
            search: DEFAULT_SEARCH_TIMEOUT,
        }
    }
}

/// HTTP client shared by all proxy requests (connection reuse only; no
/// credentials are kept between calls).
#[derive(Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    timeouts: JiraTimeouts,
}

/// `Basic base64(email:token)` for the outbound `Authorization` header.
pub fn basic_auth_header(email: &str, token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{email}:{token}")))
}

impl JiraClient {
    /// Create a client with its own connection pool.
    pub fn new(timeouts: JiraTimeouts) -> Result<Self, JiraError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("jqlgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JiraError::Client(e.to_string()))?;
        Ok(Self { client, timeouts })
    }

    /// `GET /rest/api/3/myself` -- confirms the credentials work and returns
    /// the account they belong to.
    pub async fn myself(&self, conn: &JiraConnectionConfig) -> Result<JiraAccount, JiraError> {
        let request = self.client.get(conn.endpoint(MYSELF_PATH));
        self.send(
            JiraOperation::TestConnection,
            conn,
            request,
            self.timeouts.metadata,
        )
        .await
    }

    /// `POST /rest/api/3/search` with the validated query as the body.
    pub async fn search(
        &self,
        conn: &JiraConnectionConfig,
        query: &JqlQuerySpec,
    ) -> Result<SearchResults, JiraError> {
        let request = self.client.post(conn.endpoint(SEARCH_PATH)).json(query);
        let raw: RawSearchResponse = self
            .send(JiraOperation::Search, conn, request, self.timeouts.search)
            .await?;
        Ok(raw.into())
    }

    /// `GET /rest/api/3/field` -- every system and custom field.
    pub async fn fields(
        &self,
        conn: &JiraConnectionConfig,
    ) -> Result<Vec<FieldDescriptor>, JiraError> {
        let request = self.client.get(conn.endpoint(FIELD_PATH));
        self.send(JiraOperation::Fields, conn, request, self.timeouts.metadata)
            .await
    }

    // ---- private helpers ----

    /// Attach auth and timeout, send once, and decode a 2xx JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        operation: JiraOperation,
        conn: &JiraConnectionConfig,
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<T, JiraError> {
        let response = request
            .header(AUTHORIZATION, basic_auth_header(&conn.email, &conn.api_token))
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(%operation, domain = %conn.domain, error = %e, "Jira request failed");
                JiraError::from_transport(operation, &e, timeout)
            })?;

        let response = Self::ensure_success(operation, response).await?;

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                JiraError::from_transport(operation, &e, timeout)
            } else {
                tracing::warn!(%operation, error = %e, "Could not decode Jira response");
                JiraError::Decode(e.to_string())
            }
        })
    }

    /// Return the response unchanged on 2xx, or classify the failure using
    /// the upstream status and error document.
    async fn ensure_success(
        operation: JiraOperation,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, JiraError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let body: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
        tracing::info!(%operation, status = status.as_u16(), "Jira returned an error status");

        Err(JiraError::from_status(operation, status.as_u16(), &body))
    }
}
