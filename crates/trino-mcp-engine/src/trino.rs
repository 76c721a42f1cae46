//! Trino REST statement client.
//!
//! A query is `POST /v1/statement` with the SQL as the body, followed by a
//! `GET` of each `nextUri` until a page arrives without one.

use crate::client::QueryEngine;
use crate::error::EngineError;
use crate::protocol::QueryPage;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use trino_mcp_core::EngineConfig;
use url::Url;

/// Value of `X-Trino-Source` on every request.
pub const SOURCE: &str = "trino-mcp";

/// Extra attempts for a page fetch that hit a transient gateway status.
const FETCH_RETRIES: u32 = 3;
const FETCH_BACKOFF: Duration = Duration::from_millis(100);

/// [`QueryEngine`] speaking the Trino HTTP protocol.
#[derive(Debug, Clone)]
pub struct TrinoHttpEngine {
    http: Client,
    statement_url: Url,
    session: HeaderMap,
}

impl TrinoHttpEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let http = Client::builder()
            .build()
            .map_err(|e| EngineError::other(format!("failed to build HTTP client: {}", e)))?;
        Self::with_client(http, config)
    }

    /// Build on an existing client, e.g. one with custom TLS settings.
    pub fn with_client(http: Client, config: &EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            http,
            statement_url: statement_url(&config.server)?,
            session: session_headers(config)?,
        })
    }

    fn request_headers(&self, credentials: &HeaderMap) -> HeaderMap {
        let mut headers = self.session.clone();
        for (name, value) in credentials {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    async fn read_page(response: Response) -> Result<QueryPage, EngineError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        response
            .json::<QueryPage>()
            .await
            .map_err(|e| EngineError::other(format!("invalid response from Trino: {}", e)))
    }
}

#[async_trait]
impl QueryEngine for TrinoHttpEngine {
    async fn submit(&self, sql: &str, headers: &HeaderMap) -> Result<QueryPage, EngineError> {
        tracing::debug!(url = %self.statement_url, "submitting statement");
        let response = self
            .http
            .post(self.statement_url.clone())
            .headers(self.request_headers(headers))
            .header(CONTENT_TYPE, "text/plain")
            .body(sql.to_string())
            .send()
            .await
            .map_err(|e| EngineError::other(format!("request to Trino failed: {}", e)))?;
        Self::read_page(response).await
    }

    async fn fetch(&self, next_uri: &str, headers: &HeaderMap) -> Result<QueryPage, EngineError> {
        let headers = self.request_headers(headers);
        let mut attempt = 0;
        loop {
            let response = self
                .http
                .get(next_uri)
                .headers(headers.clone())
                .send()
                .await
                .map_err(|e| EngineError::other(format!("request to Trino failed: {}", e)))?;

            if is_transient(response.status()) && attempt < FETCH_RETRIES {
                attempt += 1;
                tracing::debug!(status = %response.status(), attempt, "retrying page fetch");
                tokio::time::sleep(FETCH_BACKOFF * attempt).await;
                continue;
            }
            return Self::read_page(response).await;
        }
    }
}

fn statement_url(server: &Url) -> Result<Url, EngineError> {
    let mut base = server.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("v1/statement")
        .map_err(|e| EngineError::other(format!("invalid Trino server URL {}: {}", server, e)))
}

fn session_headers(config: &EngineConfig) -> Result<HeaderMap, EngineError> {
    let mut headers = HeaderMap::new();
    let pairs = [
        ("x-trino-user", config.user.as_str()),
        ("x-trino-catalog", config.catalog.as_str()),
        ("x-trino-schema", config.schema.as_str()),
        ("x-trino-source", SOURCE),
    ];
    for (name, value) in pairs {
        let value = HeaderValue::from_str(value)
            .map_err(|_| EngineError::other(format!("invalid value for header {}", name)))?;
        headers.insert(HeaderName::from_static(name), value);
    }
    Ok(headers)
}

fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

fn status_error(status: StatusCode, body: &str) -> EngineError {
    let excerpt: String = body.trim().chars().take(200).collect();
    let message = if excerpt.is_empty() {
        format!("Trino returned HTTP {}", status.as_u16())
    } else {
        format!("Trino returned HTTP {}: {}", status.as_u16(), excerpt)
    };
    if status == StatusCode::UNAUTHORIZED {
        EngineError::unauthorized(message)
    } else {
        EngineError::from_message(message)
    }
}
