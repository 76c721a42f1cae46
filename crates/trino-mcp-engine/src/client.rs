//! Query execution.

use crate::error::EngineError;
use crate::protocol::{QueryPage, WireError};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use trino_mcp_auth::{CredentialError, CredentialManager};
use trino_mcp_core::CompiledQuery;

/// Error names that mean the engine rejected our identity.
const AUTHORIZATION_ERROR_NAMES: &[&str] = &["UNAUTHORIZED", "PERMISSION_DENIED"];

/// A query engine with a paged result protocol.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submit a statement and return the first page.
    async fn submit(&self, sql: &str, headers: &HeaderMap) -> Result<QueryPage, EngineError>;

    /// Fetch the page behind a `nextUri`.
    async fn fetch(&self, next_uri: &str, headers: &HeaderMap) -> Result<QueryPage, EngineError>;
}

/// Rows returned by a query, in engine order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    pub row_count: usize,
}

/// Executes compiled queries with credentials from the shared cache.
#[derive(Clone)]
pub struct ExecutionClient {
    engine: Arc<dyn QueryEngine>,
    credentials: CredentialManager,
}

impl ExecutionClient {
    pub fn new(engine: Arc<dyn QueryEngine>, credentials: CredentialManager) -> Self {
        Self {
            engine,
            credentials,
        }
    }

    /// Credential headers, optionally forcing a refresh first.
    pub async fn headers(&self, force_refresh: bool) -> Result<HeaderMap, CredentialError> {
        self.credentials.headers(force_refresh).await
    }

    /// Run a query to completion and collect every page's rows.
    ///
    /// No row cap is applied beyond what the SQL itself declares.
    pub async fn execute(
        &self,
        query: &CompiledQuery,
        headers: &HeaderMap,
    ) -> Result<QueryResult, EngineError> {
        let started = Instant::now();
        let mut page = self.engine.submit(&query.sql, headers).await?;
        let mut result = QueryResult::default();
        let mut pages = 1usize;

        loop {
            if let Some(error) = page.error.take() {
                return Err(classify(error));
            }
            if result.columns.is_empty() {
                if let Some(columns) = page.columns.take() {
                    result.columns = columns.into_iter().map(|c| c.name).collect();
                }
            }
            if let Some(data) = page.data.take() {
                result
                    .rows
                    .extend(data.into_iter().map(|row| zip_row(&result.columns, row)));
            }

            match page.next_uri.take() {
                Some(next_uri) => {
                    page = self.engine.fetch(&next_uri, headers).await?;
                    pages += 1;
                }
                None => break,
            }
        }

        result.row_count = result.rows.len();
        tracing::debug!(
            row_count = result.row_count,
            pages,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query finished"
        );
        Ok(result)
    }
}

/// Pair values with column names. Values beyond the known columns get positional names.
fn zip_row(columns: &[String], row: Vec<Value>) -> Map<String, Value> {
    row.into_iter()
        .enumerate()
        .map(|(i, value)| {
            let name = columns
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("_col{}", i));
            (name, value)
        })
        .collect()
}

fn classify(error: WireError) -> EngineError {
    let by_name = error
        .error_name
        .as_deref()
        .is_some_and(|name| AUTHORIZATION_ERROR_NAMES.contains(&name));
    let message = match &error.error_name {
        Some(name) => format!("{}: {}", name, error.message),
        None => error.message,
    };
    if by_name {
        EngineError::unauthorized(message)
    } else {
        EngineError::from_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Column;
    use serde_json::json;
    use std::sync::Mutex;
    use trino_mcp_auth::TokenMinter;
    use trino_mcp_core::{AuthConfig, AuthMode, EngineConfig, Secret};

    /// Serves a fixed list of pages, linked by synthetic next URIs.
    struct PagedEngine {
        pages: Vec<QueryPage>,
        fetched: Mutex<Vec<String>>,
    }

    impl PagedEngine {
        fn new(mut pages: Vec<QueryPage>) -> Self {
            let last = pages.len().saturating_sub(1);
            for (i, page) in pages.iter_mut().enumerate() {
                if i < last {
                    page.next_uri = Some(format!("page/{}", i + 1));
                }
            }
            Self {
                pages,
                fetched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QueryEngine for PagedEngine {
        async fn submit(&self, _sql: &str, _headers: &HeaderMap) -> Result<QueryPage, EngineError> {
            Ok(self.pages[0].clone())
        }

        async fn fetch(&self, next_uri: &str, _headers: &HeaderMap) -> Result<QueryPage, EngineError> {
            self.fetched.lock().unwrap().push(next_uri.to_string());
            let index: usize = next_uri.trim_start_matches("page/").parse().unwrap();
            Ok(self.pages[index].clone())
        }
    }

    struct NoMinter;

    #[async_trait]
    impl TokenMinter for NoMinter {
        async fn mint_identity_token(&self, _dc: &str) -> Result<String, CredentialError> {
            unreachable!("basic auth never mints")
        }
        async fn mint_access_token(&self, _dc: &str) -> Result<String, CredentialError> {
            unreachable!("basic auth never mints")
        }
    }

    fn client(engine: PagedEngine) -> (ExecutionClient, Arc<PagedEngine>) {
        let engine = Arc::new(engine);
        let auth = AuthConfig {
            mode: AuthMode::Basic,
            ..Default::default()
        };
        let engine_config = EngineConfig {
            password: Some(Secret::new("secret")),
            ..Default::default()
        };
        let manager = CredentialManager::new(auth, &engine_config, Arc::new(NoMinter));
        (ExecutionClient::new(engine.clone(), manager), engine)
    }

    fn query() -> CompiledQuery {
        CompiledQuery {
            sql: "SELECT 1 LIMIT 10".to_string(),
            declared_limit: Some(10),
        }
    }

    fn columns(names: &[&str]) -> Option<Vec<Column>> {
        Some(
            names
                .iter()
                .map(|n| Column {
                    name: n.to_string(),
                    column_type: "varchar".to_string(),
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_pages_are_concatenated_in_order() {
        let (client, engine) = client(PagedEngine::new(vec![
            QueryPage::default(),
            QueryPage {
                columns: columns(&["service", "hits"]),
                data: Some(vec![vec![json!("web"), json!(3)]]),
                ..Default::default()
            },
            QueryPage {
                data: Some(vec![vec![json!("api"), json!(2)], vec![json!("db"), json!(1)]]),
                ..Default::default()
            },
        ]));

        let headers = client.headers(false).await.unwrap();
        let result = client.execute(&query(), &headers).await.unwrap();

        assert_eq!(result.columns, vec!["service", "hits"]);
        assert_eq!(result.row_count, 3);
        let services: Vec<&str> = result.rows.iter().map(|r| r["service"].as_str().unwrap()).collect();
        assert_eq!(services, vec!["web", "api", "db"]);
        assert_eq!(*engine.fetched.lock().unwrap(), vec!["page/1", "page/2"]);
    }

    #[tokio::test]
    async fn test_row_keys_follow_column_order() {
        let (client, _) = client(PagedEngine::new(vec![QueryPage {
            columns: columns(&["zeta", "alpha"]),
            data: Some(vec![vec![json!(1), json!(2)]]),
            ..Default::default()
        }]));

        let result = client.execute(&query(), &HeaderMap::new()).await.unwrap();
        let keys: Vec<&String> = result.rows[0].keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[tokio::test]
    async fn test_engine_error_in_later_page() {
        let (client, _) = client(PagedEngine::new(vec![
            QueryPage::default(),
            QueryPage {
                error: Some(WireError {
                    message: "line 1:8: Column 'x' cannot be resolved".to_string(),
                    error_name: Some("COLUMN_NOT_FOUND".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ]));

        let err = client.execute(&query(), &HeaderMap::new()).await.unwrap_err();
        assert!(!err.is_unauthorized());
        assert!(err.message.starts_with("COLUMN_NOT_FOUND"));
    }

    #[test]
    fn test_classify_authorization_errors() {
        let by_name = classify(WireError {
            message: "Access denied".to_string(),
            error_name: Some("PERMISSION_DENIED".to_string()),
            ..Default::default()
        });
        assert!(by_name.is_unauthorized());

        let by_text = classify(WireError {
            message: "Unauthorized: JWT expired".to_string(),
            ..Default::default()
        });
        assert!(by_text.is_unauthorized());
    }

    #[test]
    fn test_zip_row_extra_values() {
        let row = zip_row(&["a".to_string()], vec![json!(1), json!(2)]);
        assert_eq!(row["a"], json!(1));
        assert_eq!(row["_col1"], json!(2));
    }
}
