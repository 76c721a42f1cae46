//! Tool invocation.
//!
//! ```text
//! (name, arguments)
//!   │ ToolCall::parse        unknown tool / bad arguments → isError
//!   ▼
//! QueryCompiler::compile
//!   │ headers(false) → execute
//!   │   authorization failure → headers(true) → execute once more
//!   ▼
//! text block: SQL, row count, rows as JSON
//! ```

use crate::error::GatewayError;
use crate::protocol::CallToolResponse;
use serde_json::Value;
use std::time::Instant;
use trino_mcp_core::{CompiledQuery, QueryCompiler, ToolCall, ToolDefaults};
use trino_mcp_engine::{ExecutionClient, QueryResult};

/// Routes tool calls to the compiler and the engine.
#[derive(Clone)]
pub struct ToolDispatcher {
    client: ExecutionClient,
    defaults: ToolDefaults,
}

impl ToolDispatcher {
    pub fn new(client: ExecutionClient, defaults: ToolDefaults) -> Self {
        Self { client, defaults }
    }

    pub fn defaults(&self) -> &ToolDefaults {
        &self.defaults
    }

    /// Invoke a tool. Failures are reported in the response, never raised.
    pub async fn call(&self, name: &str, arguments: &Value) -> CallToolResponse {
        let started = Instant::now();
        match self.run(name, arguments).await {
            Ok((query, result)) => {
                tracing::info!(
                    tool = name,
                    row_count = result.row_count,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "tool call succeeded"
                );
                match format_result(&query, &result) {
                    Ok(text) => CallToolResponse::text(text),
                    Err(e) => CallToolResponse::error(failure_text(name, &e)),
                }
            }
            Err(e) => {
                tracing::warn!(
                    tool = name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "tool call failed"
                );
                CallToolResponse::error(failure_text(name, &e))
            }
        }
    }

    async fn run(
        &self,
        name: &str,
        arguments: &Value,
    ) -> Result<(CompiledQuery, QueryResult), GatewayError> {
        let call = ToolCall::parse(name, arguments, &self.defaults)?;
        let query = QueryCompiler::compile(&call);
        tracing::debug!(tool = name, sql = %query.sql, "compiled query");

        let headers = self.client.headers(false).await?;
        let result = match self.client.execute(&query, &headers).await {
            Ok(result) => result,
            Err(e) if e.is_unauthorized() => {
                tracing::info!(tool = name, attempt = 2, error = %e, "engine rejected credentials, refreshing");
                let headers = self.client.headers(true).await?;
                self.client.execute(&query, &headers).await?
            }
            Err(e) => return Err(e.into()),
        };
        Ok((query, result))
    }
}

fn format_result(query: &CompiledQuery, result: &QueryResult) -> Result<String, GatewayError> {
    let rows = serde_json::to_string_pretty(&result.rows)?;
    Ok(format!(
        "SQL: {}\n\nRows: {}\n\n{}",
        query.sql, result.row_count, rows
    ))
}

fn failure_text(tool: &str, error: &GatewayError) -> String {
    format!("Error calling {}: {}", tool, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn test_format_result() {
        let query = CompiledQuery {
            sql: "SELECT 1 LIMIT 1".to_string(),
            declared_limit: Some(1),
        };
        let mut row = Map::new();
        row.insert("one".to_string(), json!(1));
        let result = QueryResult {
            columns: vec!["one".to_string()],
            rows: vec![row],
            row_count: 1,
        };

        let text = format_result(&query, &result).unwrap();
        assert!(text.starts_with("SQL: SELECT 1 LIMIT 1\n\nRows: 1\n\n"));
        let rows: Value = serde_json::from_str(text.split("\n\n").nth(2).unwrap()).unwrap();
        assert_eq!(rows, json!([{ "one": 1 }]));
    }

    #[test]
    fn test_failure_text_names_tool() {
        let error = GatewayError::Transport("connection reset".to_string());
        assert_eq!(
            failure_text("query_logs", &error),
            "Error calling query_logs: transport error: connection reset"
        );
    }
}
