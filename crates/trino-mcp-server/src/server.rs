//! MCP server implementation.
//!
//! This module provides the JSON-RPC method dispatch shared by both
//! transports, and the stdio transport itself.

use crate::catalog::ToolCatalog;
use crate::dispatcher::ToolDispatcher;
use crate::error::GatewayError;
use crate::http_transport::HttpServer;
use crate::protocol::*;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use trino_mcp_core::{McpConfig, Transport};

pub const SERVER_NAME: &str = "trino-mcp";

/// The MCP server. Cheap to clone; clones share the dispatcher.
#[derive(Clone)]
pub struct McpServer {
    config: McpConfig,
    catalog: Arc<ToolCatalog>,
    dispatcher: ToolDispatcher,
}

impl McpServer {
    /// Create a server advertising the catalog for the dispatcher's defaults.
    pub fn new(config: McpConfig, dispatcher: ToolDispatcher) -> Self {
        let catalog = ToolCatalog::new(dispatcher.defaults());
        Self {
            config,
            catalog: Arc::new(catalog),
            dispatcher,
        }
    }

    /// Start the MCP server on the configured transport.
    pub async fn run(&self) -> Result<(), GatewayError> {
        match self.config.transport {
            Transport::Stdio => self.run_stdio().await,
            Transport::Http => self.run_http().await,
        }
    }

    /// Run the server with stdio transport.
    pub async fn run_stdio(&self) -> Result<(), GatewayError> {
        tracing::info!("Starting MCP server with stdio transport");
        self.serve_lines(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await?;
        Ok(())
    }

    /// Serve newline-delimited JSON-RPC from `reader` until it reaches EOF.
    ///
    /// Each request is handled on its own task; a single writer task owns
    /// `writer` so responses are never interleaved. A line that is not valid
    /// UTF-8 gets a parse error response like any other malformed message.
    /// Returns the writer once every response has been written.
    pub async fn serve_lines<R, W>(&self, mut reader: R, writer: W) -> Result<W, GatewayError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(response) = rx.recv().await {
                let mut line = serde_json::to_vec(&response)?;
                line.push(b'\n');
                writer.write_all(&line).await?;
                writer.flush().await?;
            }
            Ok::<_, GatewayError>(writer)
        });

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let request = match decode_line(&buf) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(response) => {
                    let _ = tx.send(response);
                    continue;
                }
            };

            let server = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle_request(request).await {
                    let _ = tx.send(response);
                }
            });
        }

        // Input closed; let in-flight requests finish writing.
        drop(tx);
        writer
            .await
            .map_err(|e| GatewayError::Transport(format!("response writer failed: {}", e)))?
    }

    /// Run the server with HTTP transport.
    pub async fn run_http(&self) -> Result<(), GatewayError> {
        HttpServer::new(self.config.bind_address(), self.clone())
            .run()
            .await
    }

    /// Handle a JSON-RPC request. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "notification");
            return None;
        }
        let id = request.id.clone();

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" | "notifications/initialized" | "ping" => {
                JsonRpcResponse::success(id, json!({}))
            }
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ListToolsResponse {
            tools: self.catalog.list().to_vec(),
        };
        match serde_json::to_value(result) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e));
                }
            },
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let response = self.dispatcher.call(&params.name, &params.arguments).await;
        match serde_json::to_value(response) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }
}

/// Decode one raw input line. Blank lines decode to `None`.
fn decode_line(bytes: &[u8]) -> Result<Option<JsonRpcRequest>, JsonRpcResponse> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {}", e)))?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    parse_request(text).map(Some)
}

/// Decode one JSON-RPC message, or the error response to send instead.
pub fn parse_request(text: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {}", e)))?;
    let id = value.get("id").cloned();
    serde_json::from_value(value)
        .map_err(|e| JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid request: {}", e)))
}
