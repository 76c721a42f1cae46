//! HTTP transport for MCP server.
//!
//! JSON-RPC over `POST /mcp`, one request per HTTP request.

use crate::error::GatewayError;
use crate::server::{McpServer, SERVER_NAME, parse_request};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router for MCP.
pub fn create_router(server: McpServer) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp_post))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Handle POST requests to /mcp (JSON-RPC over HTTP).
async fn handle_mcp_post(State(server): State<McpServer>, body: String) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(response) => return (StatusCode::OK, Json(response)).into_response(),
    };

    match server.handle_request(request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Handle health check requests.
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// HTTP server for MCP transport.
pub struct HttpServer {
    addr: String,
    server: McpServer,
}

impl HttpServer {
    pub fn new(addr: impl Into<String>, server: McpServer) -> Self {
        Self {
            addr: addr.into(),
            server,
        }
    }

    /// Run the HTTP server until interrupted.
    pub async fn run(self) -> Result<(), GatewayError> {
        let app = create_router(self.server);

        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| GatewayError::Transport(format!("failed to bind to {}: {}", self.addr, e)))?;

        tracing::info!(addr = %self.addr, "MCP HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutting down MCP HTTP server");
            })
            .await?;

        Ok(())
    }
}
