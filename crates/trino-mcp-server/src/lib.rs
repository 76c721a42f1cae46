//! # trino-mcp-server
//!
//! MCP (Model Context Protocol) server for the Trino MCP gateway.
//!
//! Exposes a fixed set of query tools over JSON-RPC, on stdio or HTTP. Each
//! call is compiled to SQL, executed against Trino with credentials from the
//! shared cache, and returned as a text block.
//!
//! ## Architecture
//!
//! ```text
//! AI Agent
//!       │
//!       │ MCP protocol (list tools / call tool)
//!       ▼
//! ┌──────────────────────┐
//! │  McpServer           │
//! │  1. Validate args    │  ← trino-mcp-core ToolCall
//! │  2. Compile SQL      │  ← trino-mcp-core QueryCompiler
//! │  3. Attach creds     │  ← trino-mcp-auth CredentialManager
//! │  4. Execute          │  ← trino-mcp-engine ExecutionClient
//! │  5. Retry once on    │
//! │     auth failure     │
//! │  6. Return text      │
//! └─────────┬────────────┘
//!           │
//!           ▼
//!         Trino
//! ```

pub mod catalog;
pub mod dispatcher;
pub mod error;
pub mod http_transport;
pub mod protocol;
pub mod server;

pub use catalog::ToolCatalog;
pub use dispatcher::ToolDispatcher;
pub use error::GatewayError;
pub use http_transport::{HttpServer, create_router};
pub use protocol::{
    CallToolParams, CallToolResponse, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ToolContent, ToolDefinition,
};
pub use server::McpServer;
