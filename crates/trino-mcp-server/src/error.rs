//! Error types for the server crate.

use thiserror::Error;
use trino_mcp_auth::CredentialError;
use trino_mcp_core::{ConfigError, ToolError};
use trino_mcp_engine::EngineError;

/// Errors that can occur in the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration was rejected at startup.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unknown tool or bad arguments.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Credentials could not be produced.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The engine rejected or failed the query.
    #[error("query failed: {0}")]
    Engine(#[from] EngineError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
