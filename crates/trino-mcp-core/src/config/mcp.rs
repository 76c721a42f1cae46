//! MCP transport configuration.

use std::fmt;
use std::str::FromStr;

/// Configuration for the MCP server transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpConfig {
    /// Transport type: "stdio" or "http".
    pub transport: Transport,

    /// HTTP host (only used when transport is HTTP).
    pub host: String,

    /// HTTP port (only used when transport is HTTP).
    pub port: u16,
}

/// MCP transport type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transport {
    /// Newline-delimited JSON-RPC over standard input/output.
    #[default]
    Stdio,
    /// JSON-RPC over HTTP POST.
    Http,
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "http" => Ok(Transport::Http),
            other => Err(format!("unknown transport '{}', expected stdio or http", other)),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Stdio => f.write_str("stdio"),
            Transport::Http => f.write_str("http"),
        }
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

impl McpConfig {
    /// Socket address string for the HTTP transport.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    3000
}
