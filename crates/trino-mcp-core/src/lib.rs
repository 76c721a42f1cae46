//! # trino-mcp-core
//!
//! Pure building blocks of the Trino MCP gateway. Nothing in this crate
//! performs I/O: configuration is resolved from an environment snapshot,
//! tool calls are parsed from JSON arguments, and queries are compiled to
//! SQL text.
//!
//! ## Flow
//!
//! ```text
//! (tool name, JSON arguments)
//!       │
//!       ▼
//! ToolCall::parse        ← tool catalog (names, argument specs, defaults)
//!       │
//!       ▼
//! QueryCompiler::compile ← time_range (relative offsets)
//!       │
//!       ▼
//! CompiledQuery { sql, declared_limit }
//! ```
//!
//! ## Tools
//!
//! | Tool | Source | Description |
//! |------|--------|-------------|
//! | `execute_sql` | caller SQL | Run a read-only statement, appending a LIMIT when missing |
//! | `query_logs` | `logs` table function | Search logs, optionally grouped by a field |
//! | `query_spans` | `spans` table function | Search APM spans, optionally scoped to a service |
//! | `query_metrics` | `metrics` table function | Evaluate a metric query |
//! | `list_services` | `spans` table function | Rank services by span volume |

pub mod config;
pub mod error;
pub mod query;
pub mod sql;
pub mod time_range;
pub mod tools;

pub use config::{
    AuthConfig, AuthMode, CommandSpec, EngineConfig, GatewayConfig, IdentityConfig, McpConfig,
    Secret, ToolDefaults, Transport,
};
pub use error::{ConfigError, ToolError};
pub use query::{CompiledQuery, QueryCompiler};
pub use time_range::to_offset_seconds;
pub use tools::{
    Aggregation, ArgSpec, ArgType, ExecuteSqlArgs, ListServicesArgs, LogQueryArgs,
    MetricQueryArgs, SpanQueryArgs, ToolCall, ToolKind, ToolSpec,
};
