//! Configuration for the Trino MCP gateway.
//!
//! All settings come from environment variables. [`GatewayConfig::resolve`]
//! is a pure function over an environment snapshot so it can be tested
//! without touching the process environment; [`GatewayConfig::from_env`]
//! takes the snapshot.
//!
//! Absent or empty keys fall back to their documented defaults. A value that
//! is present but malformed is a [`ConfigError`], surfaced at startup.

pub mod auth;
pub mod mcp;

use crate::error::ConfigError;
use crate::time_range;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub use auth::{AuthConfig, AuthMode, CommandSpec, IdentityConfig, Secret};
pub use mcp::{McpConfig, Transport};

/// Environment variable names.
pub mod keys {
    pub const TRINO_SERVER: &str = "TRINO_SERVER";
    pub const TRINO_CATALOG: &str = "TRINO_CATALOG";
    pub const TRINO_SCHEMA: &str = "TRINO_SCHEMA";
    pub const TRINO_USER: &str = "TRINO_USER";
    pub const TRINO_PASSWORD: &str = "TRINO_PASSWORD";
    pub const TRINO_AUTH_TYPE: &str = "TRINO_AUTH_TYPE";
    pub const TRINO_ACCESS_TOKEN: &str = "TRINO_ACCESS_TOKEN";
    pub const DD_ACCESS_TOKEN: &str = "DD_ACCESS_TOKEN";
    pub const DD_AUTH_JWT: &str = "DD_AUTH_JWT";
    pub const DD_ORG_ID: &str = "DD_ORG_ID";
    pub const DD_CLIENT_ID: &str = "DD_CLIENT_ID";
    pub const DD_USER_UUID: &str = "DD_USER_UUID";
    pub const DD_DATACENTER: &str = "DD_DATACENTER";
    pub const DD_ALWAYS_REFRESH: &str = "DD_ALWAYS_REFRESH";
    pub const DD_JWT_COMMAND: &str = "DD_JWT_COMMAND";
    pub const DD_TOKEN_COMMAND: &str = "DD_TOKEN_COMMAND";
    pub const MINT_TIMEOUT_SECS: &str = "TRINO_MCP_MINT_TIMEOUT_SECS";
    pub const DEFAULT_TIME_RANGE: &str = "TRINO_MCP_DEFAULT_TIME_RANGE";
    pub const DEFAULT_LIMIT: &str = "TRINO_MCP_DEFAULT_LIMIT";
    pub const TRANSPORT: &str = "TRINO_MCP_TRANSPORT";
    pub const HOST: &str = "TRINO_MCP_HOST";
    pub const PORT: &str = "TRINO_MCP_PORT";
}

/// Largest row limit a tool call may request.
pub const MAX_LIMIT: u64 = 10_000;

/// Complete gateway configuration. Built once at startup, shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub engine: EngineConfig,
    pub auth: AuthConfig,
    pub defaults: ToolDefaults,
    pub mcp: McpConfig,
}

/// Engine connection target and session defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Base URL of the coordinator, e.g. `https://trino.example.com`.
    pub server: Url,
    pub catalog: String,
    pub schema: String,
    pub user: String,
    pub password: Option<Secret>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            catalog: "datadog".to_string(),
            schema: "default".to_string(),
            user: "datadog".to_string(),
            password: None,
        }
    }
}

/// Argument defaults advertised in the tool catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefaults {
    pub time_range: String,
    pub limit: u64,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            time_range: "1h".to_string(),
            limit: 100,
        }
    }
}

fn default_server() -> Url {
    Url::parse("http://localhost:8080").expect("default server URL is valid")
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            auth: AuthConfig::default(),
            defaults: ToolDefaults::default(),
            mcp: McpConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Resolve configuration from the current process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::resolve(&env)
    }

    /// Resolve configuration from an environment snapshot.
    pub fn resolve(env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let env = EnvReader { env };
        let defaults = GatewayConfig::default();

        let server = match env.get(keys::TRINO_SERVER) {
            Some(raw) => parse_server(raw)?,
            None => defaults.engine.server,
        };

        let engine = EngineConfig {
            server,
            catalog: env.string_or(keys::TRINO_CATALOG, defaults.engine.catalog),
            schema: env.string_or(keys::TRINO_SCHEMA, defaults.engine.schema),
            user: env.string_or(keys::TRINO_USER, defaults.engine.user),
            password: env.get(keys::TRINO_PASSWORD).map(Secret::new),
        };

        let mode = match env.get(keys::TRINO_AUTH_TYPE) {
            Some(raw) => raw
                .parse::<AuthMode>()
                .map_err(|reason| ConfigError::invalid(keys::TRINO_AUTH_TYPE, raw, reason))?,
            None => defaults.auth.mode,
        };

        let auth = AuthConfig {
            mode,
            identity: IdentityConfig {
                org_id: env.owned(keys::DD_ORG_ID),
                client_id: env.owned(keys::DD_CLIENT_ID),
                user_uuid: env.owned(keys::DD_USER_UUID),
                datacenter: env.string_or(keys::DD_DATACENTER, defaults.auth.identity.datacenter),
            },
            access_token: env
                .get(keys::TRINO_ACCESS_TOKEN)
                .or_else(|| env.get(keys::DD_ACCESS_TOKEN))
                .map(Secret::new),
            identity_token: env.get(keys::DD_AUTH_JWT).map(Secret::new),
            always_refresh: env.bool_or(keys::DD_ALWAYS_REFRESH, defaults.auth.always_refresh)?,
            jwt_command: env.command_or(keys::DD_JWT_COMMAND, defaults.auth.jwt_command)?,
            token_command: env.command_or(keys::DD_TOKEN_COMMAND, defaults.auth.token_command)?,
            mint_timeout: match env.get(keys::MINT_TIMEOUT_SECS) {
                Some(raw) => {
                    let secs: u64 = env.number(keys::MINT_TIMEOUT_SECS, raw)?;
                    if secs == 0 {
                        return Err(ConfigError::invalid(
                            keys::MINT_TIMEOUT_SECS,
                            raw,
                            "timeout must be at least one second",
                        ));
                    }
                    Duration::from_secs(secs)
                }
                None => defaults.auth.mint_timeout,
            },
        };

        let time_range = env.string_or(keys::DEFAULT_TIME_RANGE, defaults.defaults.time_range);
        if time_range::parse_offset(&time_range).is_none() {
            return Err(ConfigError::invalid(
                keys::DEFAULT_TIME_RANGE,
                &time_range,
                "expected <integer><m|h|d>, e.g. 1h",
            ));
        }

        let limit = match env.get(keys::DEFAULT_LIMIT) {
            Some(raw) => {
                let limit: u64 = env.number(keys::DEFAULT_LIMIT, raw)?;
                if limit == 0 || limit > MAX_LIMIT {
                    return Err(ConfigError::invalid(
                        keys::DEFAULT_LIMIT,
                        raw,
                        format!("limit must be between 1 and {}", MAX_LIMIT),
                    ));
                }
                limit
            }
            None => defaults.defaults.limit,
        };

        let mcp = McpConfig {
            transport: match env.get(keys::TRANSPORT) {
                Some(raw) => raw
                    .parse::<Transport>()
                    .map_err(|reason| ConfigError::invalid(keys::TRANSPORT, raw, reason))?,
                None => defaults.mcp.transport,
            },
            host: env.string_or(keys::HOST, defaults.mcp.host),
            port: match env.get(keys::PORT) {
                Some(raw) => env.number(keys::PORT, raw)?,
                None => defaults.mcp.port,
            },
        };

        Ok(Self {
            engine,
            auth,
            defaults: ToolDefaults { time_range, limit },
            mcp,
        })
    }
}

fn parse_server(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::invalid(keys::TRINO_SERVER, raw, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::invalid(
            keys::TRINO_SERVER,
            raw,
            format!("unsupported scheme '{}'", other),
        )),
    }
}

/// Read-only view over an environment snapshot that treats blank values as absent.
struct EnvReader<'a> {
    env: &'a HashMap<String, String>,
}

impl<'a> EnvReader<'a> {
    fn get(&self, key: &str) -> Option<&'a str> {
        self.env
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn owned(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    fn string_or(&self, key: &str, default: String) -> String {
        self.owned(key).unwrap_or(default)
    }

    fn number<T: std::str::FromStr>(&self, key: &'static str, raw: &str) -> Result<T, ConfigError> {
        raw.parse::<T>()
            .map_err(|_| ConfigError::invalid(key, raw, "expected a non-negative integer"))
    }

    fn bool_or(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::invalid(key, raw, "expected a boolean")),
        }
    }

    fn command_or(&self, key: &'static str, default: CommandSpec) -> Result<CommandSpec, ConfigError> {
        match self.get(key) {
            Some(raw) => CommandSpec::parse(raw)
                .ok_or_else(|| ConfigError::invalid(key, raw, "command must not be empty")),
            None => Ok(default),
        }
    }
}
