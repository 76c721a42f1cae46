//! Error types for the core crate.

use thiserror::Error;

/// A configuration value was present but malformed.
///
/// Absence is never an error: every key has a default.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A key carried a value that could not be interpreted.
    #[error("invalid value for {key} ({value:?}): {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while resolving a tool call from its name and arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    /// No tool with this name exists in the catalog.
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// Arguments were missing, mistyped or out of range.
    #[error("invalid arguments for tool {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

impl ToolError {
    pub(crate) fn invalid(tool: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }
}
