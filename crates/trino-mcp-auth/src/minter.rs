//! Token minting.
//!
//! Tokens come from two opaque external commands, one for the identity JWT
//! and one for the access token. Each prints the token on stdout and exits
//! zero, or exits non-zero on failure.

use crate::error::{CredentialError, TokenKind};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use trino_mcp_core::{AuthConfig, CommandSpec};

/// Longest slice of stderr carried into an error message.
const STDERR_EXCERPT: usize = 200;

/// Source of fresh tokens.
#[async_trait]
pub trait TokenMinter: Send + Sync {
    /// Mint an identity JWT for the datacenter.
    async fn mint_identity_token(&self, datacenter: &str) -> Result<String, CredentialError>;

    /// Mint an access token for the datacenter.
    async fn mint_access_token(&self, datacenter: &str) -> Result<String, CredentialError>;
}

/// Runs the configured minting commands.
#[derive(Debug, Clone)]
pub struct CommandMinter {
    jwt_command: CommandSpec,
    token_command: CommandSpec,
    timeout: Duration,
}

impl CommandMinter {
    pub fn new(jwt_command: CommandSpec, token_command: CommandSpec, timeout: Duration) -> Self {
        Self {
            jwt_command,
            token_command,
            timeout,
        }
    }

    /// Build a minter from the authentication settings.
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self::new(
            auth.jwt_command.clone(),
            auth.token_command.clone(),
            auth.mint_timeout,
        )
    }

    async fn run(
        &self,
        token: TokenKind,
        spec: &CommandSpec,
        datacenter: &str,
    ) -> Result<String, CredentialError> {
        let mut command = Command::new(&spec.program);
        command
            .args(spec.render_args(datacenter))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(%token, program = %spec.program, "running token minting command");

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| CredentialError::MintTimeout {
                token,
                after: self.timeout,
            })?
            .map_err(|e| CredentialError::MintFailed {
                token,
                reason: format!("could not run {}: {}", spec.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
            return Err(CredentialError::MintFailed {
                token,
                reason: format!("{} exited with {}: {}", spec.program, output.status, excerpt),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| CredentialError::MintFailed {
            token,
            reason: format!("{} produced non-UTF-8 output", spec.program),
        })?;
        let value = stdout.trim();
        if value.is_empty() {
            return Err(CredentialError::MintFailed {
                token,
                reason: format!("{} produced no output", spec.program),
            });
        }
        Ok(value.to_string())
    }
}

#[async_trait]
impl TokenMinter for CommandMinter {
    async fn mint_identity_token(&self, datacenter: &str) -> Result<String, CredentialError> {
        self.run(TokenKind::Identity, &self.jwt_command, datacenter)
            .await
    }

    async fn mint_access_token(&self, datacenter: &str) -> Result<String, CredentialError> {
        self.run(TokenKind::Access, &self.token_command, datacenter)
            .await
    }
}
