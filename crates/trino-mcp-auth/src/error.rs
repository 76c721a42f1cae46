//! Error types for the auth crate.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which token a minting step was producing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identity,
    Access,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identity => f.write_str("identity"),
            TokenKind::Access => f.write_str("access"),
        }
    }
}

/// Errors that can occur while producing credential headers.
///
/// Cloneable so one refresh outcome can be handed to every waiting caller.
/// No variant ever carries token material.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// The minting command failed or produced no token.
    #[error("failed to mint {token} token: {reason}")]
    MintFailed { token: TokenKind, reason: String },

    /// The minting command did not finish in time.
    #[error("minting {token} token timed out after {after:?}")]
    MintTimeout { token: TokenKind, after: Duration },

    /// A required secret is not configured.
    #[error("missing credential: {0} is not set")]
    MissingSecret(&'static str),

    /// The background refresh task did not complete.
    #[error("credential refresh aborted: {0}")]
    RefreshAborted(String),

    /// A credential contained bytes that are not valid in an HTTP header.
    #[error("credential for header {header} contains invalid characters")]
    InvalidHeader { header: &'static str },
}
