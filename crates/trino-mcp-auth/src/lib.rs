//! # trino-mcp-auth
//!
//! Credential handling for the Trino MCP gateway.
//!
//! This crate provides:
//! - A process-wide credential cache ([`CredentialManager`]) that mints
//!   tokens lazily, serves them until a refresh is forced, and collapses
//!   concurrent refresh requests into a single minting run
//! - The [`TokenMinter`] seam, with [`CommandMinter`] running the external
//!   minting commands
//! - Outbound header construction for each authentication mode
//!
//! ## Modes
//!
//! | Mode | Authorization | Extra credentials | Minting |
//! |------|---------------|-------------------|---------|
//! | `basic` | `Basic base64(user:password)` | none | never |
//! | `bearer` | `Bearer <access token>` | none | access token only |
//! | `ddauth` | `Bearer <access token>` | `orgId, clientId, userUuid, ddAuthJWT` | identity JWT, then access token |

pub mod credentials;
pub mod error;
pub mod headers;
pub mod manager;
pub mod minter;

pub use credentials::CredentialSet;
pub use error::{CredentialError, TokenKind};
pub use manager::CredentialManager;
pub use minter::{CommandMinter, TokenMinter};
