//! # trino-mcp-engine
//!
//! Executes compiled queries against Trino.
//!
//! - [`QueryEngine`] is the seam: submit SQL, then follow `nextUri` pages
//! - [`TrinoHttpEngine`] implements it over the Trino REST protocol
//! - [`ExecutionClient`] pairs an engine with the credential cache and
//!   accumulates pages into a [`QueryResult`]
//!
//! Errors are split into authorization failures, which a credential refresh
//! may fix, and everything else. See [`EngineError`].

pub mod client;
pub mod error;
pub mod protocol;
pub mod trino;

pub use client::{ExecutionClient, QueryEngine, QueryResult};
pub use error::{EngineError, EngineErrorKind};
pub use protocol::{Column, QueryPage, WireError};
pub use trino::TrinoHttpEngine;
