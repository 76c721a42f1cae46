//! Fakes shared by the server integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use trino_mcp_auth::{CredentialError, CredentialManager, TokenMinter};
use trino_mcp_core::{AuthConfig, AuthMode, EngineConfig, IdentityConfig, ToolDefaults};
use trino_mcp_engine::{Column, EngineError, ExecutionClient, QueryEngine, QueryPage};
use trino_mcp_server::ToolDispatcher;

/// Counts mints and hands out numbered tokens.
#[derive(Default)]
pub struct CountingMinter {
    pub identity_calls: AtomicUsize,
    pub access_calls: AtomicUsize,
}

#[async_trait]
impl TokenMinter for CountingMinter {
    async fn mint_identity_token(&self, _datacenter: &str) -> Result<String, CredentialError> {
        let n = self.identity_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("jwt-{}", n))
    }

    async fn mint_access_token(&self, _datacenter: &str) -> Result<String, CredentialError> {
        let n = self.access_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("access-{}", n))
    }
}

/// Replays scripted submit outcomes and records what it was sent.
#[derive(Default)]
pub struct ScriptedEngine {
    script: Mutex<VecDeque<Result<QueryPage, EngineError>>>,
    pub submitted: Mutex<Vec<String>>,
    pub authorizations: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Result<QueryPage, EngineError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

#[async_trait]
impl QueryEngine for ScriptedEngine {
    async fn submit(&self, sql: &str, headers: &HeaderMap) -> Result<QueryPage, EngineError> {
        self.submitted.lock().unwrap().push(sql.to_string());
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.authorizations.lock().unwrap().push(authorization);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::unauthorized("HTTP 401 Unauthorized")))
    }

    async fn fetch(&self, next_uri: &str, _headers: &HeaderMap) -> Result<QueryPage, EngineError> {
        Err(EngineError::other(format!("unexpected fetch of {}", next_uri)))
    }
}

pub fn rows_page(column: &str, values: &[Value]) -> QueryPage {
    QueryPage {
        columns: Some(vec![Column {
            name: column.to_string(),
            column_type: "varchar".to_string(),
        }]),
        data: Some(values.iter().map(|v| vec![v.clone()]).collect()),
        ..Default::default()
    }
}

pub fn ok_page() -> QueryPage {
    rows_page("service", &[json!("web"), json!("api")])
}

pub fn brokered_auth() -> AuthConfig {
    AuthConfig {
        mode: AuthMode::IdentityBrokered,
        identity: IdentityConfig {
            org_id: Some("O".to_string()),
            client_id: Some("C".to_string()),
            user_uuid: Some("U".to_string()),
            datacenter: "us1.prod.dog".to_string(),
        },
        ..Default::default()
    }
}

pub fn dispatcher(
    engine: Arc<ScriptedEngine>,
    minter: Arc<CountingMinter>,
) -> (ToolDispatcher, CredentialManager) {
    let manager = CredentialManager::new(brokered_auth(), &EngineConfig::default(), minter);
    let client = ExecutionClient::new(engine, manager.clone());
    (ToolDispatcher::new(client, ToolDefaults::default()), manager)
}
