//! Concurrency behavior of the credential cache.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use trino_mcp_auth::{CredentialError, CredentialManager, TokenMinter};
use trino_mcp_core::{AuthConfig, AuthMode, EngineConfig, IdentityConfig};

/// Blocks every identity mint until the gate is opened.
struct GatedMinter {
    gate: Notify,
    identity_calls: AtomicUsize,
    access_calls: AtomicUsize,
}

impl GatedMinter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            identity_calls: AtomicUsize::new(0),
            access_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TokenMinter for GatedMinter {
    async fn mint_identity_token(&self, _datacenter: &str) -> Result<String, CredentialError> {
        let n = self.identity_calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(format!("jwt-{}", n))
    }

    async fn mint_access_token(&self, _datacenter: &str) -> Result<String, CredentialError> {
        let n = self.access_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("access-{}", n))
    }
}

fn manager(minter: Arc<dyn TokenMinter>) -> CredentialManager {
    let auth = AuthConfig {
        mode: AuthMode::IdentityBrokered,
        identity: IdentityConfig {
            org_id: Some("O".to_string()),
            client_id: Some("C".to_string()),
            user_uuid: Some("U".to_string()),
            datacenter: "us1.prod.dog".to_string(),
        },
        ..Default::default()
    };
    CredentialManager::new(auth, &EngineConfig::default(), minter)
}

/// Panics on the first identity mint, then behaves.
struct PanicOnceMinter {
    calls: AtomicUsize,
}

#[async_trait]
impl TokenMinter for PanicOnceMinter {
    async fn mint_identity_token(&self, _datacenter: &str) -> Result<String, CredentialError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            panic!("minter bug");
        }
        Ok(format!("jwt-{}", n))
    }

    async fn mint_access_token(&self, _datacenter: &str) -> Result<String, CredentialError> {
        Ok("access".to_string())
    }
}

#[tokio::test]
async fn concurrent_forced_refreshes_mint_once() {
    let minter = GatedMinter::new();
    let manager = manager(minter.clone());

    let callers = (0..8).map(|_| manager.headers(true));
    let (results, ()) = tokio::join!(join_all(callers), async {
        tokio::task::yield_now().await;
        minter.gate.notify_one();
    });

    assert_eq!(minter.identity_calls.load(Ordering::SeqCst), 1);
    assert_eq!(minter.access_calls.load(Ordering::SeqCst), 1);
    assert_eq!(manager.refresh_count(), 1);

    let expected = "orgId=O, clientId=C, userUuid=U, ddAuthJWT=jwt-0";
    for headers in results {
        let headers = headers.unwrap();
        assert_eq!(headers["authorization"], "Bearer access-0");
        assert_eq!(headers["x-trino-extra-credential"], expected);
        assert_eq!(headers["x-trino-client-tags"], "O");
    }
}

#[tokio::test]
async fn plain_callers_wait_for_running_refresh() {
    let minter = GatedMinter::new();
    let manager = manager(minter.clone());

    let forced = manager.headers(true);
    let plain = manager.headers(false);
    let (forced, plain, ()) = tokio::join!(forced, plain, async {
        tokio::task::yield_now().await;
        minter.gate.notify_one();
    });

    assert_eq!(forced.unwrap(), plain.unwrap());
    assert_eq!(minter.identity_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn abandoned_caller_does_not_cancel_refresh() {
    let minter = GatedMinter::new();
    let manager = manager(minter.clone());

    // Give up on the refresh before minting can finish.
    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), manager.headers(true)).await;
    assert!(abandoned.is_err());
    assert!(manager.current().is_none());

    minter.gate.notify_one();
    for _ in 0..100 {
        if manager.current().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let installed = manager.current().expect("refresh should install its result");
    assert_eq!(installed.identity_token().unwrap().expose(), "jwt-0");

    // The installed set is served without another mint.
    manager.headers(false).await.unwrap();
    assert_eq!(minter.identity_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sequential_forced_refreshes_each_mint() {
    let minter = GatedMinter::new();
    let manager = manager(minter.clone());

    for expected in 1..=3 {
        minter.gate.notify_one();
        manager.force_refresh().await.unwrap();
        assert_eq!(minter.identity_calls.load(Ordering::SeqCst), expected);
    }
    let current = manager.current().unwrap();
    assert_eq!(current.identity_token().unwrap().expose(), "jwt-2");
}

#[tokio::test]
async fn panicked_refresh_does_not_wedge_the_cache() {
    let minter = Arc::new(PanicOnceMinter {
        calls: AtomicUsize::new(0),
    });
    let manager = manager(minter.clone());

    let err = manager.headers(false).await.unwrap_err();
    assert!(matches!(err, CredentialError::RefreshAborted(_)), "{}", err);
    assert!(manager.current().is_none());

    let headers = manager.headers(false).await.unwrap();
    assert_eq!(headers["authorization"], "Bearer access");
    assert_eq!(minter.calls.load(Ordering::SeqCst), 2);

    manager.headers(true).await.unwrap();
    assert_eq!(minter.calls.load(Ordering::SeqCst), 3);
    assert_eq!(manager.current().unwrap().identity_token().unwrap().expose(), "jwt-2");
}
