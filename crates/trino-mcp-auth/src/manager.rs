//! Process-wide credential cache.
//!
//! ## States
//!
//! ```text
//!   ABSENT ──headers(_)──────────► PRESENT ──headers(true)──► PRESENT
//!     │      mint ok                  │        mint ok: new set
//!     │                               │        mint failed: keep old set
//!     └─ mint failed: error, stay ABSENT
//! ```
//!
//! At most one refresh is outstanding. It runs as a spawned task that
//! installs its own result, so a caller that gives up waiting never leaves
//! the cache half-refreshed. Callers arriving while it runs wait on the same
//! shared future instead of minting again.

use crate::credentials::CredentialSet;
use crate::error::CredentialError;
use crate::headers;
use crate::minter::TokenMinter;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::HeaderMap;
use std::sync::{Arc, Mutex, MutexGuard};
use trino_mcp_core::{AuthConfig, AuthMode, EngineConfig, Secret};

type RefreshOutcome = Result<Arc<CredentialSet>, CredentialError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Default)]
struct CacheState {
    current: Option<Arc<CredentialSet>>,
    in_flight: Option<SharedRefresh>,
    refreshes: u64,
}

struct Inner {
    auth: AuthConfig,
    user: String,
    password: Option<Secret>,
    minter: Arc<dyn TokenMinter>,
    state: Mutex<CacheState>,
}

/// Owns the cached [`CredentialSet`] and turns it into request headers.
///
/// Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct CredentialManager {
    inner: Arc<Inner>,
}

impl CredentialManager {
    /// Create a manager. Pre-minted tokens in `auth` seed the cache.
    pub fn new(auth: AuthConfig, engine: &EngineConfig, minter: Arc<dyn TokenMinter>) -> Self {
        let now = Utc::now();
        let seed = match (auth.mode, &auth.access_token, &auth.identity_token) {
            (AuthMode::IdentityBrokered, Some(access), Some(identity)) => Some(
                CredentialSet::brokered(access.clone(), identity.clone(), now),
            ),
            (AuthMode::Bearer, Some(access), _) => Some(CredentialSet::bearer(access.clone(), now)),
            _ => None,
        };

        Self {
            inner: Arc::new(Inner {
                auth,
                user: engine.user.clone(),
                password: engine.password.clone(),
                minter,
                state: Mutex::new(CacheState {
                    current: seed.map(Arc::new),
                    ..Default::default()
                }),
            }),
        }
    }

    /// Credential headers for the next engine request.
    ///
    /// With `force_refresh` the cached tokens are re-minted first (joining a
    /// refresh already in flight if there is one).
    pub async fn headers(&self, force_refresh: bool) -> Result<HeaderMap, CredentialError> {
        match self.inner.auth.mode {
            AuthMode::Basic => {
                let password = self
                    .inner
                    .password
                    .as_ref()
                    .ok_or(CredentialError::MissingSecret("TRINO_PASSWORD"))?;
                headers::basic(&self.inner.user, password.expose())
            }
            AuthMode::Bearer => {
                let credentials = self.credentials(force_refresh).await?;
                headers::bearer(&credentials)
            }
            AuthMode::IdentityBrokered => {
                let credentials = self.credentials(force_refresh).await?;
                headers::brokered(&credentials, &self.inner.auth.identity)
            }
        }
    }

    /// Re-mint the cached tokens, returning whichever set is current afterwards.
    pub async fn force_refresh(&self) -> Result<Arc<CredentialSet>, CredentialError> {
        self.credentials(true).await
    }

    /// The cached set, if any, without triggering a mint.
    pub fn current(&self) -> Option<Arc<CredentialSet>> {
        self.inner.lock().current.clone()
    }

    /// Number of refreshes that have completed, successful or not.
    pub fn refresh_count(&self) -> u64 {
        self.inner.lock().refreshes
    }

    async fn credentials(&self, force_refresh: bool) -> RefreshOutcome {
        if self.inner.auth.mode == AuthMode::Basic {
            return Err(CredentialError::MissingSecret("TRINO_ACCESS_TOKEN"));
        }

        let wants_refresh = force_refresh || self.inner.auth.always_refresh;
        let refresh = {
            let mut state = self.inner.lock();
            // Callers never get the old set while a refresh is running.
            if let Some(in_flight) = state.in_flight.clone() {
                in_flight
            } else {
                if let Some(current) = state.current.clone().filter(|_| !wants_refresh) {
                    return Ok(current);
                }
                let refresh = Inner::start_refresh(&self.inner);
                state.in_flight = Some(refresh.clone());
                refresh
            }
        };

        refresh.await
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // The guarded sections never panic; recover the data if one ever did.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn start_refresh(inner: &Arc<Inner>) -> SharedRefresh {
        let task_inner = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            let mut guard = InFlightGuard {
                inner: task_inner,
                armed: true,
            };
            let minted = guard.inner.mint().await;
            guard.armed = false;
            guard.inner.install(minted)
        });

        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(CredentialError::RefreshAborted(e.to_string())))
        }
        .boxed()
        .shared()
    }

    async fn mint(&self) -> Result<CredentialSet, CredentialError> {
        let datacenter = &self.auth.identity.datacenter;
        match self.auth.mode {
            AuthMode::IdentityBrokered => {
                let identity = self.minter.mint_identity_token(datacenter).await?;
                let access = self.minter.mint_access_token(datacenter).await?;
                Ok(CredentialSet::brokered(
                    Secret::new(access),
                    Secret::new(identity),
                    Utc::now(),
                ))
            }
            AuthMode::Bearer => {
                let access = self.minter.mint_access_token(datacenter).await?;
                Ok(CredentialSet::bearer(Secret::new(access), Utc::now()))
            }
            AuthMode::Basic => Err(CredentialError::MissingSecret("TRINO_ACCESS_TOKEN")),
        }
    }

    fn install(&self, minted: Result<CredentialSet, CredentialError>) -> RefreshOutcome {
        let mut state = self.lock();
        state.in_flight = None;
        state.refreshes += 1;

        match minted {
            Ok(set) => {
                tracing::info!(
                    mode = %self.auth.mode,
                    minted_at = %set.minted_at(),
                    "minted engine credentials"
                );
                let set = Arc::new(set);
                state.current = Some(Arc::clone(&set));
                Ok(set)
            }
            Err(err) => match &state.current {
                Some(previous) => {
                    tracing::warn!(
                        error = %err,
                        minted_at = %previous.minted_at(),
                        "credential refresh failed, keeping previous credentials"
                    );
                    Ok(Arc::clone(previous))
                }
                None => {
                    tracing::error!(error = %err, "credential minting failed");
                    Err(err)
                }
            },
        }
    }
}

/// Clears the stored refresh if the task unwinds or is cancelled before
/// `install` runs, so the next caller starts a fresh mint.
struct InFlightGuard {
    inner: Arc<Inner>,
    armed: bool,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.inner.lock();
            state.in_flight = None;
            state.refreshes += 1;
            tracing::warn!("credential refresh task ended without a result");
        }
    }
}
