//! The cached credential pair.

use chrono::{DateTime, Utc};
use trino_mcp_core::Secret;

/// Tokens used to authenticate to the engine.
///
/// A set is built whole after minting succeeds and is never mutated; a
/// refresh replaces it. In `ddauth` mode both tokens are always present.
/// In `bearer` mode only the access token is minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSet {
    access_token: Secret,
    identity_token: Option<Secret>,
    minted_at: DateTime<Utc>,
}

impl CredentialSet {
    /// Access token plus identity JWT.
    pub fn brokered(access_token: Secret, identity_token: Secret, minted_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            identity_token: Some(identity_token),
            minted_at,
        }
    }

    /// Access token alone.
    pub fn bearer(access_token: Secret, minted_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            identity_token: None,
            minted_at,
        }
    }

    pub fn access_token(&self) -> &Secret {
        &self.access_token
    }

    pub fn identity_token(&self) -> Option<&Secret> {
        self.identity_token.as_ref()
    }

    pub fn minted_at(&self) -> DateTime<Utc> {
        self.minted_at
    }
}
