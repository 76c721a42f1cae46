//! Outbound credential headers.

use crate::credentials::CredentialSet;
use crate::error::CredentialError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use trino_mcp_core::IdentityConfig;

/// Identity attributes consumed positionally by the engine.
pub const EXTRA_CREDENTIAL: &str = "x-trino-extra-credential";

/// Client tags, carrying the organization id.
pub const CLIENT_TAGS: &str = "x-trino-client-tags";

/// `Authorization: Basic base64(user:password)`.
pub fn basic(user: &str, password: &str) -> Result<HeaderMap, CredentialError> {
    let encoded = STANDARD.encode(format!("{}:{}", user, password));
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, sensitive("authorization", &format!("Basic {}", encoded))?);
    Ok(headers)
}

/// `Authorization: Bearer <access token>`.
pub fn bearer(credentials: &CredentialSet) -> Result<HeaderMap, CredentialError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        sensitive(
            "authorization",
            &format!("Bearer {}", credentials.access_token().expose()),
        )?,
    );
    Ok(headers)
}

/// Bearer authorization plus the extra-credentials and client-tags headers.
pub fn brokered(
    credentials: &CredentialSet,
    identity: &IdentityConfig,
) -> Result<HeaderMap, CredentialError> {
    let mut headers = bearer(credentials)?;

    if let Some(extra) = extra_credentials(identity, credentials) {
        headers.insert(
            HeaderName::from_static(EXTRA_CREDENTIAL),
            sensitive(EXTRA_CREDENTIAL, &extra)?,
        );
    }
    if let Some(org_id) = &identity.org_id {
        let value = HeaderValue::from_str(org_id)
            .map_err(|_| CredentialError::InvalidHeader { header: CLIENT_TAGS })?;
        headers.insert(HeaderName::from_static(CLIENT_TAGS), value);
    }
    Ok(headers)
}

/// `orgId=O, clientId=C, userUuid=U, ddAuthJWT=J`, in that order, skipping absent parts.
pub fn extra_credentials(identity: &IdentityConfig, credentials: &CredentialSet) -> Option<String> {
    let parts: Vec<String> = [
        ("orgId", identity.org_id.as_deref()),
        ("clientId", identity.client_id.as_deref()),
        ("userUuid", identity.user_uuid.as_deref()),
        ("ddAuthJWT", credentials.identity_token().map(|t| t.expose())),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| format!("{}={}", key, v)))
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn sensitive(header: &'static str, value: &str) -> Result<HeaderValue, CredentialError> {
    let mut value =
        HeaderValue::from_str(value).map_err(|_| CredentialError::InvalidHeader { header })?;
    value.set_sensitive(true);
    Ok(value)
}
