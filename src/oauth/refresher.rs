//! Turns the stored active grant into a usable credential, renewing it when stale.

use super::exchange;
use crate::credentials::{AuthorizationGrant, ClientLocks, GrantStore, ProviderConfig};
use crate::error::RelayResult;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tokens expiring within this window are treated as already expired.
pub const EXPIRY_SKEW_SECONDS: i64 = 300;

/// A grant joined with the app credentials needed to renew it.
#[derive(Clone)]
pub struct Credential {
    pub grant_id: String,
    pub client_ref: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_endpoint: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("grant_id", &self.grant_id)
            .field("client_ref", &self.client_ref)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl Credential {
    fn from_grant(grant: AuthorizationGrant, config: Option<&ProviderConfig>) -> Self {
        Self {
            grant_id: grant.id,
            client_ref: grant.client_ref,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            token_endpoint: grant.token_endpoint,
            scopes: grant.scopes,
            expires_at: grant.expires_at,
            app_id: config.map(|c| c.app_id.clone()),
            app_secret: config.map(|c| c.app_secret.clone()),
        }
    }

    /// True when the token has no expiry or expires after the skew window.
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }

    fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now + Duration::seconds(EXPIRY_SKEW_SECONDS),
            None => true,
        }
    }
}

/// Loads and renews client credentials.
pub struct CredentialRefresher {
    store: Arc<GrantStore>,
    locks: Arc<ClientLocks>,
    http: reqwest::Client,
}

impl CredentialRefresher {
    pub fn new(store: Arc<GrantStore>, locks: Arc<ClientLocks>, http: reqwest::Client) -> Self {
        Self { store, locks, http }
    }

    /// Returns a usable credential for the client, or `None` if the client must re-authorize.
    ///
    /// A stale credential with a refresh token is renewed once and the same
    /// grant row is updated in place. A failed renewal is not an error: it
    /// yields `None`. Only storage failures are returned as errors.
    pub async fn resolve_active_credential(&self, client_ref: &str) -> RelayResult<Option<Credential>> {
        let _guard = self.locks.acquire(client_ref).await;

        let Some(grant) = self.store.active_grant(client_ref)? else {
            debug!(client_ref = %client_ref, "No active grant");
            return Ok(None);
        };

        let config = self.store.active_provider_config()?;
        let mut credential = Credential::from_grant(grant, config.as_ref());

        if credential.is_fresh() {
            return Ok(Some(credential));
        }

        let Some(refresh_token) = credential.refresh_token.clone() else {
            warn!(client_ref = %client_ref, "Access token expired and no refresh token stored");
            return Ok(None);
        };

        let (Some(app_id), Some(app_secret)) = (&credential.app_id, &credential.app_secret) else {
            warn!(client_ref = %client_ref, "Cannot refresh token without an active provider config");
            return Ok(None);
        };

        info!(client_ref = %client_ref, "Refreshing expired access token");

        let tokens = match exchange::refresh_access_token(
            &self.http,
            &credential.token_endpoint,
            &refresh_token,
            app_id,
            app_secret,
        )
        .await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(client_ref = %client_ref, error = %e, "Token refresh failed");
                return Ok(None);
            }
        };

        let updated = self.store.update_grant_tokens(
            &credential.grant_id,
            &tokens.access_token,
            tokens.refresh_token.as_deref(),
            tokens.expires_at,
        )?;

        if !updated {
            warn!(client_ref = %client_ref, "Grant was deactivated during refresh");
            return Ok(None);
        }

        credential.access_token = tokens.access_token;
        if let Some(rotated) = tokens.refresh_token {
            credential.refresh_token = Some(rotated);
        }
        credential.expires_at = tokens.expires_at;

        info!(
            client_ref = %client_ref,
            expires_at = ?credential.expires_at,
            "Access token refreshed"
        );

        Ok(Some(credential))
    }
}
