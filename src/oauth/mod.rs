//! OAuth 2.0 authorization flow for connecting a client's Google Drive.
//!
//! Implements the authorization code flow:
//! 1. Host clicks "Connect Google Drive" on the dashboard
//! 2. `build_authorization_request` → URL + state for the browser redirect
//! 3. Host consents on the provider's site
//! 4. Provider redirects to the callback with `code` and `state`
//! 5. `complete_authorization` exchanges the code and stores the grant
//! 6. `CredentialRefresher` hands out (and renews) the stored credential

mod exchange;
mod identity;
mod provider;
mod refresher;
mod state;

pub use exchange::{exchange_code, refresh_access_token, TokenSet};
pub use identity::{resolve_identity, IdentityHint, UNAVAILABLE_IDENTITY};
pub use provider::build_auth_url;
pub use refresher::{Credential, CredentialRefresher, EXPIRY_SKEW_SECONDS};
pub use state::{OAuthState, CLIENT_STATE_PREFIX};

use crate::config::ProviderEndpoints;
use crate::credentials::{AuthorizationGrant, ClientLocks, GrantStore, NewGrant, ProviderConfig};
use crate::error::{RelayError, RelayResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Redirect target handed back to the browser.
#[derive(Clone, Debug, Serialize)]
pub struct AuthorizationRequest {
    pub url: String,
    /// Encoded [`OAuthState`]
    pub state: String,
}

/// Negotiates the authorization handshake and records the resulting grant.
pub struct AuthorizationFlow {
    store: Arc<GrantStore>,
    locks: Arc<ClientLocks>,
    http: reqwest::Client,
    endpoints: ProviderEndpoints,
}

impl AuthorizationFlow {
    pub fn new(
        store: Arc<GrantStore>,
        locks: Arc<ClientLocks>,
        http: reqwest::Client,
        endpoints: ProviderEndpoints,
    ) -> Self {
        Self {
            store,
            locks,
            http,
            endpoints,
        }
    }

    fn active_config(&self) -> RelayResult<ProviderConfig> {
        self.store
            .active_provider_config()?
            .ok_or(RelayError::ConfigurationMissing)
    }

    /// Builds the consent URL for `client_ref`.
    ///
    /// # Errors
    /// - `ConfigurationMissing` if no provider config is active
    pub fn build_authorization_request(
        &self,
        client_ref: &str,
        callback_address: &str,
    ) -> RelayResult<AuthorizationRequest> {
        let config = self.active_config()?;
        let state = OAuthState::for_client(client_ref).encode();
        let url = build_auth_url(&self.endpoints.auth_url, &config, &state, callback_address);

        debug!(client_ref = %client_ref, "Built authorization request");

        Ok(AuthorizationRequest { url, state })
    }

    /// Completes the callback: exchanges `code` and makes the new grant the client's active one.
    ///
    /// The state is validated before any network call. The identity lookup
    /// never fails the flow.
    ///
    /// # Errors
    /// - `InvalidState` for a malformed state
    /// - `ConfigurationMissing` if no provider config is active
    /// - `Provider` / `Transport` if the token exchange fails
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
        callback_address: &str,
    ) -> RelayResult<AuthorizationGrant> {
        let state = OAuthState::decode(state)?;
        let client_ref = state.client_ref();
        let config = self.active_config()?;

        debug!(client_ref = %client_ref, "Exchanging authorization code");

        let tokens = exchange_code(
            &self.http,
            &self.endpoints.token_url,
            code,
            callback_address,
            &config.app_id,
            &config.app_secret,
        )
        .await?;

        let identity = resolve_identity(&self.http, &self.endpoints.userinfo_url, &tokens.access_token).await;

        let new_grant = NewGrant {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_endpoint: self.endpoints.token_url.clone(),
            scopes: tokens.scopes.unwrap_or_else(|| config.scopes.clone()),
            expires_at: tokens.expires_at,
            identity_hint: Some(identity.into_stored()),
        };

        let _guard = self.locks.acquire(client_ref).await;
        let grant = self.store.replace_active_grant(client_ref, &new_grant)?;

        info!(
            client_ref = %client_ref,
            has_refresh_token = grant.refresh_token.is_some(),
            "Google Drive connected"
        );

        Ok(grant)
    }
}
