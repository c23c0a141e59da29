//! Token endpoint calls: authorization-code exchange and refresh-token renewal.

use crate::error::{RelayError, RelayResult};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// OAuth token response (standard OAuth 2.0)
#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Space-separated granted scopes
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// Tokens issued by the provider.
#[derive(Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// None = the provider didn't report a lifetime
    pub expires_at: Option<DateTime<Utc>>,
    /// None = the provider didn't echo the granted scopes
    pub scopes: Option<Vec<String>>,
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        let expires_at = response
            .expires_in
            .map(|seconds| Utc::now() + Duration::seconds(seconds));

        let scopes = response.scope.map(|scope| {
            scope
                .split_whitespace()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        });

        TokenSet {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
            scopes,
        }
    }
}

/// Exchange an authorization code for tokens.
///
/// # Arguments
/// * `token_url` - OAuth token endpoint URL
/// * `code` - Authorization code from callback
/// * `redirect_uri` - Redirect URI used in the authorization request
/// * `client_id` / `client_secret` - Application credentials
pub async fn exchange_code(
    http: &reqwest::Client,
    token_url: &str,
    code: &str,
    redirect_uri: &str,
    client_id: &str,
    client_secret: &str,
) -> RelayResult<TokenSet> {
    tracing::debug!("Exchanging authorization code for token at {}", token_url);

    let form = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", redirect_uri),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];

    let tokens = request_tokens(http, token_url, &form).await?;

    tracing::debug!(
        "Token exchange successful, has_refresh_token={}, expires_at={:?}",
        tokens.refresh_token.is_some(),
        tokens.expires_at
    );

    Ok(tokens)
}

/// Renew an access token with a refresh token.
///
/// The returned `refresh_token` is only set when the provider rotated it.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    token_url: &str,
    refresh_token: &str,
    client_id: &str,
    client_secret: &str,
) -> RelayResult<TokenSet> {
    let form = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];

    request_tokens(http, token_url, &form).await
}

async fn request_tokens(
    http: &reqwest::Client,
    token_url: &str,
    form: &[(&str, &str)],
) -> RelayResult<TokenSet> {
    let response = http
        .post(token_url)
        .header("Accept", "application/json")
        .form(form)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(RelayError::from_response(response).await);
    }

    let status = response.status().as_u16();
    let token_response: TokenResponse =
        response.json().await.map_err(|e| RelayError::Provider {
            status,
            reason: format!("Malformed token response: {}", e),
        })?;

    Ok(token_response.into())
}
