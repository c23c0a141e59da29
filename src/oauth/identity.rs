//! Best-effort lookup of the account email behind a fresh access token.

use serde::Deserialize;

/// Placeholder persisted when the account email could not be resolved.
pub const UNAVAILABLE_IDENTITY: &str = "email_unavailable@example.com";

/// Outcome of the identity lookup. Never a failure of the surrounding flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityHint {
    Resolved(String),
    Unavailable,
}

impl IdentityHint {
    /// Value written to the grant's `identity_hint` column.
    pub fn into_stored(self) -> String {
        match self {
            IdentityHint::Resolved(email) => email,
            IdentityHint::Unavailable => UNAVAILABLE_IDENTITY.to_string(),
        }
    }

    /// Reads back a stored hint, mapping the placeholder to `Unavailable`.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some(email) if !email.is_empty() && email != UNAVAILABLE_IDENTITY => {
                IdentityHint::Resolved(email.to_string())
            }
            _ => IdentityHint::Unavailable,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            IdentityHint::Resolved(email) => Some(email),
            IdentityHint::Unavailable => None,
        }
    }
}

#[derive(Deserialize)]
struct UserInfo {
    #[serde(default)]
    email: Option<String>,
}

/// Asks the userinfo endpoint who owns `access_token`.
///
/// Any failure (transport, status, body) is logged and yields `Unavailable`.
pub async fn resolve_identity(
    http: &reqwest::Client,
    userinfo_url: &str,
    access_token: &str,
) -> IdentityHint {
    let response = match http.get(userinfo_url).bearer_auth(access_token).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Identity lookup failed, continuing without email");
            return IdentityHint::Unavailable;
        }
    };

    if !response.status().is_success() {
        tracing::warn!(
            status = %response.status(),
            "Identity lookup rejected, continuing without email"
        );
        return IdentityHint::Unavailable;
    }

    match response.json::<UserInfo>().await {
        Ok(UserInfo { email: Some(email) }) if !email.is_empty() => IdentityHint::Resolved(email),
        Ok(_) => {
            tracing::warn!("Identity lookup returned no email");
            IdentityHint::Unavailable
        }
        Err(e) => {
            tracing::warn!(error = %e, "Identity lookup returned an unreadable body");
            IdentityHint::Unavailable
        }
    }
}
