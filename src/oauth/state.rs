//! The opaque `state` value carried through the provider redirect.
//!
//! The state only identifies the client the callback belongs to, so the
//! callback can be completed without server-side session storage. It is not
//! signed and does not expire: a callback with a well-formed state for another
//! client is accepted. CSRF protection here is partial at best.

use crate::error::{RelayError, RelayResult};
use std::fmt;

/// Prefix of the only state variant in use.
pub const CLIENT_STATE_PREFIX: &str = "client_id:";

/// Decoded OAuth state.
///
/// New fields must come with a new tagged variant rather than being appended
/// to the client variant's encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OAuthState {
    /// Authorization started for a client. Encoded as `client_id:<client_ref>`.
    Client { client_ref: String },
}

impl OAuthState {
    pub fn for_client(client_ref: &str) -> Self {
        OAuthState::Client {
            client_ref: client_ref.to_string(),
        }
    }

    pub fn client_ref(&self) -> &str {
        match self {
            OAuthState::Client { client_ref } => client_ref,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            OAuthState::Client { client_ref } => format!("{}{}", CLIENT_STATE_PREFIX, client_ref),
        }
    }

    /// Parses a state value returned by the provider.
    ///
    /// # Errors
    /// - `InvalidState` if the prefix is missing or the client ref is empty
    pub fn decode(raw: &str) -> RelayResult<Self> {
        let client_ref = raw
            .strip_prefix(CLIENT_STATE_PREFIX)
            .ok_or_else(|| RelayError::InvalidState("unrecognized state format".to_string()))?;

        if client_ref.trim().is_empty() {
            return Err(RelayError::InvalidState("state has no client reference".to_string()));
        }

        Ok(OAuthState::for_client(client_ref))
    }
}

impl fmt::Display for OAuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
