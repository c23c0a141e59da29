//! Typed failures surfaced by the authorization flow and the storage relay.

use thiserror::Error;

/// Failure taxonomy for the Drive connection and upload relay.
///
/// Callers decide the user-facing message; nothing here is retried internally.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No active provider config. An administrator has to configure one.
    #[error("Google Drive integration is not configured")]
    ConfigurationMissing,

    /// The OAuth callback carried a state value that could not be decoded.
    #[error("Invalid OAuth state: {0}")]
    InvalidState(String),

    /// No usable credential for the client. The host must re-authorize.
    #[error("Client has no Google Drive connection")]
    NotConnected,

    /// The provider answered with a non-success HTTP status.
    #[error("Provider returned {status}: {reason}")]
    Provider { status: u16, reason: String },

    /// A destination folder was needed but could not be created.
    #[error("Could not create a destination folder")]
    DestinationUnavailable,

    /// The request to the provider never produced a response.
    #[error("Provider request failed: {0}")]
    Transport(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl RelayError {
    /// Builds a `Provider` error from a failed response, consuming its body as the reason.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let reason = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        } else {
            body
        };

        RelayError::Provider {
            status: status.as_u16(),
            reason,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Transport(err.to_string())
    }
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;
