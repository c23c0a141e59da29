//! Encrypted storage for Drive authorization grants.
//!
//! Holds the singleton provider config, every authorization grant a client has
//! ever completed, and the stored-file records produced by the upload relay.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │       GrantStore                         │
//! │  - provider config (single active row)   │
//! │  - grants (single active row per client) │
//! │  - stored files                          │
//! └─────────────────────────────────────────┘
//!          ↓                    ↑
//!       (seal)               (open)
//!          ↓                    ↑
//! ┌─────────────────────────────────────────┐
//! │       TokenCipher                        │
//! │  - AES-256-GCM, nonce per value          │
//! └─────────────────────────────────────────┘
//!          ↓                    ↑
//! ┌─────────────────────────────────────────┐
//! │       SQLite Database                    │
//! │  - partial unique indexes on `active`    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use upnafesta::credentials::{GrantStore, NewGrant};
//! use chrono::{Duration, Utc};
//!
//! # fn main() -> anyhow::Result<()> {
//! let encryption_key = std::env::var("UPNAFESTA_ENCRYPTION_KEY")?;
//! let store = GrantStore::new("upnafesta.db", &encryption_key)?;
//!
//! let grant = store.replace_active_grant(
//!     "client-1",
//!     &NewGrant {
//!         access_token: "ya29.token".to_string(),
//!         refresh_token: Some("1//refresh".to_string()),
//!         token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
//!         scopes: vec!["https://www.googleapis.com/auth/drive.file".to_string()],
//!         expires_at: Some(Utc::now() + Duration::hours(1)),
//!         identity_hint: Some("host@example.com".to_string()),
//!     },
//! )?;
//! assert!(grant.active);
//!
//! // Disconnect keeps the row but deactivates it
//! assert_eq!(store.deactivate_grants("client-1")?, 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! - Access tokens, refresh tokens and the app secret are encrypted at rest
//! - The master key lives in memory only (from env var)
//! - Deactivate-then-insert runs in one SQLite transaction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod encryption;
mod locks;
mod storage;

pub use encryption::TokenCipher;
pub use locks::{ClientLockGuard, ClientLocks};
pub use storage::GrantStore;

/// OAuth application registration used for every client's authorization.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderConfig {
    pub id: String,
    /// OAuth client identifier issued by the provider
    pub app_id: String,
    pub app_secret: String,
    /// Fixed callback address registered with the provider
    pub callback_url: String,
    pub scopes: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for activating a new provider config.
#[derive(Clone, Debug)]
pub struct NewProviderConfig {
    pub app_id: String,
    pub app_secret: String,
    pub callback_url: String,
    pub scopes: Vec<String>,
}

/// A delegated-authorization grant owned by one client.
///
/// Grants are never deleted: a refresh updates the row in place and a
/// disconnect only clears `active`.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthorizationGrant {
    pub id: String,
    pub client_ref: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Endpoint that issued the token, used again for renewal
    pub token_endpoint: String,
    pub scopes: Vec<String>,
    /// None = the token does not expire
    pub expires_at: Option<DateTime<Utc>>,
    pub identity_hint: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a grant produced by a successful code exchange.
#[derive(Clone, Debug)]
pub struct NewGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_endpoint: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub identity_hint: Option<String>,
}

/// Record of one guest upload relayed into a client's Drive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    /// File identifier assigned by the provider
    pub provider_file_id: String,
    pub album_ref: String,
    pub client_ref: String,
    pub uploader_name: String,
    pub comment: Option<String>,
    pub filename: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}
