pub mod env;
pub use env::apply_env_overrides;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Default location of the TOML config file, overridable with `UPNAFESTA_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "upnafesta.toml";

/// Complete service configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderEndpoints,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

/// HTTP server and persistence settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Externally reachable base URL, used to build the OAuth callback address
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Host dashboard URL the callback redirects back to
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Bearer token guarding the admin endpoints. None = unrestricted (dev mode).
    #[serde(default)]
    pub admin_token: Option<String>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8001".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_database_path() -> String {
    "upnafesta.db".to_string()
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_base_url: default_public_base_url(),
            frontend_url: default_frontend_url(),
            database_path: default_database_path(),
            admin_token: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    /// The fixed OAuth callback address registered with the provider.
    pub fn callback_url(&self) -> String {
        format!(
            "{}/api/auth/google/callback",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

/// Provider endpoints. Defaults point at Google; tests point them at a mock server.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEndpoints {
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,
    #[serde(default = "default_drive_api_base")]
    pub drive_api_base: String,
    #[serde(default = "default_drive_upload_base")]
    pub drive_upload_base: String,
    /// Scopes requested when an admin does not specify any
    #[serde(default = "default_scopes")]
    pub default_scopes: Vec<String>,
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_userinfo_url() -> String {
    "https://www.googleapis.com/oauth2/v2/userinfo".to_string()
}

fn default_drive_api_base() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_drive_upload_base() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

fn default_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/drive.file".to_string(),
        "https://www.googleapis.com/auth/userinfo.email".to_string(),
        "openid".to_string(),
    ]
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            userinfo_url: default_userinfo_url(),
            drive_api_base: default_drive_api_base(),
            drive_upload_base: default_drive_upload_base(),
            default_scopes: default_scopes(),
        }
    }
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Upper bound for every provider call (token exchange, lookups, uploads)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    "UpnaFesta/0.1".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Builds the shared client used for all provider calls.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(std::time::Duration::from_secs(self.timeout_seconds))
            // Drive answers 308 for incomplete resumable uploads; never follow it
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build provider HTTP client")
    }
}

/// Upload relay settings
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Name of the folder auto-created when an album has no destination
    #[serde(default = "default_fallback_folder_name")]
    pub fallback_folder_name: String,
    #[serde(default = "default_fallback_event_label")]
    pub fallback_event_label: String,
    /// Resumable upload chunk size; rounded down to a multiple of 256 KiB.
    /// Each chunk PUT must finish within `http.timeout_seconds`, so the
    /// default 2 MiB needs roughly 550 kbit/s of uplink at the 30 s default.
    #[serde(default = "default_chunk_size_bytes")]
    pub chunk_size_bytes: usize,
}

fn default_fallback_folder_name() -> String {
    "UpnaFesta".to_string()
}

fn default_fallback_event_label() -> String {
    "Album".to_string()
}

fn default_chunk_size_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            fallback_folder_name: default_fallback_folder_name(),
            fallback_event_label: default_fallback_event_label(),
            chunk_size_bytes: default_chunk_size_bytes(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

impl AppConfig {
    /// Loads the TOML file named by `UPNAFESTA_CONFIG` (if present) and applies env overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var("UPNAFESTA_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            load_config(&path)?
        } else {
            AppConfig::default()
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }
}
