use super::{AppError, AppState};
use crate::auth::authorize_admin;
use crate::credentials::{NewProviderConfig, ProviderConfig};
use crate::error::RelayError;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Body of POST /api/admin/provider-config
#[derive(Deserialize)]
pub struct ProviderConfigRequest {
    pub app_id: String,
    pub app_secret: String,
    /// Defaults to the service's own callback address
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

/// Provider config as shown to administrators. The secret never leaves the store.
#[derive(Serialize)]
pub struct ProviderConfigView {
    pub id: String,
    pub app_id: String,
    pub app_secret: String,
    pub callback_url: String,
    pub scopes: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ProviderConfig> for ProviderConfigView {
    fn from(config: ProviderConfig) -> Self {
        Self {
            id: config.id,
            app_id: config.app_id,
            app_secret: mask_secret(&config.app_secret),
            callback_url: config.callback_url,
            scopes: config.scopes,
            active: config.active,
            created_at: config.created_at,
        }
    }
}

/// Keeps the last four characters of secrets long enough to spare them.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    authorize_admin(headers, state.admin_token.as_deref()).map_err(|e| {
        warn!(error = %e, "Admin request rejected");
        AppError::Unauthorized("Unauthorized".to_string())
    })
}

/// Where the admin registers this service with the provider.
#[derive(Serialize)]
pub struct RedirectUrisResponse {
    pub callback_url: String,
    pub instructions: Vec<String>,
}

/// GET /api/admin/google-redirect-uris - the callback URL to register in the
/// Google Cloud console. Available before any provider config exists.
pub(super) async fn get_redirect_uris(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RedirectUrisResponse>, AppError> {
    require_admin(&state, &headers)?;

    Ok(Json(RedirectUrisResponse {
        callback_url: state.callback_url.clone(),
        instructions: vec![
            "Open https://console.cloud.google.com/apis/credentials".to_string(),
            "Edit the OAuth 2.0 client used by this service".to_string(),
            format!("Add {} under 'Authorized redirect URIs'", state.callback_url),
            "Save, then POST the client id and secret to /api/admin/provider-config".to_string(),
        ],
    }))
}

/// POST /api/admin/provider-config - activates a new provider config.
pub(super) async fn set_provider_config(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ProviderConfigRequest>,
) -> Result<Response, AppError> {
    require_admin(&state, &headers)?;

    if request.app_id.trim().is_empty() || request.app_secret.trim().is_empty() {
        return Err(AppError::BadRequest(
            "app_id and app_secret are required".to_string(),
        ));
    }

    let scopes = match request.scopes {
        Some(scopes) if !scopes.is_empty() => scopes,
        _ => state.default_scopes.clone(),
    };

    let config = state.store.activate_provider_config(&NewProviderConfig {
        app_id: request.app_id.trim().to_string(),
        app_secret: request.app_secret.trim().to_string(),
        callback_url: request
            .callback_url
            .unwrap_or_else(|| state.callback_url.clone()),
        scopes,
    })
    .map_err(|e| AppError::from(RelayError::Storage(e)))?;

    info!(config_id = %config.id, app_id = %config.app_id, "Provider config activated");

    Ok((StatusCode::CREATED, Json(ProviderConfigView::from(config))).into_response())
}

/// GET /api/admin/provider-config - the active provider config, secret masked.
pub(super) async fn get_provider_config(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProviderConfigView>, AppError> {
    require_admin(&state, &headers)?;

    let config = state
        .store
        .active_provider_config()
        .map_err(|e| AppError::from(RelayError::Storage(e)))?
        .ok_or_else(|| AppError::NotFound("No active provider config".to_string()))?;

    Ok(Json(config.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("Y"), "****");
        assert_eq!(mask_secret("GOCSPX-abcdefgh1234"), "****1234");
    }

    #[test]
    fn test_request_defaults() {
        let request: ProviderConfigRequest =
            serde_json::from_str(r#"{"app_id":"X","app_secret":"Y"}"#).unwrap();
        assert!(request.callback_url.is_none());
        assert!(request.scopes.is_none());
    }
}
