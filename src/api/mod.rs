//! HTTP surface over the authorization flow and the storage relay.

mod admin;
mod google;
mod uploads;

use crate::config::AppConfig;
use crate::credentials::{ClientLocks, GrantStore};
use crate::drive::{DriveClient, StorageRelay};
use crate::error::RelayError;
use crate::oauth::{AuthorizationFlow, CredentialRefresher};
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::error;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Application error types for every endpoint
enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    ServerError(String),
    BadGateway(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::InvalidState(_) | RelayError::NotConnected => {
                AppError::BadRequest(err.to_string())
            }
            RelayError::ConfigurationMissing | RelayError::DestinationUnavailable => {
                AppError::ServerError(err.to_string())
            }
            RelayError::Storage(e) => {
                error!(error = %e, "Storage failure");
                AppError::ServerError("Internal storage error".to_string())
            }
            RelayError::Provider { .. } | RelayError::Transport(_) => {
                AppError::BadGateway(err.to_string())
            }
        }
    }
}

/// Shared application state
pub struct AppState {
    pub flow: AuthorizationFlow,
    pub relay: StorageRelay,
    pub store: Arc<GrantStore>,
    /// Fixed callback address registered with the provider
    pub callback_url: String,
    pub frontend_url: String,
    /// Required bearer token for the admin endpoints. None = unrestricted.
    pub admin_token: Option<String>,
    /// Scopes stored with a provider config when the admin sends none
    pub default_scopes: Vec<String>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wires the flow and the relay around one store, one lock table and one HTTP client.
    pub fn from_config(config: &AppConfig, store: Arc<GrantStore>) -> Result<Self> {
        let http = config.http.build_client()?;
        let locks = Arc::new(ClientLocks::new());

        let flow = AuthorizationFlow::new(
            Arc::clone(&store),
            Arc::clone(&locks),
            http.clone(),
            config.provider.clone(),
        );

        let relay = StorageRelay::new(
            CredentialRefresher::new(Arc::clone(&store), Arc::clone(&locks), http.clone()),
            DriveClient::new(http, &config.provider, config.upload.chunk_size_bytes),
            Arc::clone(&store),
            locks,
            config.upload.clone(),
        );

        Ok(Self {
            flow,
            relay,
            store,
            callback_url: config.server.callback_url(),
            frontend_url: config.server.frontend_url.trim_end_matches('/').to_string(),
            admin_token: config.server.admin_token.clone(),
            default_scopes: config.provider.default_scopes.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }
}

/// Create the service router
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route(
            "/api/admin/provider-config",
            get(admin::get_provider_config).post(admin::set_provider_config),
        )
        .route("/api/admin/google-redirect-uris", get(admin::get_redirect_uris))
        .route(
            "/api/auth/google/authorize/:client_ref",
            get(google::authorize),
        )
        .route("/api/auth/google/callback", get(google::callback))
        .route(
            "/api/clients/:client_ref/google-connection",
            get(google::connection_status).delete(google::disconnect),
        )
        .route(
            "/api/clients/:client_ref/albums/:album_ref/photos",
            post(uploads::upload_photo),
        )
        .route("/api/albums/:album_ref/photos", get(uploads::list_photos))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn status_and_body(err: RelayError) -> (StatusCode, serde_json::Value) {
        let response = AppError::from(err).into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_relay_error_status_mapping() {
        let (status, _) = status_and_body(RelayError::InvalidState("x".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = status_and_body(RelayError::NotConnected).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = status_and_body(RelayError::ConfigurationMissing).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = status_and_body(RelayError::DestinationUnavailable).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = status_and_body(RelayError::Transport("timeout".to_string())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_storage_error_details_stay_internal() {
        let (status, body) =
            status_and_body(RelayError::Storage(anyhow::anyhow!("disk I/O error at /var/db"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal storage error");
    }

    #[tokio::test]
    async fn test_provider_error_body() {
        let (status, body) = status_and_body(RelayError::Provider {
            status: 403,
            reason: "insufficientPermissions".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Provider returned 403: insufficientPermissions");
    }
}
