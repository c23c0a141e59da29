//! Google Drive connection endpoints for the host dashboard.

use super::{AppError, AppState};
use crate::drive::ConnectionStatus;
use axum::{
    extract::{Path, Query, State},
    response::{Json, Redirect},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// OAuth callback query parameters
#[derive(Deserialize)]
pub struct OAuthCallback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Serialize)]
pub struct AuthorizeResponse {
    pub authorization_url: String,
    pub state: String,
}

#[derive(Serialize)]
pub struct DisconnectResponse {
    pub success: bool,
    pub message: String,
}

/// GET /api/auth/google/authorize/:client_ref
///
/// Returns the consent URL; the dashboard navigates the browser to it.
pub(super) async fn authorize(
    State(state): State<Arc<AppState>>,
    Path(client_ref): Path<String>,
) -> Result<Json<AuthorizeResponse>, AppError> {
    debug!(client_ref = %client_ref, "Authorization requested");

    let request = state
        .flow
        .build_authorization_request(&client_ref, &state.callback_url)?;

    Ok(Json(AuthorizeResponse {
        authorization_url: request.url,
        state: request.state,
    }))
}

/// GET /api/auth/google/callback
///
/// Completes the handshake and sends the host back to their dashboard.
pub(super) async fn callback(
    State(state): State<Arc<AppState>>,
    Query(callback): Query<OAuthCallback>,
) -> Result<Redirect, AppError> {
    if let Some(error) = callback.error {
        let description = callback
            .error_description
            .unwrap_or_else(|| "Unknown error".to_string());
        warn!(error = %error, description = %description, "Provider denied authorization");
        return Err(AppError::BadRequest(format!(
            "Authorization failed: {} - {}",
            error, description
        )));
    }

    let code = callback
        .code
        .ok_or_else(|| AppError::BadRequest("Missing 'code' parameter".to_string()))?;
    let raw_state = callback
        .state
        .ok_or_else(|| AppError::BadRequest("Missing 'state' parameter".to_string()))?;

    let grant = state
        .flow
        .complete_authorization(&code, &raw_state, &state.callback_url)
        .await?;

    info!(client_ref = %grant.client_ref, grant_id = %grant.id, "Redirecting host to dashboard");

    Ok(Redirect::temporary(&format!(
        "{}/client/{}?google_connected=true",
        state.frontend_url,
        urlencoding::encode(&grant.client_ref)
    )))
}

/// GET /api/clients/:client_ref/google-connection
pub(super) async fn connection_status(
    State(state): State<Arc<AppState>>,
    Path(client_ref): Path<String>,
) -> Result<Json<ConnectionStatus>, AppError> {
    Ok(Json(state.relay.connection_status(&client_ref)?))
}

/// DELETE /api/clients/:client_ref/google-connection
pub(super) async fn disconnect(
    State(state): State<Arc<AppState>>,
    Path(client_ref): Path<String>,
) -> Result<Json<DisconnectResponse>, AppError> {
    if !state.relay.disconnect(&client_ref).await? {
        return Err(AppError::BadRequest(
            "Client has no Google Drive connection".to_string(),
        ));
    }

    Ok(Json(DisconnectResponse {
        success: true,
        message: "Google Drive disconnected".to_string(),
    }))
}
