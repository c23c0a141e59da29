// Integration tests for the /api/admin routes

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use tower::ServiceExt;
use upnafesta::api::{create_router, AppState};
use upnafesta::config::AppConfig;
use upnafesta::credentials::GrantStore;

fn create_test_app(admin_token: Option<&str>) -> (Router, Arc<GrantStore>) {
    let mut config = AppConfig::default();
    config.server.admin_token = admin_token.map(|t| t.to_string());
    config.server.public_base_url = "https://fotos.example.com".to_string();

    let store = Arc::new(GrantStore::new(":memory:", &BASE64.encode([1u8; 32])).unwrap());
    let state = AppState::from_config(&config, Arc::clone(&store)).unwrap();
    (create_router(state), store)
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

fn post_config(body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/admin/provider-config")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", bearer(token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_config(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/admin/provider-config");
    if let Some(token) = token {
        builder = builder.header("authorization", bearer(token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// POST activates a config with the default callback and scopes; the secret is masked.
#[tokio::test]
async fn test_post_config_uses_defaults() {
    let (app, store) = create_test_app(Some("secret"));

    let response = app
        .oneshot(post_config(
            r#"{"app_id":"123.apps.googleusercontent.com","app_secret":"GOCSPX-abcdefgh1234"}"#,
            Some("secret"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = read_json(response).await;
    assert_eq!(json["app_id"], "123.apps.googleusercontent.com");
    assert_eq!(json["app_secret"], "****1234");
    assert_eq!(
        json["callback_url"],
        "https://fotos.example.com/api/auth/google/callback"
    );
    assert_eq!(json["scopes"].as_array().unwrap().len(), 3);
    assert_eq!(json["active"], true);

    // The real secret is stored
    let config = store.active_provider_config().unwrap().unwrap();
    assert_eq!(config.app_secret, "GOCSPX-abcdefgh1234");
}

/// A second POST replaces the active config.
#[tokio::test]
async fn test_post_config_replaces_active() {
    let (app, store) = create_test_app(Some("secret"));

    let first = app
        .clone()
        .oneshot(post_config(r#"{"app_id":"A","app_secret":"a-secret"}"#, Some("secret")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .clone()
        .oneshot(post_config(
            r#"{"app_id":"B","app_secret":"b-secret","scopes":["openid"]}"#,
            Some("secret"),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CREATED);

    let response = app.oneshot(get_config(Some("secret"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["app_id"], "B");
    assert_eq!(json["scopes"], serde_json::json!(["openid"]));
    assert_eq!(json["app_secret"], "****");

    assert_eq!(store.active_provider_config().unwrap().unwrap().app_id, "B");
}

#[tokio::test]
async fn test_post_config_requires_token() {
    let (app, store) = create_test_app(Some("secret"));

    let response = app
        .clone()
        .oneshot(post_config(r#"{"app_id":"A","app_secret":"a"}"#, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(post_config(r#"{"app_id":"A","app_secret":"a"}"#, Some("wrong")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert!(store.active_provider_config().unwrap().is_none());
}

#[tokio::test]
async fn test_get_config_requires_token() {
    let (app, _store) = create_test_app(Some("secret"));

    let response = app.oneshot(get_config(Some("wrong"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// No admin token configured: endpoints are open (dev mode).
#[tokio::test]
async fn test_no_admin_token_allows_requests() {
    let (app, _store) = create_test_app(None);

    let response = app
        .oneshot(post_config(r#"{"app_id":"A","app_secret":"a"}"#, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_get_config_without_active_is_not_found() {
    let (app, _store) = create_test_app(Some("secret"));

    let response = app.oneshot(get_config(Some("secret"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_config_rejects_blank_credentials() {
    let (app, _store) = create_test_app(Some("secret"));

    let response = app
        .oneshot(post_config(r#"{"app_id":"  ","app_secret":"a"}"#, Some("secret")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

fn get_redirect_uris(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/admin/google-redirect-uris");
    if let Some(token) = token {
        builder = builder.header("authorization", bearer(token));
    }
    builder.body(Body::empty()).unwrap()
}

/// The callback URL is available before any provider config is saved.
#[tokio::test]
async fn test_redirect_uris_before_config() {
    let (app, store) = create_test_app(Some("secret"));
    assert!(store.active_provider_config().unwrap().is_none());

    let response = app.oneshot(get_redirect_uris(Some("secret"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert_eq!(
        json["callback_url"],
        "https://fotos.example.com/api/auth/google/callback"
    );
    let instructions = json["instructions"].as_array().unwrap();
    assert!(instructions
        .iter()
        .any(|step| step.as_str().unwrap().contains("https://fotos.example.com/api/auth/google/callback")));
}

#[tokio::test]
async fn test_redirect_uris_requires_token() {
    let (app, _store) = create_test_app(Some("secret"));

    let response = app
        .clone()
        .oneshot(get_redirect_uris(Some("wrong")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.oneshot(get_redirect_uris(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
