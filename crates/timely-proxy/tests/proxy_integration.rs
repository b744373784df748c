//! Proxy integration tests.
//!
//! These run the proxy on a real socket and drive it over HTTP, including
//! a full login through the session store.

mod common;

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{CLIENT_SECRET, FRONTEND_ORIGIN, TestProxy};
use timely_auth::{AuthConfig, MemoryStorage, SessionStore, Storage};
use timely_proxy::Credentials;

#[tokio::test]
async fn test_proxy_answers_health() -> Result<()> {
    let proxy = TestProxy::start().await?;

    let resp = proxy
        .client
        .get(format!("{}/health", proxy.base_url()))
        .send()
        .await?;
    assert!(resp.status().is_success());

    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["service"], "timely-proxy");
    Ok(())
}

#[tokio::test]
async fn test_cors_headers_on_token_response() -> Result<()> {
    let proxy = TestProxy::start().await?;
    Mock::given(method("POST"))
        .and(path("/-/oauth_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "refresh_token": "ref",
            "expires_in": 3600,
            "token_type": "bearer"
        })))
        .mount(&proxy.provider)
        .await;

    let allowed = proxy
        .client
        .post(proxy.token_url())
        .header("Origin", FRONTEND_ORIGIN)
        .json(&json!({"code": "abc123"}))
        .send()
        .await?;
    assert_eq!(allowed.status().as_u16(), 200);
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        FRONTEND_ORIGIN
    );

    let foreign = proxy
        .client
        .post(proxy.token_url())
        .header("Origin", "https://elsewhere.example")
        .json(&json!({"code": "abc123"}))
        .send()
        .await?;
    assert_eq!(foreign.status().as_u16(), 200);
    assert!(foreign.headers().get("access-control-allow-origin").is_none());
    Ok(())
}

#[tokio::test]
async fn test_missing_credentials_reported_per_request() -> Result<()> {
    let proxy = TestProxy::start_with(Credentials::Missing(vec![
        "ASANA_CLIENT_ID".to_string(),
        "ASANA_CLIENT_SECRET".to_string(),
    ]))
    .await?;

    let resp = proxy
        .client
        .post(proxy.token_url())
        .json(&json!({"code": "abc123"}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 500);

    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body, json!({"error": "Server configuration error"}));
    Ok(())
}

#[tokio::test]
async fn test_session_store_login_through_proxy() -> Result<()> {
    let proxy = TestProxy::start().await?;
    Mock::given(method("POST"))
        .and(path("/-/oauth_token"))
        .and(body_string_contains("code=abc123"))
        .and(body_string_contains(format!("client_secret={}", CLIENT_SECRET)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "refresh_token": "ref",
            "expires_in": 3600,
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&proxy.provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"gid": "1201", "email": "ada@example.com", "name": "Ada"}
        })))
        .mount(&proxy.provider)
        .await;

    let config = AuthConfig::new("client-1", "http://localhost:5173/auth/callback")
        .with_proxy_url(proxy.token_url())
        .with_api_base_url(proxy.provider.uri());
    let durable = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(config, durable.clone(), Arc::new(MemoryStorage::new()))?;

    assert!(store.exchange_code_for_token("abc123").await);
    assert!(store.is_authenticated());
    assert_eq!(store.user().map(|u| u.name), Some("Ada".to_string()));
    assert!(durable.get("asana_auth")?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_session_store_sees_relayed_rejection() -> Result<()> {
    let proxy = TestProxy::start().await?;
    Mock::given(method("POST"))
        .and(path("/-/oauth_token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked"
        })))
        .mount(&proxy.provider)
        .await;

    let config = AuthConfig::new("client-1", "http://localhost:5173/auth/callback")
        .with_proxy_url(proxy.token_url())
        .with_api_base_url(proxy.provider.uri());
    let store = SessionStore::new(
        config,
        Arc::new(MemoryStorage::new()),
        Arc::new(MemoryStorage::new()),
    )?;

    assert!(!store.exchange_code_for_token("abc123").await);
    let error = store.error().unwrap_or_default();
    assert!(error.contains("401"), "{}", error);
    assert!(error.contains("Refresh token revoked"), "{}", error);
    Ok(())
}
