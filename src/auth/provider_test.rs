//! Tests for the provider API client

use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tenant(secret: &str) -> TenantConfig {
    TenantConfig {
        label: "acme".into(),
        region: "eu".into(),
        app_uid: "app-uid-1".into(),
        client_id: "client-1".into(),
        client_secret: secret.into(),
        redirect_uri: "https://relay.example.com/auth/callback".into(),
        scope: Some("cm.read".into()),
    }
}

#[test]
fn test_authorize_url_contains_pkce_parameters() {
    let client = ProviderClient::new().unwrap();
    let url = client
        .authorize_url(&tenant("secret-1"), "state-1", "challenge-1")
        .unwrap();

    assert_eq!(url.host_str(), Some("eu-app.contentstack.com"));
    assert_eq!(url.path(), "/apps/app-uid-1/authorize");

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let get = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

    assert_eq!(get("response_type"), Some("code"));
    assert_eq!(get("client_id"), Some("client-1"));
    assert_eq!(get("scope"), Some("cm.read"));
    assert_eq!(get("state"), Some("state-1"));
    assert_eq!(get("code_challenge"), Some("challenge-1"));
    assert_eq!(get("code_challenge_method"), Some("S256"));
}

#[test]
fn test_authorize_url_omits_empty_scope() {
    let client = ProviderClient::new().unwrap();
    let mut cfg = tenant("secret-1");
    cfg.scope = None;
    let url = client.authorize_url(&cfg, "s", "c").unwrap();
    assert!(!url.query().unwrap().contains("scope="));
}

#[tokio::test]
async fn test_exchange_code_sends_verifier_and_parses_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apps-api/apps/app-uid-1/tokens"))
        .and(body_partial_json(json!({
            "grant_type": "authorization_code",
            "code": "abc",
            "client_id": "client-1",
            "client_secret": "secret-1",
            "code_verifier": "verifier-1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "organization_uid": "org-1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ProviderClient::with_base_url(server.uri()).unwrap();
    let tokens = client
        .exchange_code(&tenant("secret-1"), "abc", Some("verifier-1"))
        .await
        .unwrap();

    assert_eq!(tokens.access_token, Some("at-1".into()));
    assert_eq!(tokens.refresh_token, Some("rt-1".into()));
    assert_eq!(tokens.expires_in, Some(3600));
    assert_eq!(tokens.organization_uid, Some("org-1".into()));
}

#[tokio::test]
async fn test_exchange_code_without_verifier_omits_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apps-api/apps/app-uid-1/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ProviderClient::with_base_url(server.uri()).unwrap();
    client
        .exchange_code(&tenant("secret-1"), "abc", None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(!body.contains("code_verifier"));
}

#[tokio::test]
async fn test_provider_failure_propagates_status_and_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apps-api/apps/app-uid-1/tokens"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Authorization code expired",
        })))
        .mount(&server)
        .await;

    let client = ProviderClient::with_base_url(server.uri()).unwrap();
    let err = client
        .exchange_code(&tenant("secret-1"), "stale", Some("v"))
        .await
        .unwrap_err();

    match err {
        RelayError::Provider { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Authorization code expired");
        }
        other => panic!("expected Provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_provider_failure_without_description_uses_error_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apps-api/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid_token" })),
        )
        .mount(&server)
        .await;

    let client = ProviderClient::with_base_url(server.uri()).unwrap();
    let err = client.refresh(&tenant("secret-1"), "rt-1").await.unwrap_err();

    match err {
        RelayError::Provider { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid_token");
        }
        other => panic!("expected Provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_refresh_is_form_encoded_with_secret() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apps-api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-1"))
        .and(body_string_contains("client_secret=secret-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-2",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ProviderClient::with_base_url(server.uri()).unwrap();
    let tokens = client.refresh(&tenant("secret-1"), "rt-1").await.unwrap();
    assert_eq!(tokens.access_token, Some("at-2".into()));
}

#[tokio::test]
async fn test_refresh_omits_empty_client_secret() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/apps-api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-2",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ProviderClient::with_base_url(server.uri()).unwrap();
    client.refresh(&tenant(""), "rt-1").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(!body.contains("client_secret"));
}
