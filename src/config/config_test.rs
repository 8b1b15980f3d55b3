//! Tests for tenant config resolution

use super::*;
use crate::RelayError;

fn snapshot(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn secret() -> String {
    BASE64.encode([7u8; 32])
}

fn full_tenant(prefix: &str) -> Vec<(String, String)> {
    [
        ("CONTENTSTACK_REGION", "eu"),
        ("CONTENTSTACK_APP_UID", "app-uid-1"),
        ("OAUTH_CLIENT_ID", "client-1"),
        ("OAUTH_CLIENT_SECRET", "secret-1"),
        ("OAUTH_REDIRECT_URI", "https://relay.example.com/auth/callback"),
    ]
    .iter()
    .map(|(k, v)| (format!("{}_{}", prefix, k), v.to_string()))
    .collect()
}

fn config_with_labels(labels: &str) -> Config {
    let mut vars = snapshot(&[("APP_LABELS", labels)]);
    vars.insert("COOKIE_SECRET".into(), secret());
    for label in labels.split(',').filter(|s| !s.is_empty()) {
        vars.extend(full_tenant(&label.trim().to_uppercase()));
    }
    Config::from_snapshot(vars).unwrap()
}

#[test]
fn test_missing_cookie_secret_fails_at_startup() {
    let err = Config::from_snapshot(snapshot(&[("APP_LABELS", "acme")])).unwrap_err();
    assert!(matches!(err, RelayError::Config(_)));
    assert!(err.to_string().contains("COOKIE_SECRET"));
}

#[test]
fn test_cookie_secret_must_be_32_bytes() {
    let mut vars = snapshot(&[("APP_LABELS", "acme")]);
    vars.insert("COOKIE_SECRET".into(), BASE64.encode([1u8; 16]));
    let err = Config::from_snapshot(vars).unwrap_err();
    assert!(err.to_string().contains("32 bytes"));
}

#[test]
fn test_resolve_known_label() {
    let config = config_with_labels("acme,globex");
    assert_eq!(config.resolve_label(Some("globex")), Some("globex".into()));
}

#[test]
fn test_resolve_unknown_label_fails() {
    let config = config_with_labels("acme,globex");
    assert_eq!(config.resolve_label(Some("nope")), None);
}

#[test]
fn test_resolve_implicit_single_label() {
    let config = config_with_labels("acme");
    assert_eq!(config.resolve_label(None), Some("acme".into()));
}

#[test]
fn test_resolve_ambiguous_forces_explicit_choice() {
    let config = config_with_labels("acme,globex");
    assert_eq!(config.resolve_label(None), None);
}

#[test]
fn test_default_install_label_is_first_configured() {
    let config = config_with_labels("acme,globex");
    assert_eq!(config.default_install_label(), Some("acme".into()));

    let config = config_with_labels("");
    assert_eq!(config.default_install_label(), None);
}

#[test]
fn test_tenant_config_complete() {
    let config = config_with_labels("acme");
    let cfg = config.tenant_config("acme").unwrap();

    assert_eq!(cfg.label, "acme");
    assert_eq!(cfg.region, "eu");
    assert_eq!(cfg.app_uid, "app-uid-1");
    assert_eq!(cfg.client_id, "client-1");
    assert_eq!(cfg.client_secret, "secret-1");
    assert_eq!(cfg.scope, None);
}

#[test]
fn test_tenant_config_names_every_missing_key() {
    let mut vars = snapshot(&[
        ("APP_LABELS", "acme"),
        ("ACME_CONTENTSTACK_REGION", "eu"),
        ("ACME_OAUTH_CLIENT_ID", "client-1"),
    ]);
    vars.insert("COOKIE_SECRET".into(), secret());
    let config = Config::from_snapshot(vars).unwrap();

    let err = config.tenant_config("acme").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("ACME_CONTENTSTACK_APP_UID"));
    assert!(msg.contains("ACME_OAUTH_CLIENT_SECRET"));
    assert!(msg.contains("ACME_OAUTH_REDIRECT_URI"));
    assert!(!msg.contains("ACME_CONTENTSTACK_REGION,"));
    assert!(!msg.contains("ACME_OAUTH_CLIENT_ID"));
}

#[test]
fn test_tenant_config_empty_value_counts_as_missing() {
    let mut vars = snapshot(&[("APP_LABELS", "acme")]);
    vars.insert("COOKIE_SECRET".into(), secret());
    vars.extend(full_tenant("ACME"));
    vars.insert("ACME_OAUTH_CLIENT_SECRET".into(), "".into());
    let config = Config::from_snapshot(vars).unwrap();

    let err = config.tenant_config("acme").unwrap_err();
    assert!(err.to_string().contains("ACME_OAUTH_CLIENT_SECRET"));
}

#[test]
fn test_scope_is_optional() {
    let mut vars = snapshot(&[("APP_LABELS", "acme"), ("ACME_OAUTH_SCOPE", "cm.read")]);
    vars.insert("COOKIE_SECRET".into(), secret());
    vars.extend(full_tenant("ACME"));
    let config = Config::from_snapshot(vars).unwrap();

    let cfg = config.tenant_config("acme").unwrap();
    assert_eq!(cfg.scope, Some("cm.read".into()));
}

#[test]
fn test_label_prefix_maps_non_alphanumerics() {
    assert_eq!(label_prefix("my-app.2"), "MY_APP_2");
    assert_eq!(label_prefix("interstack"), "INTERSTACK");
}

#[test]
fn test_allowed_origins_parsed_and_trimmed() {
    let mut vars = snapshot(&[(
        "ALLOWED_ORIGIN",
        "https://app.example.com, *.contentstack.com",
    )]);
    vars.insert("COOKIE_SECRET".into(), secret());
    let config = Config::from_snapshot(vars).unwrap();

    assert_eq!(
        config.allowed_origins(),
        &[
            "https://app.example.com".to_string(),
            "*.contentstack.com".to_string()
        ]
    );
}
