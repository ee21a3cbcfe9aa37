//! Tests for login, refresh, single-flight renewal and the refresh timer.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use easee::auth::{AuthError, Credentials, SessionManager};
use easee::error::EaseeError;

use common::mount_login;

fn manager(server: &MockServer, interval_override: Option<Duration>) -> Arc<SessionManager> {
    SessionManager::new(
        reqwest::Client::new(),
        server.uri(),
        Credentials::new("user@example.com", "secret"),
        interval_override,
    )
}

async fn count_requests(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}

#[tokio::test]
async fn login_posts_credentials_and_stores_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/login"))
        .and(body_json(json!({"userName": "user@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "tok-1",
            "expiresIn": 86400,
            "refreshToken": "ref-1",
            "tokenType": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager(&server, None);
    let session = manager.login().await.expect("login");

    assert_eq!(session.access_token, "tok-1");
    assert_eq!(session.refresh_token.as_deref(), Some("ref-1"));
    assert!(manager.is_authenticated().await);
    manager.close();
}

#[tokio::test]
async fn login_schedules_refresh_within_expiry_window() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 3600).await;

    let manager = manager(&server, None);
    let before = Utc::now();
    manager.login().await.expect("login");
    let after = Utc::now();

    let due = manager.next_refresh_at().expect("refresh scheduled");
    assert!(due >= before + chrono::Duration::seconds(3540));
    assert!(due <= after + chrono::Duration::seconds(3600));
    manager.close();
}

#[tokio::test]
async fn refresh_interval_override_replaces_expiry_based_delay() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 3600).await;

    let manager = manager(&server, Some(Duration::from_secs(600)));
    let before = Utc::now();
    manager.login().await.expect("login");

    let due = manager.next_refresh_at().expect("refresh scheduled");
    assert!(due >= before + chrono::Duration::seconds(600));
    assert!(due < before + chrono::Duration::seconds(700));
    manager.close();
}

#[tokio::test]
async fn successive_ensure_valid_calls_log_in_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "tok-1",
            "expiresIn": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager(&server, None);
    let first = manager.ensure_valid().await.unwrap();
    let second = manager.ensure_valid().await.unwrap();

    assert_eq!(first.access_token, second.access_token);
    manager.close();
}

#[tokio::test]
async fn concurrent_ensure_valid_calls_share_one_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessToken": "tok-1", "expiresIn": 3600}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager(&server, None);
    let (a, b) = tokio::join!(manager.ensure_valid(), manager.ensure_valid());

    assert_eq!(a.unwrap().access_token, "tok-1");
    assert_eq!(b.unwrap().access_token, "tok-1");
    manager.close();
}

#[tokio::test]
async fn expired_session_is_renewed_with_refresh_token() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 0).await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/refresh_token"))
        .and(body_json(json!({"accessToken": "tok-1", "refreshToken": "tok-1-refresh"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "tok-2",
            "expiresIn": 3600,
            "refreshToken": "ref-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Keep the background timer out of the way so only ensure_valid refreshes.
    let manager = manager(&server, Some(Duration::from_secs(3600)));
    manager.login().await.unwrap();

    let session = manager.ensure_valid().await.unwrap();
    assert_eq!(session.access_token, "tok-2");
    assert_eq!(count_requests(&server, "/api/accounts/login").await, 1);
    manager.close();
}

#[tokio::test]
async fn failed_refresh_falls_back_to_one_login() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 3600).await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/refresh_token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager(&server, None);
    manager.login().await.unwrap();
    let session = manager.refresh().await.expect("fallback login");

    assert_eq!(session.access_token, "tok-1");
    assert_eq!(count_requests(&server, "/api/accounts/login").await, 2);
    manager.close();
}

#[tokio::test]
async fn refresh_error_propagates_when_fallback_login_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "tok-1",
            "expiresIn": 3600,
            "refreshToken": "ref-1"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/refresh_token"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager(&server, None);
    manager.login().await.unwrap();
    let err = manager.refresh().await.unwrap_err();

    assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
    assert_eq!(count_requests(&server, "/api/accounts/login").await, 2);
    manager.close();
}

#[tokio::test]
async fn login_without_token_is_an_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"expiresIn": 3600})))
        .mount(&server)
        .await;

    let manager = manager(&server, None);
    let err = manager.login().await.unwrap_err();
    assert!(matches!(err, AuthError::NoToken));
    assert!(matches!(EaseeError::from(err), EaseeError::Authentication(_)));
    assert!(!manager.is_authenticated().await);
}

#[tokio::test]
async fn rejected_login_is_an_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/login"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid grant"))
        .mount(&server)
        .await;

    let manager = manager(&server, None);
    let err: EaseeError = manager.ensure_valid().await.unwrap_err().into();
    match err {
        EaseeError::Authentication(msg) => assert!(msg.contains("invalid grant")),
        other => panic!("expected Authentication, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_credentials_never_reach_the_server() {
    let server = MockServer::start().await;
    let manager = SessionManager::new(
        reqwest::Client::new(),
        server.uri(),
        Credentials::new("", ""),
        None,
    );

    let err = manager.login().await.unwrap_err();
    assert!(matches!(err, AuthError::MissingCredentials));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn short_lived_token_is_refreshed_in_background() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 30).await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "tok-2",
            "expiresIn": 3600,
            "refreshToken": "ref-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager(&server, None);
    manager.login().await.unwrap();

    let mut refreshed = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if manager.current().await.map(|s| s.access_token) == Some("tok-2".to_string()) {
            refreshed = true;
            break;
        }
    }
    assert!(refreshed, "background refresh did not run");

    let due = manager.next_refresh_at().expect("rescheduled after refresh");
    assert!(due > Utc::now() + chrono::Duration::seconds(3000));
    manager.close();
}

#[tokio::test]
async fn close_cancels_pending_refresh_and_is_idempotent() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 3600).await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "tok-2",
            "expiresIn": 3600
        })))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager(&server, Some(Duration::from_millis(100)));
    manager.login().await.unwrap();
    assert!(manager.next_refresh_at().is_some());

    manager.close();
    manager.close();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(manager.is_closed());
    assert!(manager.next_refresh_at().is_none());
    // The session itself survives close.
    assert_eq!(manager.current().await.unwrap().access_token, "tok-1");
}

#[tokio::test]
async fn out_of_range_expiry_is_rejected_without_panicking() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessToken": "tok-1", "expiresIn": 1e15})),
        )
        .mount(&server)
        .await;

    let manager = manager(&server, None);
    let err = manager.login().await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert!(!manager.is_authenticated().await);
    assert!(manager.next_refresh_at().is_none());
}

#[tokio::test]
async fn zero_refresh_interval_does_not_spin() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 3600).await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "tok-2",
            "expiresIn": 3600
        })))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager(&server, Some(Duration::ZERO));
    let before = Utc::now();
    manager.login().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let due = manager.next_refresh_at().expect("refresh scheduled");
    assert!(due >= before + chrono::Duration::seconds(3540));
    assert_eq!(count_requests(&server, "/api/accounts/refresh_token").await, 0);
    manager.close();
}

#[tokio::test]
async fn invalidate_only_drops_the_matching_token() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 3600).await;

    let manager = manager(&server, None);
    manager.login().await.unwrap();

    manager.invalidate("some-older-token").await;
    assert!(manager.is_authenticated().await);

    manager.invalidate("tok-1").await;
    assert!(manager.current().await.is_none());
    manager.close();
}
