/*
[INPUT]:  Mock identity service HTTP responses and a local EVM wallet
[OUTPUT]: Test results for the HTTP identity client and end-to-end sign-in
[POS]:    Integration tests - identity service
[UPDATE]: When identity endpoints or payloads change
*/

mod common;

use std::sync::Arc;
use std::time::Duration;

use camp_auth_bridge::{
    AuthBridge, AuthError, AuthState, BridgeConfig, HttpIdentityService, IdentityConfig,
    IdentityError, IdentityService, LocalEvmWallet, WalletCapability,
};
use common::{TEST_ADDRESS, TEST_PRIVATE_KEY, setup_mock_server};
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_service(server: &MockServer) -> Arc<HttpIdentityService> {
    Arc::new(assert_ok!(HttpIdentityService::with_base_url(
        &IdentityConfig::default(),
        &server.uri()
    )))
}

async fn mount_verify(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": token,
            "expiresIn": 3600,
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_reads_use_bearer_token() {
    let server = setup_mock_server().await;
    mount_verify(&server, "access-1").await;

    let usage_path = format!("/users/{TEST_ADDRESS}/usage");
    Mock::given(method("GET"))
        .and(path(usage_path.as_str()))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "points": 120,
            "multiplier": 1.5,
            "active": true,
            "dataUploads": 3,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = http_service(&server);
    assert_ok!(
        service
            .verify_and_issue_session(TEST_ADDRESS, "challenge", "0xsig")
            .await
    );

    let usage = assert_ok!(service.fetch_usage(TEST_ADDRESS).await);
    assert_eq!(usage.points, 120);
    assert_eq!(usage.data_uploads, 3);
    assert!(usage.active);
}

#[tokio::test]
async fn test_token_not_reused_for_other_address() {
    let server = setup_mock_server().await;
    mount_verify(&server, "access-1").await;

    let service = http_service(&server);
    assert_ok!(
        service
            .verify_and_issue_session(TEST_ADDRESS, "challenge", "0xsig")
            .await
    );

    let err = service
        .fetch_profile("0xBBB0000000000000000000000000000000000222")
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::Unauthenticated));
}

#[tokio::test]
async fn test_server_error_surfaces_as_api_error() {
    let server = setup_mock_server().await;
    mount_verify(&server, "access-1").await;

    let socials_path = format!("/users/{TEST_ADDRESS}/socials");
    Mock::given(method("GET"))
        .and(path(socials_path.as_str()))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let service = http_service(&server);
    assert_ok!(
        service
            .verify_and_issue_session(TEST_ADDRESS, "challenge", "0xsig")
            .await
    );

    match service.fetch_linked_socials(TEST_ADDRESS).await {
        Err(IdentityError::Api { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_end_to_end_sign_in_with_local_wallet() {
    let server = setup_mock_server().await;
    mount_verify(&server, "access-e2e").await;

    let wallet = Arc::new(assert_ok!(LocalEvmWallet::new(TEST_PRIVATE_KEY)));
    assert_ok!(wallet.connect().await);
    let address = wallet.account().to_string();

    let profile_path = format!("/users/{address}/profile");
    Mock::given(method("GET"))
        .and(path(profile_path.as_str()))
        .and(header("authorization", "Bearer access-e2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": address,
            "username": "camper",
        })))
        .mount(&server)
        .await;

    let service = http_service(&server);
    let bridge = AuthBridge::new(wallet.clone(), service.clone(), BridgeConfig::default());

    assert_eq!(bridge.authenticate().await, AuthState::Authenticated);
    let proof = bridge.session().proof().map(str::to_string).unwrap();
    assert!(proof.starts_with("0x"));
    assert_eq!(proof.len(), 132);

    let profile = bridge.query_profile().await.unwrap();
    assert_eq!(profile.username.as_deref(), Some("camper"));

    bridge.sign_out().await;
    assert!(service.tokens().is_expired());
    assert!(bridge.query_profile().await.is_none());
}

#[tokio::test]
async fn test_service_rejection_sets_verification_error() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(403).set_body_string("signature mismatch"))
        .mount(&server)
        .await;

    let wallet = Arc::new(assert_ok!(LocalEvmWallet::new(TEST_PRIVATE_KEY)));
    assert_ok!(wallet.connect().await);
    let bridge = AuthBridge::new(wallet, http_service(&server), BridgeConfig::default());

    assert_eq!(bridge.authenticate().await, AuthState::Error);
    match bridge.last_error() {
        Some(AuthError::ServiceVerificationFailed(message)) => {
            assert!(message.contains("signature mismatch"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(bridge.session().proof().is_none());
}

#[tokio::test]
async fn test_sign_out_during_verification_drops_access_token() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/auth/verify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "accessToken": "access-late",
                    "expiresIn": 3600,
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let wallet = Arc::new(assert_ok!(LocalEvmWallet::new(TEST_PRIVATE_KEY)));
    assert_ok!(wallet.connect().await);
    let service = http_service(&server);
    let bridge = AuthBridge::new(wallet, service.clone(), BridgeConfig::default());

    let running = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.authenticate().await }
    });
    for _ in 0..100 {
        let received = server.received_requests().await.unwrap_or_default();
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(bridge.is_in_progress());

    bridge.sign_out().await;

    assert_eq!(assert_ok!(running.await), AuthState::Idle);
    assert!(service.tokens().is_expired());
    assert!(bridge.query_profile().await.is_none());
}
