/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for camp-auth-bridge tests

use std::sync::Arc;
use std::time::Duration;

use camp_auth_bridge::{AuthBridge, BridgeConfig, MockWallet, SimulatedIdentityService};
use wiremock::MockServer;

pub const TEST_ADDRESS: &str = "0xAAA0000000000000000000000000000000000111";

/// Anvil/Hardhat account #0
#[allow(dead_code)]
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Setup a mock HTTP server for testing
#[allow(dead_code)]
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Connected mock wallet whose default signature is `signature`
#[allow(dead_code)]
pub fn connected_wallet(signature: &str) -> Arc<MockWallet> {
    Arc::new(MockWallet::connected(TEST_ADDRESS, signature))
}

/// Bridge over `wallet` with default timing and a 100ms simulated identity service
#[allow(dead_code)]
pub fn bridge_for(wallet: Arc<MockWallet>) -> (AuthBridge, Arc<SimulatedIdentityService>) {
    let identity = Arc::new(SimulatedIdentityService::new(Duration::from_millis(100)));
    let bridge = AuthBridge::new(wallet, identity.clone(), BridgeConfig::default());
    (bridge, identity)
}

/// Let spawned tasks run until `condition` holds
#[allow(dead_code)]
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
