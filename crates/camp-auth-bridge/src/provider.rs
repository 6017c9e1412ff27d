/*
[INPUT]:  Settings and the application's wallet capability
[OUTPUT]: Running auth bridge with its identity service and wallet watcher
[POS]:    Bootstrap layer - explicit init/teardown owned by the app entry point
[UPDATE]: When adding identity backends or startup steps
*/

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bridge::AuthBridge;
use crate::config::Settings;
use crate::error::ProviderError;
use crate::identity::{HttpIdentityService, IdentityService, SimulatedIdentityService};
use crate::wallet::WalletCapability;

/// Initialized auth stack.
///
/// Built once by the application entry point and torn down with
/// [`OriginProvider::shutdown`]. Nothing here lives in a global.
pub struct OriginProvider {
    settings: Settings,
    identity: Arc<dyn IdentityService>,
    bridge: AuthBridge,
    watcher: Option<JoinHandle<()>>,
}

impl OriginProvider {
    /// Validate settings, build the identity service and start watching the wallet.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(settings: Settings, wallet: Arc<dyn WalletCapability>) -> Result<Self, ProviderError> {
        settings.validate()?;

        let identity: Arc<dyn IdentityService> = match &settings.identity.base_url {
            Some(base_url) => {
                info!(%base_url, "using HTTP identity service");
                Arc::new(HttpIdentityService::new(&settings.identity)?)
            }
            None => {
                info!(
                    latency_ms = settings.identity.simulated_latency_ms,
                    "no identity base_url configured, using simulated identity service"
                );
                Arc::new(SimulatedIdentityService::new(
                    settings.identity.simulated_latency(),
                ))
            }
        };

        let bridge = AuthBridge::new(wallet, identity.clone(), settings.bridge.clone());
        let watcher = bridge.watch_wallet();
        info!("auth provider initialized");

        Ok(Self {
            settings,
            identity,
            bridge,
            watcher: Some(watcher),
        })
    }

    pub fn bridge(&self) -> &AuthBridge {
        &self.bridge
    }

    pub fn identity(&self) -> &Arc<dyn IdentityService> {
        &self.identity
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Sign out, end the identity session and stop the wallet watcher
    pub async fn shutdown(mut self) {
        self.bridge.sign_out().await;

        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
            if let Err(err) = watcher.await
                && !err.is_cancelled()
            {
                warn!(error = %err, "wallet watcher ended abnormally");
            }
        }
        info!("auth provider shut down");
    }
}

impl Drop for OriginProvider {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}
