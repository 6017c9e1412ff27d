/*
[INPUT]:  Message to sign and the external wallet provider's connection state
[OUTPUT]: Signatures, connection state snapshots and change notifications
[POS]:    Wallet layer - wallet provider integration abstraction
[UPDATE]: When adding new wallet backends or changing the signing contract
*/

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::WalletError;

/// Connection state owned by the wallet provider.
///
/// The bridge only reads it; changes arrive through
/// [`WalletCapability::subscribe`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletState {
    pub address: Option<String>,
    pub is_connected: bool,
}

impl WalletState {
    pub fn connected(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            is_connected: true,
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Address usable for signing: connected and non-empty
    pub fn active_address(&self) -> Option<&str> {
        if !self.is_connected {
            return None;
        }
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }
}

/// Trait for an external wallet provider
///
/// Implement this for each wallet backend (local key, wallet-connect relay, ...).
/// The trait is async because signing usually waits on a user prompt.
#[async_trait]
pub trait WalletCapability: Send + Sync {
    /// Current connection state
    fn state(&self) -> WalletState;

    /// Receiver notified on every connect, disconnect or account switch
    fn subscribe(&self) -> watch::Receiver<WalletState>;

    /// Whether the connected wallet can sign arbitrary messages
    fn can_sign(&self) -> bool {
        true
    }

    /// Ask the provider to connect
    async fn connect(&self) -> Result<WalletState, WalletError>;

    /// Ask the provider to disconnect
    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Sign a message and return the signature
    async fn sign_message(&self, message: &str) -> Result<String, WalletError>;

    fn address(&self) -> Option<String> {
        self.state().active_address().map(str::to_string)
    }

    fn is_connected(&self) -> bool {
        self.state().is_connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_address_requires_connection() {
        let mut state = WalletState::connected("0xabc");
        assert_eq!(state.active_address(), Some("0xabc"));

        state.is_connected = false;
        assert_eq!(state.active_address(), None);
    }

    #[test]
    fn test_active_address_ignores_blank() {
        let state = WalletState::connected("   ");
        assert_eq!(state.active_address(), None);
        assert_eq!(WalletState::disconnected().active_address(), None);
    }
}
