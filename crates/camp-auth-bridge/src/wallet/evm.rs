/*
[INPUT]:  EVM private key (hex string)
[OUTPUT]: EIP-191 signed messages and connection state for an EVM account
[POS]:    Wallet layer - local-key EVM wallet implementation
[UPDATE]: When signing logic or EVM address formatting changes
*/

use std::str::FromStr;

use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use crate::error::WalletError;
use crate::wallet::{WalletCapability, WalletState};

/// Wallet backed by a locally held EVM private key.
///
/// Starts disconnected; [`WalletCapability::connect`] exposes the account.
pub struct LocalEvmWallet {
    signer: PrivateKeySigner,
    address: String,
    state_tx: watch::Sender<WalletState>,
}

impl LocalEvmWallet {
    /// Create a wallet from a hex-encoded private key
    ///
    /// Supports both "0x"-prefixed and non-prefixed hex strings.
    pub fn new(private_key_hex: &str) -> Result<Self, WalletError> {
        let private_key_hex = private_key_hex.trim();
        let private_key_hex = private_key_hex
            .strip_prefix("0x")
            .unwrap_or(private_key_hex);
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| WalletError::Other(format!("Invalid EVM private key: {e}")))?;

        let address = signer.address().to_checksum(None);
        let (state_tx, _) = watch::channel(WalletState::disconnected());

        Ok(Self {
            signer,
            address,
            state_tx,
        })
    }

    /// Checksummed account address, available even while disconnected
    pub fn account(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl WalletCapability for LocalEvmWallet {
    fn state(&self) -> WalletState {
        self.state_tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.state_tx.subscribe()
    }

    async fn connect(&self) -> Result<WalletState, WalletError> {
        let state = WalletState::connected(self.address.clone());
        self.state_tx.send_replace(state.clone());
        info!(address = %self.address, "local wallet connected");
        Ok(state)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.state_tx.send_replace(WalletState::disconnected());
        info!(address = %self.address, "local wallet disconnected");
        Ok(())
    }

    async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        let connected = self.state_tx.borrow().is_connected;
        if !connected {
            return Err(WalletError::NotConnected);
        }

        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| WalletError::from_provider_message(&e.to_string()))?;

        // [r, s, v]
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[tokio::test]
    async fn test_local_wallet_signs_after_connect() {
        let wallet = LocalEvmWallet::new(TEST_KEY).unwrap();
        assert!(!wallet.is_connected());

        let state = wallet.connect().await.unwrap();
        assert_eq!(state.active_address(), Some(TEST_ADDRESS));

        let signature = wallet.sign_message("hello").await.unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 132); // 0x + 65 bytes * 2
    }

    #[tokio::test]
    async fn test_local_wallet_refuses_to_sign_when_disconnected() {
        let wallet = LocalEvmWallet::new(TEST_KEY).unwrap();
        let err = wallet.sign_message("hello").await.unwrap_err();
        assert_eq!(err, WalletError::NotConnected);
    }

    #[tokio::test]
    async fn test_local_wallet_publishes_state_changes() {
        let wallet = LocalEvmWallet::new(TEST_KEY).unwrap();
        let mut rx = wallet.subscribe();

        wallet.connect().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_connected);

        wallet.disconnect().await.unwrap();
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_connected);
    }

    #[test]
    fn test_local_wallet_no_prefix() {
        let pk = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let wallet = LocalEvmWallet::new(pk).unwrap();
        assert_eq!(wallet.account(), TEST_ADDRESS);
    }

    #[test]
    fn test_local_wallet_rejects_garbage_key() {
        assert!(LocalEvmWallet::new("not-a-key").is_err());
    }
}
