/*
[INPUT]:  Scripted signing outcomes and simulated connection events
[OUTPUT]: Deterministic WalletCapability for tests and demos
[POS]:    Wallet layer - test double
[UPDATE]: When the WalletCapability contract changes
*/

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::WalletError;
use crate::wallet::{WalletCapability, WalletState};

#[derive(Debug, Clone)]
struct ScriptedSign {
    delay: Option<Duration>,
    result: Result<String, WalletError>,
}

/// Mock wallet with a queue of predetermined signing outcomes
///
/// Once the queue is drained every request returns the default signature.
#[derive(Debug)]
pub struct MockWallet {
    address: String,
    default_signature: String,
    script: Mutex<VecDeque<ScriptedSign>>,
    signed_messages: Mutex<Vec<String>>,
    sign_calls: AtomicUsize,
    completed_signs: AtomicUsize,
    can_sign: AtomicBool,
    state_tx: watch::Sender<WalletState>,
}

impl MockWallet {
    /// Create a connected mock wallet for `address`
    pub fn connected(address: &str, default_signature: &str) -> Self {
        Self::with_state(address, default_signature, WalletState::connected(address))
    }

    /// Create a disconnected mock wallet; [`WalletCapability::connect`] exposes `address`
    pub fn disconnected(address: &str, default_signature: &str) -> Self {
        Self::with_state(address, default_signature, WalletState::disconnected())
    }

    fn with_state(address: &str, default_signature: &str, state: WalletState) -> Self {
        let (state_tx, _) = watch::channel(state);
        Self {
            address: address.to_string(),
            default_signature: default_signature.to_string(),
            script: Mutex::new(VecDeque::new()),
            signed_messages: Mutex::new(Vec::new()),
            sign_calls: AtomicUsize::new(0),
            completed_signs: AtomicUsize::new(0),
            can_sign: AtomicBool::new(true),
            state_tx,
        }
    }

    /// Queue a successful signature
    pub fn push_signature(&self, signature: &str) {
        self.push(None, Ok(signature.to_string()));
    }

    /// Queue a failure
    pub fn push_error(&self, error: WalletError) {
        self.push(None, Err(error));
    }

    /// Queue a signature that is only produced after `delay`
    pub fn push_delayed_signature(&self, delay: Duration, signature: &str) {
        self.push(Some(delay), Ok(signature.to_string()));
    }

    fn push(&self, delay: Option<Duration>, result: Result<String, WalletError>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(ScriptedSign { delay, result });
    }

    pub fn set_can_sign(&self, can_sign: bool) {
        self.can_sign.store(can_sign, Ordering::SeqCst);
    }

    /// Switch the connected account and notify subscribers
    pub fn switch_account(&self, address: &str) {
        self.state_tx.send_replace(WalletState::connected(address));
    }

    /// Simulate the provider dropping the connection
    pub fn drop_connection(&self) {
        self.state_tx.send_replace(WalletState::disconnected());
    }

    /// Number of sign requests received
    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    /// Number of sign requests that ran to completion
    pub fn completed_signs(&self) -> usize {
        self.completed_signs.load(Ordering::SeqCst)
    }

    pub fn signed_messages(&self) -> Vec<String> {
        self.signed_messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl WalletCapability for MockWallet {
    fn state(&self) -> WalletState {
        self.state_tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.state_tx.subscribe()
    }

    fn can_sign(&self) -> bool {
        self.can_sign.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<WalletState, WalletError> {
        let state = WalletState::connected(self.address.clone());
        self.state_tx.send_replace(state.clone());
        Ok(state)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.drop_connection();
        Ok(())
    }

    async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.signed_messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let step = next.unwrap_or_else(|| ScriptedSign {
            delay: None,
            result: Ok(self.default_signature.clone()),
        });

        if let Some(delay) = step.delay {
            tokio::time::sleep(delay).await;
        }
        self.completed_signs.fetch_add(1, Ordering::SeqCst);
        step.result
    }
}
