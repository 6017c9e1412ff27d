/*
[INPUT]:  Wallet capability, identity service and BridgeConfig timing policy
[OUTPUT]: Authenticated session state, last error and account snapshots
[POS]:    Bridge layer - orchestrates the challenge-sign-verify flow
[UPDATE]: When auth flow steps, throttling or failure handling change
*/

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::bridge::{AttemptGuard, AuthMethod, AuthState, ChallengeMessage, Session};
use crate::config::BridgeConfig;
use crate::error::{AuthError, IdentityError, WalletError};
use crate::identity::{IdentityService, LinkedSocials, Profile, UsageStats};
use crate::wallet::{WalletCapability, WalletState};

#[derive(Debug, Default)]
struct BridgeState {
    session: Session,
    attempt: AttemptGuard,
    last_error: Option<AuthError>,
}

struct Inner {
    wallet: Arc<dyn WalletCapability>,
    identity: Arc<dyn IdentityService>,
    config: BridgeConfig,
    state: Mutex<BridgeState>,
}

/// Coordinates wallet connection state with the sign-in challenge exchange.
///
/// Cheap to clone; clones share the same session. The state lock is never
/// held across an await point.
#[derive(Clone)]
pub struct AuthBridge {
    inner: Arc<Inner>,
}

impl fmt::Debug for AuthBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthBridge")
            .field("state", &*self.lock())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl AuthBridge {
    pub fn new(
        wallet: Arc<dyn WalletCapability>,
        identity: Arc<dyn IdentityService>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                wallet,
                identity,
                config,
                state: Mutex::new(BridgeState::default()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn session(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_authenticated()
    }

    pub fn is_in_progress(&self) -> bool {
        self.lock().attempt.in_progress()
    }

    pub fn last_error(&self) -> Option<AuthError> {
        self.lock().last_error.clone()
    }

    /// User-facing text for the last error
    pub fn error_message(&self) -> Option<String> {
        self.lock().last_error.as_ref().map(AuthError::user_message)
    }

    /// Time until the next attempt is accepted
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        self.lock()
            .attempt
            .cooldown_remaining(Instant::now(), self.inner.config.cooldown())
    }

    pub fn state(&self) -> AuthState {
        let state = self.lock();
        if state.attempt.in_progress() {
            AuthState::Authenticating
        } else if state.session.is_authenticated() {
            AuthState::Authenticated
        } else if state.last_error.is_some() {
            AuthState::Error
        } else {
            AuthState::Idle
        }
    }

    /// Run one challenge-sign-verify exchange.
    ///
    /// Failures never propagate: they are stored and readable through
    /// [`AuthBridge::last_error`]. Calls made while an attempt is running are
    /// ignored.
    pub async fn authenticate(&self) -> AuthState {
        let Some((generation, address)) = self.begin_attempt() else {
            return self.state();
        };

        let challenge = ChallengeMessage::new(&self.inner.config.challenge_template, &address);
        let outcome = self.exchange(generation, &challenge).await;
        self.settle(generation, &address, outcome);

        self.state()
    }

    fn begin_attempt(&self) -> Option<(u64, String)> {
        let now = Instant::now();
        let mut state = self.lock();

        match state.attempt.check(now, self.inner.config.cooldown()) {
            Ok(()) => {}
            Err(AuthError::AlreadyInProgress) => {
                debug!("authentication already in progress, ignoring request");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "authentication rejected");
                state.last_error = Some(err);
                return None;
            }
        }

        let wallet_state = self.inner.wallet.state();
        let Some(address) = wallet_state.active_address().map(str::to_string) else {
            warn!("authentication rejected: wallet not connected");
            state.last_error = Some(AuthError::NotConnected);
            return None;
        };

        if !self.inner.wallet.can_sign() {
            warn!(%address, "authentication rejected: wallet cannot sign messages");
            state.last_error = Some(AuthError::SigningUnsupported);
            return None;
        }

        let generation = state.attempt.begin(now);
        state.last_error = None;
        info!(%address, attempt = generation, "authentication started");
        Some((generation, address))
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().attempt.is_current(generation)
    }

    /// Signature request (bounded, with focus retry) followed by service verification
    async fn exchange(
        &self,
        generation: u64,
        challenge: &ChallengeMessage,
    ) -> Result<String, AuthError> {
        let sign_timeout = self.inner.config.sign_timeout();
        let signature = match tokio::time::timeout(
            sign_timeout,
            self.sign_with_focus_retry(challenge.text()),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    attempt = generation,
                    timeout_ms = sign_timeout.as_millis() as u64,
                    "signature request timed out"
                );
                return Err(AuthError::RequestTimedOut);
            }
        };

        if signature.trim().is_empty() {
            return Err(AuthError::GenericAuthFailure(
                "wallet returned an empty signature".to_string(),
            ));
        }

        if !self.is_current(generation) {
            return Err(AuthError::GenericAuthFailure(
                "authentication attempt superseded".to_string(),
            ));
        }

        self.inner
            .identity
            .verify_and_issue_session(challenge.address(), challenge.text(), &signature)
            .await
            .map_err(|err: IdentityError| AuthError::ServiceVerificationFailed(err.to_string()))?;

        // Sign-out or an account switch may have happened while the service was verifying
        if !self.is_current(generation) {
            self.release_orphaned_identity_session(generation).await;
            return Err(AuthError::GenericAuthFailure(
                "authentication attempt superseded".to_string(),
            ));
        }
        if !self.wallet_matches(challenge.address()) {
            warn!(
                address = %challenge.address(),
                "wallet account changed during authentication"
            );
            self.release_orphaned_identity_session(generation).await;
            return Err(AuthError::GenericAuthFailure(
                "wallet account changed during authentication".to_string(),
            ));
        }

        Ok(signature)
    }

    fn wallet_matches(&self, address: &str) -> bool {
        self.inner
            .wallet
            .state()
            .active_address()
            .is_some_and(|current| current.eq_ignore_ascii_case(address))
    }

    /// End the identity-service session issued for an attempt that will not be
    /// installed, unless a session or a newer attempt now owns the service.
    async fn release_orphaned_identity_session(&self, generation: u64) {
        let orphaned = {
            let state = self.lock();
            !state.session.is_authenticated()
                && (!state.attempt.in_progress() || state.attempt.is_current(generation))
        };
        if orphaned {
            debug!(attempt = generation, "ending identity session of discarded attempt");
            self.inner.identity.end_session().await;
        } else {
            debug!(
                attempt = generation,
                current = self.lock().attempt.generation(),
                "identity session now owned by a newer attempt, keeping it"
            );
        }
    }

    async fn sign_with_focus_retry(&self, message: &str) -> Result<String, WalletError> {
        match self.inner.wallet.sign_message(message).await {
            Err(err) if err.is_focus_loss() => {
                let delay = self.inner.config.focus_retry_delay();
                warn!(
                    delay_ms = delay.as_millis() as u64,
                    "wallet prompt lost focus, retrying once"
                );
                tokio::time::sleep(delay).await;
                self.inner.wallet.sign_message(message).await
            }
            other => other,
        }
    }

    fn settle(&self, generation: u64, address: &str, outcome: Result<String, AuthError>) {
        let mut state = self.lock();
        if !state.attempt.settle(generation) {
            warn!(
                attempt = generation,
                "discarding result of superseded authentication attempt"
            );
            return;
        }

        match outcome {
            Ok(proof) => {
                if !self.wallet_matches(address) {
                    warn!(%address, "wallet account changed during authentication");
                    state.last_error = Some(AuthError::GenericAuthFailure(
                        "wallet account changed during authentication".to_string(),
                    ));
                    return;
                }

                state.session = Session::authenticated(
                    address.to_string(),
                    proof,
                    AuthMethod::WalletSignature,
                );
                state.last_error = None;
                info!(%address, attempt = generation, "authenticated");
            }
            Err(err) => {
                warn!(
                    %address,
                    attempt = generation,
                    error = %err,
                    provider_reset = err.needs_provider_reset(),
                    "authentication failed"
                );
                state.last_error = Some(err);
            }
        }
    }

    /// Clear the session and throttling state so a fresh attempt is allowed.
    ///
    /// Idempotent. Any in-flight attempt's result will be discarded.
    pub async fn sign_out(&self) {
        let was_authenticated = {
            let mut state = self.lock();
            let was_authenticated = state.session.is_authenticated();
            state.session = Session::empty();
            state.last_error = None;
            state.attempt.reset();
            was_authenticated
        };

        if was_authenticated {
            info!("signed out");
        } else {
            debug!("sign out on empty session");
        }
        self.inner.identity.end_session().await;
    }

    /// Called when the wallet reports it is no longer connected
    pub async fn react_to_wallet_disconnect(&self) {
        debug!("wallet disconnected, clearing session");
        self.sign_out().await;
    }

    /// Ask the wallet provider to disconnect, then sign out
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let result = self.inner.wallet.disconnect().await;
        if let Err(err) = &result {
            warn!(error = %err, "wallet disconnect failed");
        }
        self.sign_out().await;
        result
    }

    /// Follow wallet state changes on a background task.
    ///
    /// Signs out when the wallet disconnects or switches to another account.
    /// The task holds only a weak handle: it ends when the wallet drops its
    /// notifier, or at the first wallet change observed after every bridge
    /// handle is gone. Abort the returned handle to stop it sooner.
    pub fn watch_wallet(&self) -> JoinHandle<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let mut rx = self.inner.wallet.subscribe();

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let current = rx.borrow_and_update().clone();
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                AuthBridge { inner }.handle_wallet_change(&current).await;
            }
            debug!("wallet watcher stopped");
        })
    }

    async fn handle_wallet_change(&self, current: &WalletState) {
        if !current.is_connected {
            self.react_to_wallet_disconnect().await;
            return;
        }

        let session_address = self.lock().session.address().map(str::to_string);
        if let Some(session_address) = session_address {
            let same_account = current
                .active_address()
                .is_some_and(|address| address.eq_ignore_ascii_case(&session_address));
            if !same_account {
                warn!(
                    previous = %session_address,
                    current = ?current.address,
                    "wallet account changed, discarding session"
                );
                self.sign_out().await;
            }
        }
    }

    fn authenticated_address(&self) -> Option<String> {
        let address = self.lock().session.address().map(str::to_string);
        if address.is_none() {
            debug!("identity query skipped: not authenticated");
        }
        address
    }

    pub async fn query_usage(&self) -> Option<UsageStats> {
        let address = self.authenticated_address()?;
        snapshot("usage", self.inner.identity.fetch_usage(&address).await)
    }

    pub async fn query_profile(&self) -> Option<Profile> {
        let address = self.authenticated_address()?;
        snapshot("profile", self.inner.identity.fetch_profile(&address).await)
    }

    pub async fn query_linked_socials(&self) -> Option<LinkedSocials> {
        let address = self.authenticated_address()?;
        snapshot(
            "linked_socials",
            self.inner.identity.fetch_linked_socials(&address).await,
        )
    }
}

fn snapshot<T>(query: &'static str, result: Result<T, IdentityError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                query,
                error = %err,
                retryable = err.is_retryable(),
                "identity query failed"
            );
            None
        }
    }
}
