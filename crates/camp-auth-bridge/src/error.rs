/*
[INPUT]:  Failure sources (wallet provider, identity service, bridge preconditions)
[OUTPUT]: Structured error types with user-facing messages and recovery hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new failure conditions or wallet SDK error strings
*/

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Conditions an authentication attempt can end in.
///
/// These never escape [`crate::AuthBridge::authenticate`]; the bridge stores
/// the last one so UI code can render it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Wallet is not connected or has no account
    #[error("Wallet not connected")]
    NotConnected,

    /// Wallet cannot sign messages
    #[error("Connected wallet does not support message signing")]
    SigningUnsupported,

    /// Previous attempt started too recently
    #[error("Please wait {}s before trying again", ceil_secs(.remaining))]
    CooldownActive { remaining: Duration },

    /// Another attempt is still running (never stored, the call is ignored)
    #[error("Authentication already in progress")]
    AlreadyInProgress,

    /// User declined the signature prompt
    #[error("Authentication cancelled by user")]
    UserCancelled,

    /// Signature request exceeded the configured bound
    #[error("Signature request timed out")]
    RequestTimedOut,

    /// Wallet provider still has an earlier request open
    #[error("A previous wallet request is still pending, check your wallet app")]
    ProviderConflict,

    /// Any other signing failure
    #[error("Authentication failed: {0}")]
    GenericAuthFailure(String),

    /// Identity service refused the signed challenge
    #[error("Identity service verification failed: {0}")]
    ServiceVerificationFailed(String),
}

impl AuthError {
    /// Text to show in the UI
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Recovery may need the wallet-provider session restarted
    pub fn needs_provider_reset(&self) -> bool {
        matches!(self, AuthError::ProviderConflict)
    }

    /// Time left before another attempt is accepted, if this is a cooldown rejection
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AuthError::CooldownActive { remaining } => Some(*remaining),
            _ => None,
        }
    }
}

fn ceil_secs(duration: &Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Errors reported by a wallet capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("User rejected the request")]
    UserRejected,

    #[error("Wallet request timed out")]
    Timeout,

    /// Host UI lost input focus while the signing prompt was open
    #[error("Wallet prompt lost focus")]
    FocusLost,

    /// Provider-level duplicate request (JSON-RPC -32002 and friends)
    #[error("A wallet request is already pending")]
    AlreadyPending,

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Wallet error: {0}")]
    Other(String),
}

impl WalletError {
    /// Classify a free-text error coming from a wallet SDK.
    ///
    /// Matching is case-insensitive. Unknown text maps to [`WalletError::Other`].
    pub fn from_provider_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();

        if lower.contains("user rejected")
            || lower.contains("user denied")
            || lower.contains("rejected by user")
        {
            WalletError::UserRejected
        } else if lower.contains("already pending")
            || lower.contains("-32002")
            || lower.contains("pending request")
            || lower.contains("no matching key")
        {
            WalletError::AlreadyPending
        } else if lower.contains("focus") {
            WalletError::FocusLost
        } else if lower.contains("timed out") || lower.contains("timeout") {
            WalletError::Timeout
        } else if lower.contains("not connected") {
            WalletError::NotConnected
        } else {
            WalletError::Other(message.to_string())
        }
    }

    /// Environment-induced failure that is worth one retry
    pub fn is_focus_loss(&self) -> bool {
        matches!(self, WalletError::FocusLost)
    }
}

impl From<WalletError> for AuthError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::UserRejected => AuthError::UserCancelled,
            WalletError::Timeout => AuthError::RequestTimedOut,
            WalletError::AlreadyPending => AuthError::ProviderConflict,
            WalletError::NotConnected => AuthError::NotConnected,
            WalletError::FocusLost => {
                AuthError::GenericAuthFailure("wallet prompt lost focus".to_string())
            }
            WalletError::Other(message) => AuthError::GenericAuthFailure(message),
        }
    }
}

/// Errors from the backing identity service
#[derive(Error, Debug)]
pub enum IdentityError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned an error response
    #[error("API error (code {status}): {message}")]
    Api { status: u16, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Service refused the signed challenge
    #[error("Signature rejected: {0}")]
    Rejected(String),

    /// No valid access token for the requested address
    #[error("Not authenticated with identity service")]
    Unauthenticated,
}

impl IdentityError {
    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        IdentityError::Api {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            IdentityError::Http(_) => true,
            IdentityError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Result type alias for identity service operations
pub type Result<T> = std::result::Result<T, IdentityError>;

/// Errors raised while bootstrapping the provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Settings could not be loaded or deserialized
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    /// Identity service could not be constructed
    #[error("Identity service setup failed: {0}")]
    Identity(#[from] IdentityError),

    /// Tracing subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    Telemetry(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("MetaMask Tx Signature: User rejected the request.", WalletError::UserRejected)]
    #[case("User denied message signature", WalletError::UserRejected)]
    #[case("Request of type 'personal_sign' already pending for origin", WalletError::AlreadyPending)]
    #[case("RPC Error -32002: Resource unavailable", WalletError::AlreadyPending)]
    #[case("Window lost focus during signing", WalletError::FocusLost)]
    #[case("request timed out", WalletError::Timeout)]
    fn test_classify_provider_message(#[case] message: &str, #[case] expected: WalletError) {
        assert_eq!(WalletError::from_provider_message(message), expected);
    }

    #[test]
    fn test_classify_unknown_message_keeps_text() {
        let err = WalletError::from_provider_message("chain mismatch");
        assert_eq!(err, WalletError::Other("chain mismatch".to_string()));
    }

    #[test]
    fn test_wallet_error_to_auth_error() {
        assert_eq!(AuthError::from(WalletError::UserRejected), AuthError::UserCancelled);
        assert_eq!(AuthError::from(WalletError::AlreadyPending), AuthError::ProviderConflict);
        assert_eq!(AuthError::from(WalletError::Timeout), AuthError::RequestTimedOut);
        assert!(matches!(
            AuthError::from(WalletError::Other("boom".into())),
            AuthError::GenericAuthFailure(msg) if msg == "boom"
        ));
    }

    #[test]
    fn test_cooldown_message_rounds_up() {
        let err = AuthError::CooldownActive {
            remaining: Duration::from_millis(4_200),
        };
        assert_eq!(err.user_message(), "Please wait 5s before trying again");
        assert_eq!(err.retry_after(), Some(Duration::from_millis(4_200)));
    }

    #[test]
    fn test_only_provider_conflict_needs_reset() {
        assert!(AuthError::ProviderConflict.needs_provider_reset());
        assert!(!AuthError::UserCancelled.needs_provider_reset());
        assert!(!AuthError::RequestTimedOut.needs_provider_reset());
    }

    #[test]
    fn test_identity_error_retryable() {
        let server_err = IdentityError::api_error(StatusCode::BAD_GATEWAY, "upstream");
        assert!(server_err.is_retryable());

        let client_err = IdentityError::api_error(StatusCode::BAD_REQUEST, "bad signature");
        assert!(!client_err.is_retryable());
        assert!(!IdentityError::Unauthenticated.is_retryable());
    }
}
