/*
[INPUT]:  Access tokens issued by the identity service and their lifetimes
[OUTPUT]: Token retrieval bound to an address, and expiration status
[POS]:    Identity layer - access token lifecycle management
[UPDATE]: When adding token refresh or changing storage strategy
*/

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};

/// Stored token data with metadata
#[derive(Debug, Clone)]
pub struct TokenData {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub wallet_address: String,
}

/// Thread-safe access token store
#[derive(Debug, Clone, Default)]
pub struct AccessTokenStore {
    data: Arc<RwLock<Option<TokenData>>>,
}

impl AccessTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new token with expiration
    pub fn set_token(&self, token: String, expires_seconds: u64, wallet_address: String) {
        let expires_at = i64::try_from(expires_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let token_data = TokenData {
            token,
            expires_at,
            wallet_address,
        };

        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token_data);
    }

    /// Unexpired token issued for `address` (case-insensitive match)
    pub fn token_for(&self, address: &str) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|data| Utc::now() <= data.expires_at)
            .filter(|data| data.wallet_address.eq_ignore_ascii_case(address.trim()))
            .map(|data| data.token.clone())
    }

    /// Check if token is expired (or absent)
    pub fn is_expired(&self) -> bool {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(data) => Utc::now() > data.expires_at,
            None => true,
        }
    }

    /// Clear the stored token
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}
