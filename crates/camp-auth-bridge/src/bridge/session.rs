/*
[INPUT]:  Address and signature of a completed challenge exchange
[OUTPUT]: Authenticated session value and the combined bridge state
[POS]:    Bridge layer - session model
[UPDATE]: When adding authentication methods or session metadata
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which authentication path produced a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    WalletSignature,
}

/// Authenticated identity, or the empty session.
///
/// A proof exists exactly when the session is authenticated; the only way to
/// build a non-empty session is [`Session::authenticated`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    inner: Option<SessionData>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionData {
    address: String,
    proof: String,
    method: AuthMethod,
    authenticated_at: DateTime<Utc>,
}

impl Session {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn authenticated(address: String, proof: String, method: AuthMethod) -> Self {
        Self {
            inner: Some(SessionData {
                address,
                proof,
                method,
                authenticated_at: Utc::now(),
            }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.is_some()
    }

    pub fn address(&self) -> Option<&str> {
        self.inner.as_ref().map(|data| data.address.as_str())
    }

    /// The signature that proved key ownership
    pub fn proof(&self) -> Option<&str> {
        self.inner.as_ref().map(|data| data.proof.as_str())
    }

    pub fn method(&self) -> Option<AuthMethod> {
        self.inner.as_ref().map(|data| data.method)
    }

    pub fn authenticated_at(&self) -> Option<DateTime<Utc>> {
        self.inner.as_ref().map(|data| data.authenticated_at)
    }
}

/// Combined session/attempt state exposed to UI code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Idle,
    Authenticating,
    Authenticated,
    Error,
}
