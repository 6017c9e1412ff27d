/*
[INPUT]:  Wallet address, challenge message and its signature
[OUTPUT]: Issued identity session and read-only account snapshots
[POS]:    Identity layer - backing identity service abstraction
[UPDATE]: When the identity service contract or its data models change
*/

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Backing identity service that turns a signed challenge into a session
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Verify the signature over `message` and issue a session for `address`
    async fn verify_and_issue_session(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<()>;

    async fn fetch_usage(&self, address: &str) -> Result<UsageStats>;

    async fn fetch_profile(&self, address: &str) -> Result<Profile>;

    async fn fetch_linked_socials(&self, address: &str) -> Result<LinkedSocials>;

    /// Drop any service-side session state
    async fn end_session(&self) {}
}

/// Platform usage counters for an account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub multiplier: f64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub data_uploads: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub address: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Social accounts linked to the identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedSocials {
    pub twitter: bool,
    pub discord: bool,
    pub spotify: bool,
    pub tiktok: bool,
    pub telegram: bool,
}

impl LinkedSocials {
    /// Names of the linked platforms
    pub fn linked(&self) -> Vec<&'static str> {
        [
            ("twitter", self.twitter),
            ("discord", self.discord),
            ("spotify", self.spotify),
            ("tiktok", self.tiktok),
            ("telegram", self.telegram),
        ]
        .into_iter()
        .filter_map(|(name, linked)| linked.then_some(name))
        .collect()
    }
}
