/*
[INPUT]:  Signed challenges and a fixed round-trip latency
[OUTPUT]: In-memory identity sessions and default account snapshots
[POS]:    Identity layer - offline stand-in for the identity backend
[UPDATE]: When the IdentityService contract changes
*/

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::error::{IdentityError, Result};
use crate::identity::{IdentityService, LinkedSocials, Profile, UsageStats};

/// Identity service that accepts any non-empty signature after a fixed delay
#[derive(Debug)]
pub struct SimulatedIdentityService {
    latency: Duration,
    sessions: Mutex<HashSet<String>>,
    verify_calls: AtomicUsize,
}

impl SimulatedIdentityService {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            sessions: Mutex::new(HashSet::new()),
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    fn has_session(&self, address: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&normalize(address))
    }

    fn require_session(&self, address: &str) -> Result<()> {
        if self.has_session(address) {
            Ok(())
        } else {
            Err(IdentityError::Unauthenticated)
        }
    }
}

fn normalize(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

#[async_trait]
impl IdentityService for SimulatedIdentityService {
    async fn verify_and_issue_session(
        &self,
        address: &str,
        _message: &str,
        signature: &str,
    ) -> Result<()> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;

        if signature.trim().is_empty() {
            return Err(IdentityError::Rejected("empty signature".to_string()));
        }

        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize(address));
        debug!(%address, "simulated identity session issued");
        Ok(())
    }

    async fn fetch_usage(&self, address: &str) -> Result<UsageStats> {
        self.require_session(address)?;
        Ok(UsageStats {
            points: 0,
            multiplier: 1.0,
            active: true,
            data_uploads: 0,
        })
    }

    async fn fetch_profile(&self, address: &str) -> Result<Profile> {
        self.require_session(address)?;
        Ok(Profile {
            address: address.to_string(),
            username: None,
            avatar_url: None,
            created_at: Some(Utc::now()),
        })
    }

    async fn fetch_linked_socials(&self, address: &str) -> Result<LinkedSocials> {
        self.require_session(address)?;
        Ok(LinkedSocials::default())
    }

    async fn end_session(&self) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
