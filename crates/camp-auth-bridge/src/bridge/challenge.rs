/*
[INPUT]:  Challenge template and the wallet address being authenticated
[OUTPUT]: Single-use challenge text for the wallet to sign
[POS]:    Bridge layer - sign-in challenge construction
[UPDATE]: When changing the challenge format
*/

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Last issued challenge timestamp (unix millis); keeps timestamps strictly increasing
static LAST_ISSUED_MS: AtomicI64 = AtomicI64::new(0);

fn next_issued_at() -> DateTime<Utc> {
    let now = Utc::now();
    let now_ms = now.timestamp_millis();
    let mut last = LAST_ISSUED_MS.load(Ordering::SeqCst);
    loop {
        let next = now_ms.max(last.saturating_add(1));
        match LAST_ISSUED_MS.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return DateTime::<Utc>::from_timestamp_millis(next).unwrap_or(now),
            Err(actual) => last = actual,
        }
    }
}

/// A freshly generated, never reused sign-in challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeMessage {
    address: String,
    issued_at: DateTime<Utc>,
    nonce: Uuid,
    text: String,
}

impl ChallengeMessage {
    /// Render `template`, substituting `{address}`, `{timestamp}` and `{nonce}`
    pub fn new(template: &str, address: &str) -> Self {
        let issued_at = next_issued_at();
        let nonce = Uuid::new_v4();
        let text = template
            .replace("{address}", address)
            .replace(
                "{timestamp}",
                &issued_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            )
            .replace("{nonce}", &nonce.to_string());

        Self {
            address: address.to_string(),
            issued_at,
            nonce,
            text,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn nonce(&self) -> Uuid {
        self.nonce
    }

    /// Exact text handed to the wallet for signing
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for ChallengeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
