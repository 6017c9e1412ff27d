/*
[INPUT]:  Attempt start/settle events and the cooldown window
[OUTPUT]: Mutual exclusion, cooldown decisions and attempt generations
[POS]:    Bridge layer - anti-spam guard for authentication attempts
[UPDATE]: When changing throttling policy
*/

use std::time::Duration;

use tokio::time::Instant;

use crate::error::AuthError;

/// Tracks the in-flight attempt and the cooldown window.
///
/// `generation` moves on every accepted attempt and on every reset, so a
/// result is applied only by the attempt that is still current.
#[derive(Debug, Clone, Default)]
pub struct AttemptGuard {
    in_progress: bool,
    last_started: Option<Instant>,
    generation: u64,
}

impl AttemptGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Time left in the cooldown window, `None` when a new attempt is allowed
    pub fn cooldown_remaining(&self, now: Instant, cooldown: Duration) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(self.last_started?);
        cooldown.checked_sub(elapsed).filter(|left| !left.is_zero())
    }

    /// Throttling preconditions, in order: in-flight attempt, then cooldown
    pub fn check(&self, now: Instant, cooldown: Duration) -> Result<(), AuthError> {
        if self.in_progress {
            return Err(AuthError::AlreadyInProgress);
        }
        match self.cooldown_remaining(now, cooldown) {
            Some(remaining) => Err(AuthError::CooldownActive { remaining }),
            None => Ok(()),
        }
    }

    /// Mark a new attempt as started and return its generation
    pub fn begin(&mut self, now: Instant) -> u64 {
        self.in_progress = true;
        self.last_started = Some(now);
        self.generation += 1;
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.in_progress && self.generation == generation
    }

    /// Clear the in-flight flag if `generation` is still current.
    ///
    /// Returns false for superseded attempts, whose results must be dropped.
    /// The cooldown timestamp is kept either way.
    pub fn settle(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.in_progress = false;
        true
    }

    /// Back to the initial state; any in-flight attempt becomes stale
    pub fn reset(&mut self) {
        self.in_progress = false;
        self.last_started = None;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(10);

    #[test]
    fn test_fresh_guard_allows_attempt() {
        let guard = AttemptGuard::new();
        assert!(guard.check(Instant::now(), COOLDOWN).is_ok());
        assert!(!guard.in_progress());
    }

    #[test]
    fn test_in_progress_checked_before_cooldown() {
        let mut guard = AttemptGuard::new();
        let now = Instant::now();
        guard.begin(now);
        assert_eq!(guard.check(now, COOLDOWN), Err(AuthError::AlreadyInProgress));
    }

    #[test]
    fn test_cooldown_survives_settle() {
        let mut guard = AttemptGuard::new();
        let start = Instant::now();
        let generation = guard.begin(start);
        assert!(guard.settle(generation));

        let later = start + Duration::from_secs(4);
        assert_eq!(
            guard.check(later, COOLDOWN),
            Err(AuthError::CooldownActive {
                remaining: Duration::from_secs(6)
            })
        );
        assert!(guard.check(start + COOLDOWN, COOLDOWN).is_ok());
    }

    #[test]
    fn test_reset_makes_attempt_stale_and_clears_cooldown() {
        let mut guard = AttemptGuard::new();
        let now = Instant::now();
        let generation = guard.begin(now);

        guard.reset();
        assert!(!guard.settle(generation));
        assert!(guard.check(now, COOLDOWN).is_ok());
    }

    #[test]
    fn test_settle_ignores_older_generation() {
        let mut guard = AttemptGuard::new();
        let now = Instant::now();
        let first = guard.begin(now);
        assert!(guard.settle(first));
        let second = guard.begin(now + COOLDOWN);

        assert!(!guard.settle(first));
        assert!(guard.in_progress());
        assert!(guard.settle(second));
    }
}
