use std::time::Duration;

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    Exhausted,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempts: 0,
        }
    }
}

/// Attempt counter for one run of an operation under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetryState {
    /// Number of the attempt about to be made, starting at 1.
    pub fn next_attempt(&self) -> u32 {
        self.attempts + 1
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    pub fn record_failure(&mut self) -> RetryDecision {
        self.attempts = self.attempts.saturating_add(1);

        if self.attempts >= self.policy.max_attempts {
            RetryDecision::Exhausted
        } else {
            RetryDecision::RetryAfter(self.policy.delay)
        }
    }
}
