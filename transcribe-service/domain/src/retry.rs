use std::time::Duration;

use crate::TranscriptionError;

/// Extra seconds added on top of the remote `estimated_time` hint.
pub const ESTIMATED_TIME_MARGIN_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_wait: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_wait: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            initial_wait,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_wait(&self) -> Duration {
        self.initial_wait
    }

    /// Wait before the next attempt after a "model loading" answer.
    ///
    /// With a hint the wait is `max(initial_wait, trunc(hint) + 5s)`,
    /// without one it grows linearly: `initial_wait * (attempt + 1)`.
    pub fn model_loading_wait(&self, attempt: u32, estimated_time_secs: Option<f64>) -> Duration {
        match estimated_time_secs.filter(|value| value.is_finite()) {
            Some(estimated) => {
                let hinted = (estimated.trunc() + ESTIMATED_TIME_MARGIN_SECS as f64).max(0.0);
                self.initial_wait.max(Duration::from_secs(hinted as u64))
            }
            None => self.initial_wait.saturating_mul(attempt.saturating_add(1)),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(20))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Wait(Duration),
    GiveUp(TranscriptionError),
}

/// Attempt bookkeeping for a single chunk call.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn on_model_loading(&mut self, estimated_time_secs: Option<f64>) -> RetryDecision {
        let next = self.attempt + 1;
        if next >= self.policy.max_retries() {
            return RetryDecision::GiveUp(TranscriptionError::RetriesExhausted { attempts: next });
        }
        let wait = self
            .policy
            .model_loading_wait(self.attempt, estimated_time_secs);
        self.attempt = next;
        RetryDecision::Wait(wait)
    }
}
