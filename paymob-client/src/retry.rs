//! Bounded retries with exponential backoff.
//!
//! One `send` call is a small state machine:
//!
//! | state           | event                              | next                   |
//! |-----------------|------------------------------------|------------------------|
//! | `Attempting(n)` | `Success`                          | `Done`                 |
//! | `Attempting(n)` | `TerminalFailure`                  | `Failed`               |
//! | `Attempting(n)` | `RetryableFailure`, `n < max`      | `BackingOff(n + 1)`    |
//! | `Attempting(n)` | `RetryableFailure`, `n == max`     | `Failed`               |
//! | `BackingOff(m)` | delay elapsed                      | `Attempting(m)`        |
//!
//! `max` counts total attempts, the first one included.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use paymob_types::{
    ConfigError, Outcome, PaymobError, RequestDescriptor, ResponseBody, TransportError,
    ValidationError,
};

use crate::config::TransportConfig;
use crate::executor::{HttpExecutor, Transport};

/// Base of the exponential backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Attempt budget and timing for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    attempt_timeout: Duration,
    operation_deadline: Option<Duration>,
}

impl RetryPolicy {
    /// Policy with the default 100ms backoff base and no operation deadline.
    pub fn new(max_attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: DEFAULT_BASE_DELAY,
            attempt_timeout,
            operation_deadline: None,
        }
    }

    /// Policy matching a transport config.
    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(config.max_attempts(), config.timeout())
    }

    /// Overrides the backoff base.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Caps the whole call, backoff included.
    pub fn with_operation_deadline(mut self, deadline: Duration) -> Self {
        self.operation_deadline = Some(deadline);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Wait after failed attempt `attempt` (1-indexed): `base * 2^(attempt - 1)`.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

/// States of a single `send` call.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryState {
    /// About to run attempt `n` (1-indexed).
    Attempting(u32),
    /// Waiting `delay` before attempt `next`; `last` is what triggered it.
    BackingOff {
        next: u32,
        delay: Duration,
        last: TransportError,
    },
    Done(ResponseBody),
    /// `None` only when no attempt ever ran.
    Failed(Option<TransportError>),
}

impl RetryState {
    pub fn initial(policy: &RetryPolicy) -> Self {
        if policy.max_attempts == 0 {
            RetryState::Failed(None)
        } else {
            RetryState::Attempting(1)
        }
    }

    /// Transition on the outcome of attempt `n`.
    pub fn after_attempt(policy: &RetryPolicy, n: u32, outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success(body) => RetryState::Done(body),
            Outcome::TerminalFailure(cause) => RetryState::Failed(Some(cause)),
            Outcome::RetryableFailure(cause) if n < policy.max_attempts => RetryState::BackingOff {
                next: n + 1,
                delay: policy.backoff_after(n),
                last: cause,
            },
            Outcome::RetryableFailure(cause) => RetryState::Failed(Some(cause)),
        }
    }
}

/// Drives a [`Transport`] through the retry state machine.
pub struct RetryCoordinator<T: Transport = HttpExecutor> {
    transport: T,
    policy: RetryPolicy,
}

impl RetryCoordinator<HttpExecutor> {
    pub fn from_config(config: &TransportConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            HttpExecutor::new(config)?,
            RetryPolicy::from_config(config),
        ))
    }
}

impl<T: Transport> RetryCoordinator<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `request`, retrying retryable failures within the budget.
    ///
    /// Returns the last error encountered once the budget is spent, or
    /// immediately on a terminal failure.
    #[instrument(
        skip(self, request),
        fields(request_id = %Uuid::new_v4(), method = %request.method, path = %request.path)
    )]
    pub async fn send(&self, request: &RequestDescriptor) -> Result<ResponseBody, PaymobError> {
        request.validate()?;

        let started = Instant::now();
        let mut last_error: Option<TransportError> = None;
        let mut state = RetryState::initial(&self.policy);

        loop {
            state = match state {
                RetryState::Attempting(n) => match self.attempt_deadline(started) {
                    Some(deadline) => {
                        debug!(attempt = n, max_attempts = self.policy.max_attempts, "Sending request");
                        let outcome = self.transport.execute(request, deadline).await;
                        RetryState::after_attempt(&self.policy, n, outcome)
                    }
                    None => RetryState::Failed(last_error.take().or_else(|| {
                        Some(TransportError::Timeout {
                            after: started.elapsed(),
                        })
                    })),
                },
                RetryState::BackingOff { next, delay, last } => {
                    warn!(
                        attempt = next - 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %last,
                        "Retryable failure, backing off"
                    );
                    if self.exceeds_deadline(started, delay) {
                        RetryState::Failed(Some(last))
                    } else {
                        tokio::time::sleep(delay).await;
                        last_error = Some(last);
                        RetryState::Attempting(next)
                    }
                }
                RetryState::Done(body) => return Ok(body),
                RetryState::Failed(Some(cause)) => {
                    warn!(error = %cause, "Request failed");
                    return Err(cause.into());
                }
                RetryState::Failed(None) => return Err(PaymobError::Unknown),
            };
        }
    }

    /// Like [`send`](Self::send), decoding a success body into `R`.
    pub async fn send_json<R: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
    ) -> Result<R, PaymobError> {
        let body = self.send(request).await?;
        serde_json::from_value(body.into_json())
            .map_err(|e| ValidationError::UnexpectedResponse(e.to_string()).into())
    }

    /// Deadline for the next attempt, or `None` once the operation deadline
    /// is spent.
    fn attempt_deadline(&self, started: Instant) -> Option<Duration> {
        match self.policy.operation_deadline {
            None => Some(self.policy.attempt_timeout),
            Some(total) => {
                let remaining = total.checked_sub(started.elapsed())?;
                if remaining.is_zero() {
                    None
                } else {
                    Some(remaining.min(self.policy.attempt_timeout))
                }
            }
        }
    }

    fn exceeds_deadline(&self, started: Instant, delay: Duration) -> bool {
        self.policy
            .operation_deadline
            .is_some_and(|total| started.elapsed() + delay >= total)
    }
}
