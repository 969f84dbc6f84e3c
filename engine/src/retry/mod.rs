//! Retry executor
//!
//! Wraps a single asynchronous provider call with bounded retries,
//! exponential backoff, and a per-attempt timeout. The executor is the
//! mechanism by which one failing branch cannot abort a pipeline run: it
//! never propagates an error to its caller, only a tagged
//! [`BranchResult`].
//!
//! Classification follows the provider's own typing: `Transient` failures
//! (and attempt timeouts) are retried until the attempt budget runs out,
//! `Fatal` failures abort immediately.

use sdk::errors::{ErrorKind, ProviderError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry and timeout discipline for one branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Multiplier applied to the delay for each subsequent attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound on any single backoff delay, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Hard timeout applied to each attempt, in milliseconds
    #[serde(default = "default_timeout_per_attempt_ms")]
    pub timeout_per_attempt_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    2_000
}

fn default_timeout_per_attempt_ms() -> u64 {
    2_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay_ms(),
            timeout_per_attempt_ms: default_timeout_per_attempt_ms(),
        }
    }
}

impl RetryPolicy {
    /// Delay inserted before attempt `n` (n >= 2):
    /// `min(max_delay, base_delay * multiplier^(n-2))`
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let exp = (attempt - 2) as i32;
        let raw = self.base_delay_ms as f64 * self.backoff_multiplier.powi(exp);
        let capped = raw.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Per-attempt timeout as a `Duration`
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_per_attempt_ms)
    }
}

/// Tagged outcome of one branch invocation
///
/// Callers branch on the tag, never on caught errors. A `Degraded` outcome
/// means the retry budget was exhausted or a fatal error occurred; the
/// pipeline substitutes a neutral score and carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchResult<T> {
    Success {
        value: T,
        /// Attempt number on which the call succeeded (1-based)
        attempts: u32,
    },
    Degraded {
        reason: ErrorKind,
        /// Number of attempts consumed before giving up
        attempts: u32,
    },
}

impl<T> BranchResult<T> {
    /// Returns whether this outcome is degraded
    pub fn is_degraded(&self) -> bool {
        matches!(self, BranchResult::Degraded { .. })
    }

    /// Attempt count, regardless of outcome
    pub fn attempts(&self) -> u32 {
        match self {
            BranchResult::Success { attempts, .. } => *attempts,
            BranchResult::Degraded { attempts, .. } => *attempts,
        }
    }

    /// Map the success value, preserving the tag and attempt count
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BranchResult<U> {
        match self {
            BranchResult::Success { value, attempts } => BranchResult::Success {
                value: f(value),
                attempts,
            },
            BranchResult::Degraded { reason, attempts } => {
                BranchResult::Degraded { reason, attempts }
            }
        }
    }

    /// Success value, if any
    pub fn into_value(self) -> Option<T> {
        match self {
            BranchResult::Success { value, .. } => Some(value),
            BranchResult::Degraded { .. } => None,
        }
    }
}

/// Execute `operation` under the given retry policy.
///
/// Each attempt runs under a hard timeout; a timeout counts as a transient
/// failure. Transient failures are retried with exponential backoff up to
/// `max_attempts`; a fatal failure aborts immediately. The returned
/// [`BranchResult`] is the only way outcomes leave this function.
pub async fn execute<T, F, Fut>(name: &str, policy: &RetryPolicy, mut operation: F) -> BranchResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    let mut last_kind = ErrorKind::Transient;

    loop {
        attempt += 1;

        match tokio::time::timeout(policy.attempt_timeout(), operation()).await {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    debug!("Branch '{}' recovered on attempt {}", name, attempt);
                }
                return BranchResult::Success { value, attempts: attempt };
            }
            Ok(Err(ProviderError::Fatal(msg))) => {
                warn!(
                    "Branch '{}' hit fatal error on attempt {}: {}",
                    name, attempt, msg
                );
                return BranchResult::Degraded {
                    reason: ErrorKind::Fatal,
                    attempts: attempt,
                };
            }
            Ok(Err(ProviderError::Transient(msg))) => {
                debug!(
                    "Branch '{}' transient failure on attempt {}/{}: {}",
                    name, attempt, max_attempts, msg
                );
                last_kind = ErrorKind::Transient;
            }
            Err(_) => {
                debug!(
                    "Branch '{}' timed out after {:?} on attempt {}/{}",
                    name,
                    policy.attempt_timeout(),
                    attempt,
                    max_attempts
                );
                last_kind = ErrorKind::Timeout;
            }
        }

        if attempt >= max_attempts {
            warn!(
                "Branch '{}' degraded ({}) after {} attempts",
                name, last_kind, attempt
            );
            return BranchResult::Degraded {
                reason: last_kind,
                attempts: attempt,
            };
        }

        tokio::time::sleep(policy.delay_before_attempt(attempt + 1)).await;
    }
}
