//! Error types and handling
//!
//! Two families of errors exist in Buyflow:
//!
//! - [`ProviderError`] — raised by signal providers. These never escape the
//!   retry executor: the pipeline only ever observes them as a `Degraded`
//!   branch outcome carrying an [`ErrorKind`].
//! - [`EngineError`] — raised by the engine's own surfaces (configuration,
//!   event parsing, metrics emission). Configuration errors are fatal at
//!   startup; validation errors skip a single event.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extension trait for provider errors
///
/// Indicates whether an error is worth retrying. The retry executor uses
/// this to decide between another attempt and an immediate degraded outcome.
pub trait ProviderErrorExt {
    /// Returns whether the error is recoverable via retry
    fn is_recoverable(&self) -> bool;

    /// Classify the error for degraded-branch reporting
    fn kind(&self) -> ErrorKind;
}

/// Error raised by a signal provider call
///
/// Providers classify their own failures: network hiccups and throttling are
/// `Transient` (the retry executor will try again), malformed responses and
/// authentication failures are `Fatal` (no further attempts).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Retryable failure (network, throttling, upstream flakiness)
    #[error("transient provider error: {0}")]
    Transient(String),

    /// Non-retryable failure (malformed response, auth, contract violation)
    #[error("fatal provider error: {0}")]
    Fatal(String),
}

impl ProviderErrorExt for ProviderError {
    fn is_recoverable(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }

    fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Transient(_) => ErrorKind::Transient,
            ProviderError::Fatal(_) => ErrorKind::Fatal,
        }
    }
}

/// Classification of a degraded branch outcome
///
/// Carried in `BranchResult::Degraded` so downstream consumers can tell why
/// a component score was substituted with a neutral default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transient provider failures exhausted the retry budget
    Transient,
    /// Per-attempt timeouts exhausted the retry budget
    Timeout,
    /// A fatal provider error aborted the branch immediately
    Fatal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Transient => write!(f, "transient"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::Fatal => write!(f, "fatal"),
        }
    }
}

/// Main engine error type
///
/// Errors raised by the engine's own surfaces, as opposed to provider
/// failures (which are absorbed by the retry executor).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid or unreadable configuration — fatal at startup, no events are
    /// processed with a bad config
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single event failed validation and was skipped
    #[error("Validation error: {0}")]
    Validation(String),

    /// The event source could not be read
    #[error("Event source error: {0}")]
    EventSource(String),

    /// The metrics sink failed to record
    #[error("Metrics error: {0}")]
    Metrics(String),
}
