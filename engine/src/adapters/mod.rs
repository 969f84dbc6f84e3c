//! Signal adapters
//!
//! Each adapter normalizes one or more provider calls into a single
//! component score in [0, 1] plus raw evidence for the decision record.
//! All adapters implement the same [`SignalAdapter`] interface — one
//! operation, one result type — and are selected at construction time.
//!
//! Provider calls inside an adapter go through the retry executor, so an
//! adapter can degrade but never fail: the orchestrator always receives a
//! [`SignalOutcome`].

pub mod alternative;
pub mod finance;
pub mod price;
pub mod review;

pub use alternative::AlternativeAdapter;
pub use finance::FinanceAdapter;
pub use price::PriceAdapter;
pub use review::ReviewAdapter;

use crate::events::Event;
use crate::retry::BranchResult;
use async_trait::async_trait;
use sdk::errors::ErrorKind;
use sdk::types::UserProfile;

/// Normalized input to a signal adapter
///
/// The profile is only populated for Stage B adapters; it comes from the
/// Stage A profile fetch and is `None` when that branch degraded.
#[derive(Debug, Clone)]
pub struct SignalInput {
    pub event: Event,
    pub profile: Option<UserProfile>,
}

impl SignalInput {
    /// Stage A input: event only
    pub fn new(event: Event) -> Self {
        Self { event, profile: None }
    }

    /// Stage B input: event plus the profile fetched in Stage A
    pub fn with_profile(event: Event, profile: Option<UserProfile>) -> Self {
        Self { event, profile }
    }
}

/// Outcome of one signal adapter invocation
#[derive(Debug, Clone)]
pub struct SignalOutcome {
    /// The component score, or the degraded reason
    pub result: BranchResult<f64>,
    /// Raw provider payloads backing the score; `Null` when degraded
    pub evidence: serde_json::Value,
}

impl SignalOutcome {
    /// Successful outcome with a score and its evidence
    pub fn success(score: f64, attempts: u32, evidence: serde_json::Value) -> Self {
        Self {
            result: BranchResult::Success { value: score, attempts },
            evidence,
        }
    }

    /// Degraded outcome; no score, no evidence
    pub fn degraded(reason: ErrorKind, attempts: u32) -> Self {
        Self {
            result: BranchResult::Degraded { reason, attempts },
            evidence: serde_json::Value::Null,
        }
    }
}

/// Uniform interface over the concrete signal adapters
///
/// One operation, one result type. Implementations must be infallible at
/// the interface: provider failures surface as a degraded outcome, never
/// as an error.
#[async_trait]
pub trait SignalAdapter: Send + Sync {
    /// Branch name used in logs and `degraded_branches`
    fn name(&self) -> &'static str;

    /// Produce this adapter's component score for one event
    async fn evaluate(&self, input: &SignalInput) -> SignalOutcome;
}
