//! Pipeline orchestrator
//!
//! Sequences one event through two concurrency stages of signal branches,
//! fuses the resulting component scores into a decision, records it in
//! session memory, and emits metrics and a structured log record.
//!
//! Stage A runs the profile fetch, cart fetch, and price branch in
//! parallel; Stage B runs the review, finance, and alternative branches in
//! parallel. The stages are sequential because finance consumes Stage A's
//! profile. Fusion only starts once every branch has resolved to either
//! `Success` or `Degraded` — a degraded branch contributes the configured
//! neutral score instead of aborting the event.
//!
//! Events are processed strictly one at a time, which keeps session memory
//! single-writer. The stop flag is cooperative and checked only at event
//! boundaries: an in-flight event always runs to completion.

use crate::adapters::{
    AlternativeAdapter, FinanceAdapter, PriceAdapter, ReviewAdapter, SignalAdapter, SignalInput,
    SignalOutcome,
};
use crate::config::Config;
use crate::events::Event;
use crate::fusion::{self, ComponentScores, Decision};
use crate::memory::SessionMemory;
use crate::metrics::{MetricsRecord, MetricsSink};
use crate::retry::{self, BranchResult};
use sdk::provider::{MarketDataProvider, ReviewProvider, UserDataProvider};
use sdk::types::UserProfile;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Handle for requesting a cooperative stop from another task
#[derive(Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request that the orchestrator stop after the in-flight event
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// The four signal branches, injected at construction
pub struct PipelineAdapters {
    pub price: Arc<dyn SignalAdapter>,
    pub review: Arc<dyn SignalAdapter>,
    pub finance: Arc<dyn SignalAdapter>,
    pub alternative: Arc<dyn SignalAdapter>,
}

/// Orchestrates the per-event evaluation pipeline.
///
/// Explicitly constructed, owns its session memory and configuration by
/// composition; there is no ambient global state.
pub struct Orchestrator {
    config: Config,
    users: Arc<dyn UserDataProvider>,
    adapters: PipelineAdapters,
    metrics: Arc<dyn MetricsSink>,
    memory: SessionMemory,
    stop_flag: Arc<AtomicBool>,
    events_processed: u64,
}

impl Orchestrator {
    /// Build an orchestrator wired to the standard adapters over the given
    /// providers
    pub fn new(
        config: Config,
        market: Arc<dyn MarketDataProvider>,
        reviews: Arc<dyn ReviewProvider>,
        users: Arc<dyn UserDataProvider>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let adapters = PipelineAdapters {
            price: Arc::new(PriceAdapter::new(
                Arc::clone(&market),
                config.retry.price.clone(),
            )),
            review: Arc::new(ReviewAdapter::new(reviews, config.retry.review.clone())),
            finance: Arc::new(FinanceAdapter::new()),
            alternative: Arc::new(AlternativeAdapter::new(
                market,
                config.retry.alternative.clone(),
            )),
        };
        Self::from_parts(config, adapters, users, metrics)
    }

    /// Build an orchestrator from pre-constructed adapters
    pub fn from_parts(
        config: Config,
        adapters: PipelineAdapters,
        users: Arc<dyn UserDataProvider>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let memory = SessionMemory::new(config.memory.session_capacity);
        Self {
            config,
            users,
            adapters,
            metrics,
            memory,
            stop_flag: Arc::new(AtomicBool::new(false)),
            events_processed: 0,
        }
    }

    /// Handle used to request a stop from signal handlers or other tasks
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop_flag),
        }
    }

    /// Recent (event, decision) history
    pub fn session_memory(&self) -> &SessionMemory {
        &self.memory
    }

    /// Total events decided by this orchestrator
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Evaluate one event to a decision. Infallible for a well-formed
    /// event: branch failures degrade, they do not abort.
    pub async fn process_event(&mut self, event: Event) -> Decision {
        let started = Instant::now();
        let mut degraded: BTreeSet<String> = BTreeSet::new();
        let mut evidence: BTreeMap<String, serde_json::Value> = BTreeMap::new();

        // Stage A: profile, cart, and price signal in parallel
        let stage_a_input = SignalInput::new(event.clone());
        let user_id = event.user_id.clone();
        let (profile_result, cart_result, price_outcome) = tokio::join!(
            retry::execute("profile", &self.config.retry.profile, || {
                self.users.profile(&user_id)
            }),
            retry::execute("cart", &self.config.retry.cart, || {
                self.users.cart(&user_id)
            }),
            self.adapters.price.evaluate(&stage_a_input),
        );

        let profile: Option<UserProfile> = match profile_result {
            BranchResult::Success { value, attempts } => {
                debug!("Profile fetched in {} attempt(s)", attempts);
                Some(value)
            }
            BranchResult::Degraded { reason, attempts } => {
                warn!(
                    "Profile branch degraded ({}) after {} attempts; finance will use fallback",
                    reason, attempts
                );
                degraded.insert("profile".to_string());
                None
            }
        };

        match cart_result {
            BranchResult::Success { value, .. } => {
                evidence.insert(
                    "cart".to_string(),
                    serde_json::to_value(&value).unwrap_or(serde_json::Value::Null),
                );
            }
            BranchResult::Degraded { reason, attempts } => {
                warn!("Cart branch degraded ({}) after {} attempts", reason, attempts);
                degraded.insert("cart".to_string());
            }
        }

        // Stage B: review, finance (consumes Stage A's profile), alternative
        let stage_b_input = SignalInput::with_profile(event.clone(), profile);
        let (review_outcome, finance_outcome, alt_outcome) = tokio::join!(
            self.adapters.review.evaluate(&stage_b_input),
            self.adapters.finance.evaluate(&stage_b_input),
            self.adapters.alternative.evaluate(&stage_b_input),
        );

        let neutral = self.config.fusion.neutral_score;
        let scores = ComponentScores {
            affordability: self.resolve(
                "finance",
                "finance",
                finance_outcome,
                neutral,
                &mut degraded,
                &mut evidence,
            ),
            price_attractiveness: self.resolve(
                "price",
                "price",
                price_outcome,
                neutral,
                &mut degraded,
                &mut evidence,
            ),
            sentiment: self.resolve(
                "review",
                "reviews",
                review_outcome,
                neutral,
                &mut degraded,
                &mut evidence,
            ),
            availability: self.resolve(
                "alternative",
                "alt",
                alt_outcome,
                neutral,
                &mut degraded,
                &mut evidence,
            ),
            preference: self.config.fusion.preference_score,
        };

        let decision = fusion::fuse(
            scores,
            &self.config.fusion.weights,
            self.config.fusion.buy_threshold,
            evidence,
            degraded,
            chrono::Utc::now().to_rfc3339(),
        );

        self.memory.record(event.clone(), decision.clone());
        self.events_processed += 1;

        self.emit(&event, &decision, started.elapsed());

        decision
    }

    /// Map a branch outcome to its component score, recording evidence on
    /// success and the branch name on degradation
    fn resolve(
        &self,
        branch: &str,
        evidence_key: &str,
        outcome: SignalOutcome,
        neutral: f64,
        degraded: &mut BTreeSet<String>,
        evidence: &mut BTreeMap<String, serde_json::Value>,
    ) -> f64 {
        match outcome.result {
            BranchResult::Success { value, attempts } => {
                if attempts > 1 {
                    debug!("Branch '{}' succeeded after {} attempts", branch, attempts);
                }
                evidence.insert(evidence_key.to_string(), outcome.evidence);
                value
            }
            BranchResult::Degraded { reason, attempts } => {
                warn!(
                    "Branch '{}' degraded ({}) after {} attempts; substituting neutral {}",
                    branch, reason, attempts, neutral
                );
                degraded.insert(branch.to_string());
                neutral
            }
        }
    }

    /// Emit the per-event metrics record and structured log line
    fn emit(&self, event: &Event, decision: &Decision, elapsed: Duration) {
        let record = MetricsRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            loop_iteration_time: fusion::round_to(elapsed.as_secs_f64(), 3),
            events_processed: 1,
            buy_ratio: if decision.decision == fusion::Verdict::Buy {
                1.0
            } else {
                0.0
            },
            avg_buy_score: decision.buy_score,
        };
        if let Err(e) = self.metrics.record(&record) {
            warn!("Failed to record metrics: {}", e);
        }

        match serde_json::to_string(decision) {
            Ok(payload) => {
                info!(event_id = %event.event_id, decision = %payload, "event decided");
            }
            Err(e) => warn!("Failed to serialize decision for logging: {}", e),
        }
    }

    /// Drive a sequence of events through the pipeline, one at a time.
    ///
    /// Stops early when the stop flag is set (checked at event boundaries
    /// only) or after `stop_after` events. Returns the number of events
    /// processed in this call.
    pub async fn run_loop(&mut self, events: Vec<Event>, stop_after: Option<usize>) -> usize {
        let total = events.len();
        let mut processed = 0usize;

        for event in events {
            if self.stop_flag.load(Ordering::Relaxed) {
                info!("Stop requested; halting before next event");
                break;
            }

            self.process_event(event).await;
            processed += 1;

            if let Some(limit) = stop_after {
                if processed >= limit {
                    info!("Reached stop-after limit of {} events", limit);
                    break;
                }
            }

            if processed < total {
                tokio::time::sleep(Duration::from_millis(self.config.core.poll_interval_ms)).await;
            }
        }

        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::{listing, test_event, StubMarket, StubReviews};
    use crate::metrics::NullMetricsSink;
    use crate::retry::RetryPolicy;
    use async_trait::async_trait;
    use sdk::errors::{ErrorKind, ProviderError};
    use sdk::provider::ProviderResult;
    use sdk::types::{Cart, UserProfile};
    use std::sync::Mutex;

    /// User data stub with an optional failing profile fetch
    struct StubUsers {
        fail_profile: bool,
    }

    #[async_trait]
    impl UserDataProvider for StubUsers {
        async fn profile(&self, user_id: &str) -> ProviderResult<UserProfile> {
            if self.fail_profile {
                return Err(ProviderError::transient("profile service down"));
            }
            Ok(UserProfile {
                user_id: user_id.to_string(),
                monthly_budget: 800.0,
                current_balance: 500.0,
                loyalty_tier: "gold".to_string(),
                preferences: Default::default(),
            })
        }

        async fn cart(&self, user_id: &str) -> ProviderResult<Cart> {
            Ok(Cart {
                user_id: user_id.to_string(),
                items: vec![],
            })
        }
    }

    /// Metrics sink that retains every record for assertions
    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<MetricsRecord>>,
    }

    impl MetricsSink for RecordingSink {
        fn record(&self, record: &MetricsRecord) -> Result<(), sdk::errors::EngineError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    /// Signal adapter that always degrades
    struct DegradedAdapter {
        name: &'static str,
    }

    #[async_trait]
    impl SignalAdapter for DegradedAdapter {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn evaluate(&self, _input: &SignalInput) -> SignalOutcome {
            SignalOutcome::degraded(ErrorKind::Transient, 3)
        }
    }

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.core.poll_interval_ms = 0;
        let fast = RetryPolicy {
            max_attempts: 2,
            base_delay_ms: 1,
            backoff_multiplier: 1.0,
            max_delay_ms: 1,
            timeout_per_attempt_ms: 200,
        };
        config.retry.profile = fast.clone();
        config.retry.cart = fast.clone();
        config.retry.price = fast.clone();
        config.retry.review = fast.clone();
        config.retry.alternative = fast;
        config
    }

    fn positive_reviews() -> StubReviews {
        StubReviews {
            reviews: vec![
                crate::adapters::test_support::review("r1", "Excellent, love it."),
                crate::adapters::test_support::review("r2", "Great value, recommend."),
            ],
        }
    }

    fn standard_orchestrator(fail_profile: bool) -> Orchestrator {
        let market = Arc::new(StubMarket::with_listings(vec![
            listing("RetailerA", 100.0),
            listing("RetailerB", 120.0),
        ]));
        Orchestrator::new(
            fast_config(),
            market,
            Arc::new(positive_reviews()),
            Arc::new(StubUsers { fail_profile }),
            Arc::new(NullMetricsSink),
        )
    }

    #[tokio::test]
    async fn test_happy_path_produces_buy() {
        let mut orchestrator = standard_orchestrator(false);
        let decision = orchestrator.process_event(test_event(100.0)).await;

        // affordability 0.95, price 0.5, sentiment 0.7, availability 1.0,
        // preference 0.5 under default weights
        assert_eq!(decision.component_scores.affordability, 0.95);
        assert_eq!(decision.component_scores.price_attractiveness, 0.5);
        assert_eq!(decision.component_scores.sentiment, 0.7);
        assert_eq!(decision.component_scores.availability, 1.0);
        assert_eq!(decision.component_scores.preference, 0.5);
        assert_eq!(decision.buy_score, 0.7275);
        assert_eq!(decision.decision, fusion::Verdict::Buy);
        assert!(decision.degraded_branches.is_empty());
        assert!(decision.evidence.contains_key("price"));
        assert!(decision.evidence.contains_key("reviews"));
        assert!(decision.evidence.contains_key("cart"));
    }

    #[tokio::test]
    async fn test_degraded_price_branch_still_decides() {
        let market = Arc::new(StubMarket::with_listings(vec![listing("RetailerA", 100.0)]));
        let config = fast_config();
        let adapters = PipelineAdapters {
            price: Arc::new(DegradedAdapter { name: "price" }),
            review: Arc::new(crate::adapters::ReviewAdapter::new(
                Arc::new(positive_reviews()),
                config.retry.review.clone(),
            )),
            finance: Arc::new(crate::adapters::FinanceAdapter::new()),
            alternative: Arc::new(crate::adapters::AlternativeAdapter::new(
                market,
                config.retry.alternative.clone(),
            )),
        };
        let mut orchestrator = Orchestrator::from_parts(
            config,
            adapters,
            Arc::new(StubUsers { fail_profile: false }),
            Arc::new(NullMetricsSink),
        );

        let decision = orchestrator.process_event(test_event(100.0)).await;

        // Neutral substitution for price only; all other scores are real
        assert_eq!(decision.component_scores.price_attractiveness, 0.5);
        assert_eq!(
            decision.degraded_branches,
            ["price".to_string()].into_iter().collect()
        );
        assert_eq!(decision.component_scores.affordability, 0.95);
        assert_eq!(decision.component_scores.availability, 1.0);
        assert!(!decision.evidence.contains_key("price"));
    }

    #[tokio::test]
    async fn test_degraded_profile_feeds_finance_fallback() {
        let mut orchestrator = standard_orchestrator(true);
        let decision = orchestrator.process_event(test_event(100.0)).await;

        // Fallback empty profile bottoms out the affordability rules
        assert_eq!(decision.component_scores.affordability, 0.05);
        assert!(decision.degraded_branches.contains("profile"));
        // Finance itself still succeeded
        assert!(!decision.degraded_branches.contains("finance"));
    }

    #[tokio::test]
    async fn test_session_memory_records_each_event() {
        let mut orchestrator = standard_orchestrator(false);
        for i in 0..3 {
            let mut event = test_event(100.0);
            event.event_id = format!("evt_{}", i);
            orchestrator.process_event(event).await;
        }

        assert_eq!(orchestrator.session_memory().len(), 3);
        assert_eq!(
            orchestrator.session_memory().last().unwrap().0.event_id,
            "evt_2"
        );
    }

    #[tokio::test]
    async fn test_session_memory_honors_capacity() {
        let market = Arc::new(StubMarket::with_listings(vec![listing("RetailerA", 100.0)]));
        let mut config = fast_config();
        config.memory.session_capacity = 2;
        let mut orchestrator = Orchestrator::new(
            config,
            market,
            Arc::new(positive_reviews()),
            Arc::new(StubUsers { fail_profile: false }),
            Arc::new(NullMetricsSink),
        );

        for i in 0..5 {
            let mut event = test_event(100.0);
            event.event_id = format!("evt_{}", i);
            orchestrator.process_event(event).await;
        }

        assert_eq!(orchestrator.session_memory().len(), 2);
        assert_eq!(
            orchestrator
                .session_memory()
                .iter()
                .next()
                .unwrap()
                .0
                .event_id,
            "evt_3"
        );
    }

    #[tokio::test]
    async fn test_metrics_one_record_per_event() {
        let market = Arc::new(StubMarket::with_listings(vec![listing("RetailerA", 100.0)]));
        let sink = Arc::new(RecordingSink::default());
        let mut orchestrator = Orchestrator::new(
            fast_config(),
            market,
            Arc::new(positive_reviews()),
            Arc::new(StubUsers { fail_profile: false }),
            Arc::clone(&sink) as Arc<dyn MetricsSink>,
        );

        let events = vec![test_event(100.0), test_event(100.0)];
        let processed = orchestrator.run_loop(events, None).await;

        assert_eq!(processed, 2);
        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].events_processed, 1);
        assert_eq!(records[0].buy_ratio, 1.0);
    }

    #[tokio::test]
    async fn test_stop_flag_halts_before_next_event() {
        let mut orchestrator = standard_orchestrator(false);
        orchestrator.stop_handle().stop();

        let processed = orchestrator.run_loop(vec![test_event(100.0)], None).await;
        assert_eq!(processed, 0);
        assert!(orchestrator.session_memory().is_empty());
    }

    #[tokio::test]
    async fn test_stop_after_limit() {
        let mut orchestrator = standard_orchestrator(false);
        let events = (0..5).map(|_| test_event(100.0)).collect();

        let processed = orchestrator.run_loop(events, Some(2)).await;
        assert_eq!(processed, 2);
        assert_eq!(orchestrator.events_processed(), 2);
    }
}
