//! Price attractiveness adapter
//!
//! Combines current listings, price history, coupons, and a simulated
//! near-term drop forecast into one attractiveness score:
//! `clamp01((1 - price/(price+100)) + best_coupon_pct/100 + probability_drop)`
//! where `price` is the lowest observed listing price.

use super::{SignalAdapter, SignalInput, SignalOutcome};
use crate::fusion::{clamp01, round_to};
use crate::retry::{self, BranchResult, RetryPolicy};
use async_trait::async_trait;
use sdk::provider::MarketDataProvider;
use serde_json::json;
use std::sync::Arc;

pub struct PriceAdapter {
    market: Arc<dyn MarketDataProvider>,
    policy: RetryPolicy,
}

impl PriceAdapter {
    pub fn new(market: Arc<dyn MarketDataProvider>, policy: RetryPolicy) -> Self {
        Self { market, policy }
    }
}

#[async_trait]
impl SignalAdapter for PriceAdapter {
    fn name(&self) -> &'static str {
        "price"
    }

    async fn evaluate(&self, input: &SignalInput) -> SignalOutcome {
        let product_id = input.event.product_id.clone();
        let mut attempts = 0u32;

        let listings = match retry::execute("price.listings", &self.policy, || {
            self.market.search_listings(&product_id)
        })
        .await
        {
            BranchResult::Success { value, attempts: a } => {
                attempts = attempts.max(a);
                value
            }
            BranchResult::Degraded { reason, attempts: a } => {
                return SignalOutcome::degraded(reason, a)
            }
        };

        let history = match retry::execute("price.history", &self.policy, || {
            self.market.price_history(&product_id)
        })
        .await
        {
            BranchResult::Success { value, attempts: a } => {
                attempts = attempts.max(a);
                value
            }
            BranchResult::Degraded { reason, attempts: a } => {
                return SignalOutcome::degraded(reason, a)
            }
        };

        let coupons = match retry::execute("price.coupons", &self.policy, || {
            self.market.coupons(&product_id)
        })
        .await
        {
            BranchResult::Success { value, attempts: a } => {
                attempts = attempts.max(a);
                value
            }
            BranchResult::Degraded { reason, attempts: a } => {
                return SignalOutcome::degraded(reason, a)
            }
        };

        // Lowest observed listing price; 0.0 when no listings exist.
        let current_price = listings
            .iter()
            .map(|l| l.price)
            .fold(f64::INFINITY, f64::min);
        let current_price = if current_price.is_finite() {
            current_price
        } else {
            0.0
        };

        let forecast = match retry::execute("price.forecast", &self.policy, || {
            self.market.forecast_drop(&product_id, current_price)
        })
        .await
        {
            BranchResult::Success { value, attempts: a } => {
                attempts = attempts.max(a);
                value
            }
            BranchResult::Degraded { reason, attempts: a } => {
                return SignalOutcome::degraded(reason, a)
            }
        };

        let best_coupon_pct = coupons
            .iter()
            .map(|c| c.discount_pct)
            .fold(0.0f64, f64::max);

        let attractiveness = clamp01(
            (1.0 - current_price / (current_price + 100.0))
                + best_coupon_pct / 100.0
                + forecast.probability_drop,
        );
        let attractiveness = round_to(attractiveness, 3);

        let evidence = json!({
            "listings": listings,
            "history": history,
            "coupons": coupons,
            "forecast": forecast,
            "current_price": current_price,
        });

        SignalOutcome::success(attractiveness, attempts, evidence)
    }
}
