//! Alternative and availability adapter
//!
//! Fetches listings, checks stock for up to the three cheapest, and scores
//! availability as the mean of {in_stock: 1.0, limited: 0.6, out_of_stock:
//! 0.0}. Also proposes a single alternative listing: the second-cheapest,
//! the cheapest when only one exists, or none.

use super::{SignalAdapter, SignalInput, SignalOutcome};
use crate::fusion::round_to;
use crate::retry::{self, BranchResult, RetryPolicy};
use async_trait::async_trait;
use sdk::provider::MarketDataProvider;
use sdk::types::{Listing, StockCheck};
use serde_json::json;
use std::sync::Arc;

/// Number of cheapest listings considered for stock checks
const STOCK_CHECK_LIMIT: usize = 3;

/// Pick the proposed alternative from price-sorted listings
fn pick_alternative(sorted: &[Listing]) -> Option<&Listing> {
    sorted.get(1).or_else(|| sorted.first())
}

/// Mean availability over the stock checks; 0.0 when none were possible
fn availability_score(checks: &[StockCheck]) -> f64 {
    if checks.is_empty() {
        return 0.0;
    }
    let sum: f64 = checks.iter().map(|c| c.level.availability_score()).sum();
    round_to(sum / checks.len() as f64, 3)
}

pub struct AlternativeAdapter {
    market: Arc<dyn MarketDataProvider>,
    policy: RetryPolicy,
}

impl AlternativeAdapter {
    pub fn new(market: Arc<dyn MarketDataProvider>, policy: RetryPolicy) -> Self {
        Self { market, policy }
    }
}

#[async_trait]
impl SignalAdapter for AlternativeAdapter {
    fn name(&self) -> &'static str {
        "alternative"
    }

    async fn evaluate(&self, input: &SignalInput) -> SignalOutcome {
        let product_id = input.event.product_id.clone();
        let mut attempts = 0u32;

        let mut listings = match retry::execute("alternative.listings", &self.policy, || {
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

        listings.sort_by(|a, b| a.price.total_cmp(&b.price));
        let alternative = pick_alternative(&listings).cloned();

        let mut stock_checks = Vec::new();
        for listing in listings.iter().take(STOCK_CHECK_LIMIT) {
            let seller = listing.seller.clone();
            let check = match retry::execute("alternative.stock", &self.policy, || {
                self.market.check_stock(&seller, &product_id)
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
            stock_checks.push(check);
        }

        let availability = availability_score(&stock_checks);

        let evidence = json!({
            "alternative": alternative,
            "stock_checks": stock_checks,
            "listings": listings,
        });

        SignalOutcome::success(availability, attempts, evidence)
    }
}
