//! Affordability adapter
//!
//! Deterministic step function over the user's balance and monthly budget,
//! evaluated against the raw event price. Ordered rules, first match wins:
//!
//! 1. `price <= balance*0.5 && price <= budget*0.3` -> 0.95
//! 2. `price <= balance && price <= budget*0.6`     -> 0.70
//! 3. `price <= balance*1.2`                        -> 0.40
//! 4. otherwise                                     -> 0.05
//!
//! This adapter performs no provider call of its own: the profile is fetched
//! in Stage A and handed over through the signal input. A missing profile
//! (degraded Stage A fetch) falls back to an empty profile, which rule 4
//! scores at 0.05.

use super::{SignalAdapter, SignalInput, SignalOutcome};
use async_trait::async_trait;
use sdk::types::UserProfile;
use serde_json::json;

/// Ordered affordability rules; first match wins
pub fn affordability_score(profile: &UserProfile, price: f64) -> f64 {
    let balance = profile.current_balance;
    let budget = profile.monthly_budget;

    if price <= balance * 0.5 && price <= budget * 0.3 {
        0.95
    } else if price <= balance && price <= budget * 0.6 {
        0.70
    } else if price <= balance * 1.2 {
        0.40
    } else {
        0.05
    }
}

#[derive(Default)]
pub struct FinanceAdapter;

impl FinanceAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignalAdapter for FinanceAdapter {
    fn name(&self) -> &'static str {
        "finance"
    }

    async fn evaluate(&self, input: &SignalInput) -> SignalOutcome {
        let fallback;
        let profile = match &input.profile {
            Some(profile) => profile,
            None => {
                fallback = UserProfile::empty(&input.event.user_id);
                &fallback
            }
        };

        let price = input.event.price;
        let score = affordability_score(profile, price);

        let reasoning = format!(
            "affordability: balance={} monthly_budget={} price={} -> score={}",
            profile.current_balance, profile.monthly_budget, price, score
        );

        SignalOutcome::success(
            score,
            1,
            json!({
                "reasoning": reasoning,
                "profile": profile,
                "profile_fallback": input.profile.is_none(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::test_event;

    fn profile(balance: f64, budget: f64) -> UserProfile {
        UserProfile {
            user_id: "user_001".to_string(),
            monthly_budget: budget,
            current_balance: balance,
            loyalty_tier: "gold".to_string(),
            preferences: Default::default(),
        }
    }

    #[test]
    fn test_rule_one_comfortable_purchase() {
        // 100 <= 250 and 100 <= 240
        assert_eq!(affordability_score(&profile(500.0, 800.0), 100.0), 0.95);
    }

    #[test]
    fn test_rule_two_within_balance_and_budget() {
        // Fails rule 1 (130 > 125), passes rule 2 (130 <= 250, 130 <= 480)
        assert_eq!(affordability_score(&profile(250.0, 800.0), 130.0), 0.70);
    }

    #[test]
    fn test_rule_three_stretch_purchase() {
        // Fails rules 1-2 (280 > 250), passes rule 3 (280 <= 300)
        assert_eq!(affordability_score(&profile(250.0, 800.0), 280.0), 0.40);
    }

    #[test]
    fn test_rule_four_unaffordable() {
        assert_eq!(affordability_score(&profile(250.0, 800.0), 400.0), 0.05);
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        // A free item satisfies every rule; rule 1 applies
        assert_eq!(affordability_score(&profile(100.0, 100.0), 0.0), 0.95);
    }

    #[test]
    fn test_empty_profile_bottoms_out() {
        // Zero balance and budget: rules 1-3 all fail for any positive price
        assert_eq!(affordability_score(&UserProfile::empty("u"), 1.0), 0.05);
    }

    #[tokio::test]
    async fn test_adapter_uses_supplied_profile() {
        let adapter = FinanceAdapter::new();
        let input = SignalInput::with_profile(test_event(100.0), Some(profile(500.0, 800.0)));

        let outcome = adapter.evaluate(&input).await;
        assert_eq!(outcome.result.into_value(), Some(0.95));
        assert_eq!(outcome.evidence["profile_fallback"], false);
    }

    #[tokio::test]
    async fn test_adapter_falls_back_without_profile() {
        let adapter = FinanceAdapter::new();
        let input = SignalInput::new(test_event(100.0));

        let outcome = adapter.evaluate(&input).await;
        assert_eq!(outcome.result.into_value(), Some(0.05));
        assert_eq!(outcome.evidence["profile_fallback"], true);
    }
}
