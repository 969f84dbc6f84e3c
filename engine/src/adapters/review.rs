//! Review sentiment adapter
//!
//! Fetches reviews and scores them with a small lexicon: each review starts
//! at 0.5, gains 0.1 per distinct positive term matched, loses 0.15 per
//! distinct negative term matched, and is clamped to [0, 1] before the
//! per-product average is taken. Zero reviews yield a neutral 0.5.

use super::{SignalAdapter, SignalInput, SignalOutcome};
use crate::fusion::{clamp01, round_to};
use crate::retry::{self, BranchResult, RetryPolicy};
use async_trait::async_trait;
use sdk::provider::ReviewProvider;
use sdk::types::Review;
use serde_json::json;
use std::sync::Arc;

const POSITIVE_TERMS: [&str; 6] = ["excellent", "great", "recommend", "comfortable", "good", "love"];
const NEGATIVE_TERMS: [&str; 6] = ["disappointed", "poor", "stopped", "bad", "terrible", "problem"];

/// Score a single review against the lexicon
fn review_score(review: &Review) -> f64 {
    let text = review.text.to_lowercase();
    let mut score = 0.5;
    for term in POSITIVE_TERMS {
        if text.contains(term) {
            score += 0.1;
        }
    }
    for term in NEGATIVE_TERMS {
        if text.contains(term) {
            score -= 0.15;
        }
    }
    clamp01(score)
}

/// Average lexicon score over a set of reviews; neutral when empty
fn sentiment_score(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.5;
    }
    let sum: f64 = reviews.iter().map(review_score).sum();
    round_to(sum / reviews.len() as f64, 3)
}

pub struct ReviewAdapter {
    provider: Arc<dyn ReviewProvider>,
    policy: RetryPolicy,
}

impl ReviewAdapter {
    pub fn new(provider: Arc<dyn ReviewProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }
}

#[async_trait]
impl SignalAdapter for ReviewAdapter {
    fn name(&self) -> &'static str {
        "review"
    }

    async fn evaluate(&self, input: &SignalInput) -> SignalOutcome {
        let product_id = input.event.product_id.clone();

        let reviews = match retry::execute("review.fetch", &self.policy, || {
            self.provider.reviews(&product_id)
        })
        .await
        {
            BranchResult::Success { value, attempts } => (value, attempts),
            BranchResult::Degraded { reason, attempts } => {
                return SignalOutcome::degraded(reason, attempts)
            }
        };
        let (reviews, attempts) = reviews;

        let sentiment = sentiment_score(&reviews);

        SignalOutcome::success(
            sentiment,
            attempts,
            json!({
                "reviews": reviews,
                "review_count": reviews.len(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::{fast_policy, review, test_event, StubReviews};

    #[test]
    fn test_neutral_review_scores_half() {
        let r = review("r1", "It arrived on time.");
        assert_eq!(review_score(&r), 0.5);
    }

    #[test]
    fn test_positive_terms_add_per_distinct_match() {
        // "great" and "recommend": 0.5 + 0.1 + 0.1
        let r = review("r1", "Great value, highly recommend.");
        assert!((review_score(&r) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_term_counts_once() {
        let r = review("r1", "great great great");
        assert!((review_score(&r) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_negative_terms_subtract() {
        // "stopped" and "disappointed": 0.5 - 0.15 - 0.15
        let r = review("r1", "Stopped working after a week, disappointed.");
        assert!((review_score(&r) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_per_review_clamp_before_average() {
        let r = review(
            "r1",
            "bad terrible poor problem disappointed stopped",
        );
        assert_eq!(review_score(&r), 0.0);
    }

    #[test]
    fn test_empty_reviews_are_neutral() {
        assert_eq!(sentiment_score(&[]), 0.5);
    }

    #[test]
    fn test_average_over_mixed_reviews() {
        let reviews = vec![
            review("r1", "excellent good"), // 0.7
            review("r2", "bad"),            // 0.35
        ];
        assert_eq!(sentiment_score(&reviews), 0.525);
    }

    #[tokio::test]
    async fn test_adapter_scores_fetched_reviews() {
        let provider = StubReviews {
            reviews: vec![review("r1", "Excellent sound, love it.")],
        };
        let adapter = ReviewAdapter::new(Arc::new(provider), fast_policy());

        let outcome = adapter
            .evaluate(&SignalInput::new(test_event(100.0)))
            .await;

        // 0.5 + 0.1 (excellent) + 0.1 (love)
        assert_eq!(outcome.result.into_value(), Some(0.7));
        assert_eq!(outcome.evidence["review_count"], 1);
    }

    #[tokio::test]
    async fn test_adapter_neutral_on_zero_reviews() {
        let provider = StubReviews { reviews: vec![] };
        let adapter = ReviewAdapter::new(Arc::new(provider), fast_policy());

        let outcome = adapter
            .evaluate(&SignalInput::new(test_event(100.0)))
            .await;

        assert_eq!(outcome.result.into_value(), Some(0.5));
    }
}
