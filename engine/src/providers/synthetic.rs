//! Synthetic signal providers
//!
//! In-process providers generating plausible market data for demos and
//! tests. Generation is seeded from the requested id, so the same product
//! always yields the same listings, reviews, and forecast — runs are
//! reproducible without fixture files. A small simulated latency keeps the
//! pipeline's concurrency observable, and an optional failure rate
//! exercises the retry and degraded-branch paths.

use crate::fusion::round_to;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sdk::errors::ProviderError;
use sdk::provider::{MarketDataProvider, ProviderResult, ReviewProvider, UserDataProvider};
use sdk::types::{
    Cart, CartItem, Coupon, DropForecast, Listing, PricePoint, Review, StockCheck, StockLevel,
    UserProfile,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const SELLERS: [&str; 3] = ["RetailerA", "RetailerB", "RetailerC"];

const REVIEW_TEXTS: [&str; 5] = [
    "Excellent sound quality and battery life.",
    "Stopped working after a week, disappointed.",
    "Great value for price. Highly recommend.",
    "Mediocre build and poor customer support.",
    "Comfortable to wear, noise cancellation decent.",
];

/// Synthetic implementation of all three provider traits
pub struct SyntheticProviders {
    latency: Duration,
    failure_rate: f64,
    calls: AtomicU64,
}

impl SyntheticProviders {
    /// Fully reliable providers with a small simulated latency
    pub fn new() -> Self {
        Self {
            latency: Duration::from_millis(20),
            failure_rate: 0.0,
            calls: AtomicU64::new(0),
        }
    }

    /// Providers that transiently fail roughly `failure_rate` of calls
    pub fn with_failure_rate(failure_rate: f64) -> Self {
        Self {
            latency: Duration::from_millis(20),
            failure_rate: failure_rate.clamp(0.0, 1.0),
            calls: AtomicU64::new(0),
        }
    }

    /// No latency; used by tests
    pub fn instant() -> Self {
        Self {
            latency: Duration::ZERO,
            failure_rate: 0.0,
            calls: AtomicU64::new(0),
        }
    }

    fn seed_for(tag: &str, id: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        tag.hash(&mut hasher);
        id.hash(&mut hasher);
        hasher.finish()
    }

    fn rng_for(tag: &str, id: &str) -> StdRng {
        StdRng::seed_from_u64(Self::seed_for(tag, id))
    }

    /// Simulate latency and optionally inject a transient failure
    async fn call(&self, tag: &str) -> ProviderResult<()> {
        tokio::time::sleep(self.latency).await;
        if self.failure_rate > 0.0 {
            let n = self.calls.fetch_add(1, Ordering::Relaxed);
            let mut rng = StdRng::seed_from_u64(n.wrapping_mul(0x9E37_79B9_7F4A_7C15));
            if rng.gen_bool(self.failure_rate) {
                return Err(ProviderError::transient(format!(
                    "injected failure in '{}'",
                    tag
                )));
            }
        }
        Ok(())
    }
}

impl Default for SyntheticProviders {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticProviders {
    async fn search_listings(&self, product_id: &str) -> ProviderResult<Vec<Listing>> {
        self.call("search_listings").await?;
        let mut rng = Self::rng_for("listings", product_id);
        let base = 100.0 + rng.gen_range(-30.0..80.0);
        let listings = SELLERS
            .iter()
            .map(|seller| Listing {
                seller: seller.to_string(),
                price: round_to(base * rng.gen_range(0.9..1.2), 2),
                currency: "USD".to_string(),
                shipping: round_to(rng.gen_range(0.0..10.0), 2),
            })
            .collect();
        Ok(listings)
    }

    async fn price_history(&self, product_id: &str) -> ProviderResult<Vec<PricePoint>> {
        self.call("price_history").await?;
        let mut rng = Self::rng_for("history", product_id);
        let now = 1_700_000_000i64;
        let history = (0..30)
            .map(|i| PricePoint {
                ts: now - i * 86_400,
                price: round_to(100.0 + (i % 10) as f64 * 2.0 + rng.gen_range(-5.0..5.0), 2),
            })
            .collect();
        Ok(history)
    }

    async fn coupons(&self, product_id: &str) -> ProviderResult<Vec<Coupon>> {
        self.call("coupons").await?;
        let mut rng = Self::rng_for("coupons", product_id);
        let mut coupons = Vec::new();
        if rng.gen_bool(0.4) {
            coupons.push(Coupon {
                code: "SAVE10".to_string(),
                discount_pct: 10.0,
                expires_in_days: 7,
            });
        }
        if rng.gen_bool(0.15) {
            coupons.push(Coupon {
                code: "FREESHIP".to_string(),
                discount_pct: 0.0,
                expires_in_days: 2,
            });
        }
        Ok(coupons)
    }

    async fn forecast_drop(
        &self,
        product_id: &str,
        current_price: f64,
    ) -> ProviderResult<DropForecast> {
        self.call("forecast_drop").await?;
        let mut rng = Self::rng_for("forecast", product_id);
        // Rough bell shape around 0.3, clamped to [0.1, 0.9]
        let noise: f64 = (0..4).map(|_| rng.gen_range(-1.0..1.0)).sum::<f64>() / 4.0;
        let probability_drop = (0.3 + noise * 0.3).clamp(0.1, 0.9);
        Ok(DropForecast {
            probability_drop: round_to(probability_drop, 3),
            expected_drop: round_to(current_price * probability_drop * rng.gen_range(0.01..0.15), 2),
        })
    }

    async fn check_stock(&self, seller: &str, product_id: &str) -> ProviderResult<StockCheck> {
        self.call("check_stock").await?;
        let mut rng = Self::rng_for("stock", &format!("{}:{}", seller, product_id));
        let level = match rng.gen_range(0..3) {
            0 => StockLevel::InStock,
            1 => StockLevel::Limited,
            _ => StockLevel::OutOfStock,
        };
        let eta_days = match level {
            StockLevel::InStock => 0,
            StockLevel::Limited => rng.gen_range(2..6),
            StockLevel::OutOfStock => rng.gen_range(5..15),
        };
        Ok(StockCheck {
            seller: seller.to_string(),
            product_id: product_id.to_string(),
            level,
            eta_days,
        })
    }
}

#[async_trait]
impl ReviewProvider for SyntheticProviders {
    async fn reviews(&self, product_id: &str) -> ProviderResult<Vec<Review>> {
        self.call("reviews").await?;
        let mut rng = Self::rng_for("reviews", product_id);
        let reviews = (0..20)
            .map(|i| Review {
                review_id: format!("r_{}", i),
                rating: rng.gen_range(1..=5),
                text: REVIEW_TEXTS[rng.gen_range(0..REVIEW_TEXTS.len())].to_string(),
            })
            .collect();
        Ok(reviews)
    }
}

#[async_trait]
impl UserDataProvider for SyntheticProviders {
    async fn profile(&self, user_id: &str) -> ProviderResult<UserProfile> {
        self.call("profile").await?;
        let mut preferences = std::collections::HashMap::new();
        preferences.insert("brands".to_string(), serde_json::json!(["BrandA"]));
        preferences.insert(
            "avoid_categories".to_string(),
            serde_json::json!(["expensive_gadgets"]),
        );
        Ok(UserProfile {
            user_id: user_id.to_string(),
            monthly_budget: 800.0,
            current_balance: 250.0,
            loyalty_tier: "gold".to_string(),
            preferences,
        })
    }

    async fn cart(&self, user_id: &str) -> ProviderResult<Cart> {
        self.call("cart").await?;
        Ok(Cart {
            user_id: user_id.to_string(),
            items: vec![CartItem {
                product_id: "prod_1001".to_string(),
                name: "Wireless Headphones Model X".to_string(),
                price: 129.99,
                qty: 1,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listings_are_deterministic_per_product() {
        let providers = SyntheticProviders::instant();
        let first = providers.search_listings("prod_42").await.unwrap();
        let second = providers.search_listings("prod_42").await.unwrap();
        assert_eq!(first, second);

        let other = providers.search_listings("prod_43").await.unwrap();
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_listings_cover_all_sellers() {
        let providers = SyntheticProviders::instant();
        let listings = providers.search_listings("prod_1").await.unwrap();
        assert_eq!(listings.len(), 3);
        for listing in &listings {
            assert!(listing.price > 0.0);
        }
    }

    #[tokio::test]
    async fn test_forecast_probability_in_range() {
        let providers = SyntheticProviders::instant();
        for i in 0..50 {
            let forecast = providers
                .forecast_drop(&format!("prod_{}", i), 100.0)
                .await
                .unwrap();
            assert!((0.1..=0.9).contains(&forecast.probability_drop));
        }
    }

    #[tokio::test]
    async fn test_history_has_thirty_points() {
        let providers = SyntheticProviders::instant();
        let history = providers.price_history("prod_1").await.unwrap();
        assert_eq!(history.len(), 30);
    }

    #[tokio::test]
    async fn test_full_failure_rate_always_fails() {
        let providers = SyntheticProviders::with_failure_rate(1.0);
        let result = providers.search_listings("prod_1").await;
        assert!(matches!(result, Err(ProviderError::Transient(_))));
    }

    #[tokio::test]
    async fn test_profile_is_well_formed() {
        let providers = SyntheticProviders::instant();
        let profile = providers.profile("user_9").await.unwrap();
        assert_eq!(profile.user_id, "user_9");
        assert!(profile.monthly_budget > 0.0);
    }
}
