//! Signal provider traits
//!
//! These traits are the engine's only view of the outside world. The
//! pipeline imposes no transport assumptions: implementations may call HTTP
//! APIs, RPC services, or generate data in-process. Every method returns a
//! [`ProviderResult`] so failures stay typed as transient or fatal and can
//! be absorbed by the engine's retry executor.

use crate::errors::ProviderError;
use crate::types::{
    Cart, Coupon, DropForecast, Listing, PricePoint, Review, StockCheck, UserProfile,
};
use async_trait::async_trait;

/// Result type for provider calls
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Market data: listings, price history, coupons, drop forecasts, stock
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Search current listings for a product across sellers
    async fn search_listings(&self, product_id: &str) -> ProviderResult<Vec<Listing>>;

    /// Return the recent price time series for a product
    async fn price_history(&self, product_id: &str) -> ProviderResult<Vec<PricePoint>>;

    /// Return coupons applicable to a product
    async fn coupons(&self, product_id: &str) -> ProviderResult<Vec<Coupon>>;

    /// Estimate the probability of a near-term price drop
    async fn forecast_drop(
        &self,
        product_id: &str,
        current_price: f64,
    ) -> ProviderResult<DropForecast>;

    /// Check stock for a product at a specific seller
    async fn check_stock(&self, seller: &str, product_id: &str) -> ProviderResult<StockCheck>;
}

/// Customer reviews for a product
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    /// Fetch raw reviews for a product
    async fn reviews(&self, product_id: &str) -> ProviderResult<Vec<Review>>;
}

/// User-owned data: profile and cart
#[async_trait]
pub trait UserDataProvider: Send + Sync {
    /// Fetch a user's financial profile and preferences
    async fn profile(&self, user_id: &str) -> ProviderResult<UserProfile>;

    /// Fetch a user's current cart
    async fn cart(&self, user_id: &str) -> ProviderResult<Cart>;
}

// Blanket error helper so provider implementations can classify failures
// without repeating string plumbing.
impl ProviderError {
    /// Build a transient error from any displayable cause
    pub fn transient(cause: impl std::fmt::Display) -> Self {
        ProviderError::Transient(cause.to_string())
    }

    /// Build a fatal error from any displayable cause
    pub fn fatal(cause: impl std::fmt::Display) -> Self {
        ProviderError::Fatal(cause.to_string())
    }
}
