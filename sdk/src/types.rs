//! Provider payload types
//!
//! Typed payloads returned by signal providers. These are the wire-level
//! shapes the adapters normalize into component scores; they also pass
//! through unchanged into the decision's evidence map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single retail listing for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub seller: String,
    pub price: f64,
    pub currency: String,
    pub shipping: f64,
}

/// One point of a product's price history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix timestamp (seconds)
    pub ts: i64,
    pub price: f64,
}

/// A coupon applicable to a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub discount_pct: f64,
    pub expires_in_days: u32,
}

/// Result of a near-term price-drop simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropForecast {
    /// Probability of a price drop in the near term, in [0, 1]
    pub probability_drop: f64,
    /// Expected absolute drop amount if it happens
    pub expected_drop: f64,
}

/// A customer review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: String,
    pub rating: u8,
    pub text: String,
}

/// Stock availability at a seller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    InStock,
    Limited,
    OutOfStock,
}

impl StockLevel {
    /// Availability contribution of this stock level, in [0, 1]
    pub fn availability_score(self) -> f64 {
        match self {
            StockLevel::InStock => 1.0,
            StockLevel::Limited => 0.6,
            StockLevel::OutOfStock => 0.0,
        }
    }
}

/// Result of a stock check for one (seller, product) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockCheck {
    pub seller: String,
    pub product_id: String,
    pub level: StockLevel,
    /// Estimated days until delivery
    pub eta_days: u32,
}

/// A user's financial profile and preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub monthly_budget: f64,
    pub current_balance: f64,
    pub loyalty_tier: String,
    #[serde(default)]
    pub preferences: HashMap<String, serde_json::Value>,
}

impl UserProfile {
    /// Fallback profile used when the profile fetch degrades.
    ///
    /// Zero balance and zero budget, so the affordability rules bottom out
    /// at the lowest score instead of guessing.
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            monthly_budget: 0.0,
            current_balance: 0.0,
            loyalty_tier: "none".to_string(),
            preferences: HashMap::new(),
        }
    }
}

/// One item in a user's cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub qty: u32,
}

/// A user's current cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: String,
    pub items: Vec<CartItem>,
}
