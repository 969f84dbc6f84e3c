//! Fusion engine
//!
//! Pure, deterministic combination of component scores into a buy score and
//! a final verdict. No I/O, no clock, no randomness: identical inputs always
//! produce the identical decision. The orchestrator supplies everything this
//! module needs, including the decision timestamp.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Lower bound of the DEFER band. Scores below this are NOT_BUY.
pub const DEFER_FLOOR: f64 = 0.4;

/// The five normalized component scores feeding fusion, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub affordability: f64,
    pub price_attractiveness: f64,
    pub sentiment: f64,
    pub availability: f64,
    pub preference: f64,
}

/// Non-negative fusion weights, externally configured.
///
/// A plain weighted sum is used, not a convex combination: no sum-to-one
/// invariant is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default = "default_w_affordability")]
    pub affordability: f64,
    #[serde(default = "default_w_price")]
    pub price: f64,
    #[serde(default = "default_w_sentiment")]
    pub sentiment: f64,
    #[serde(default = "default_w_availability")]
    pub availability: f64,
    #[serde(default = "default_w_preference")]
    pub preference: f64,
}

fn default_w_affordability() -> f64 {
    0.25
}

fn default_w_price() -> f64 {
    0.25
}

fn default_w_sentiment() -> f64 {
    0.2
}

fn default_w_availability() -> f64 {
    0.15
}

fn default_w_preference() -> f64 {
    0.15
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            affordability: default_w_affordability(),
            price: default_w_price(),
            sentiment: default_w_sentiment(),
            availability: default_w_availability(),
            preference: default_w_preference(),
        }
    }
}

/// Final verdict on a purchase-intent event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Buy,
    Defer,
    NotBuy,
}

impl Verdict {
    /// Action recommended to downstream consumers for this verdict
    pub fn recommended_action(self) -> &'static str {
        match self {
            Verdict::Buy => "add_to_cart",
            Verdict::Defer => "wait_for_deal",
            Verdict::NotBuy => "choose_alternative",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Buy => write!(f, "BUY"),
            Verdict::Defer => write!(f, "DEFER"),
            Verdict::NotBuy => write!(f, "NOT_BUY"),
        }
    }
}

/// The decision record emitted for every processed event. Immutable once
/// produced; exactly one per event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub decision: Verdict,
    pub buy_score: f64,
    pub component_scores: ComponentScores,
    pub recommended_action: String,
    pub reasoning: String,
    /// Raw adapter payloads, passed through unchanged
    pub evidence: BTreeMap<String, serde_json::Value>,
    /// Names of branches whose scores were substituted with the neutral
    /// default, so consumers can discount confidence
    pub degraded_branches: BTreeSet<String>,
    /// RFC 3339, supplied by the orchestrator
    pub timestamp: String,
}

/// Clamp a value into [0, 1]
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Round to `digits` decimal places
pub fn round_to(x: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (x * factor).round() / factor
}

/// Weighted sum of the component scores, rounded to 4 decimal places
pub fn compute_buy_score(scores: &ComponentScores, weights: &Weights) -> f64 {
    let raw = scores.affordability * weights.affordability
        + scores.price_attractiveness * weights.price
        + scores.sentiment * weights.sentiment
        + scores.availability * weights.availability
        + scores.preference * weights.preference;
    round_to(raw, 4)
}

/// Map a buy score to a verdict. Boundaries are inclusive on the lower bound.
pub fn verdict_for(buy_score: f64, buy_threshold: f64) -> Verdict {
    if buy_score >= buy_threshold {
        Verdict::Buy
    } else if buy_score >= DEFER_FLOOR {
        Verdict::Defer
    } else {
        Verdict::NotBuy
    }
}

/// Fuse component scores into a decision record.
pub fn fuse(
    scores: ComponentScores,
    weights: &Weights,
    buy_threshold: f64,
    evidence: BTreeMap<String, serde_json::Value>,
    degraded_branches: BTreeSet<String>,
    timestamp: String,
) -> Decision {
    let buy_score = compute_buy_score(&scores, weights);
    let verdict = verdict_for(buy_score, buy_threshold);

    let reasoning = format!(
        "weighted fusion: affordability={:.4} price={:.4} sentiment={:.4} \
         availability={:.4} preference={:.4} -> buy_score={} ({})",
        scores.affordability,
        scores.price_attractiveness,
        scores.sentiment,
        scores.availability,
        scores.preference,
        buy_score,
        verdict
    );

    Decision {
        decision: verdict,
        buy_score,
        component_scores: scores,
        recommended_action: verdict.recommended_action().to_string(),
        reasoning,
        evidence,
        degraded_branches,
        timestamp,
    }
}
