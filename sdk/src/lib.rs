//! Buyflow SDK
//!
//! Shared contract crate for the Buyflow decision engine. It defines the
//! provider traits the pipeline consumes, the typed payloads those providers
//! return, and the error taxonomy shared between the engine and provider
//! implementations. The crate is transport-agnostic: a provider may be an
//! in-process stub, an HTTP client, or anything else that can satisfy the
//! traits.

/// Error types and handling
pub mod errors;

/// Signal provider traits
pub mod provider;

/// Provider payload types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, ErrorKind, ProviderError, ProviderErrorExt};
pub use provider::{MarketDataProvider, ProviderResult, ReviewProvider, UserDataProvider};
pub use types::{
    Cart, CartItem, Coupon, DropForecast, Listing, PricePoint, Review, StockCheck, StockLevel,
    UserProfile,
};
