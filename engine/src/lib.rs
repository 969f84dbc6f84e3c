//! Buyflow Engine Library
//!
//! This library provides the core functionality of the Buyflow decision
//! engine. It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Synthetic evaluation harness module
pub mod evaluation;

/// Purchase-intent event loading module
pub mod events;

/// Retry and degradation policy module
pub mod retry;

/// Signal adapter branches (price, review, finance, alternative)
pub mod adapters;

/// Score fusion and decision module
pub mod fusion;

/// Bounded session memory module
pub mod memory;

/// Per-event metrics emission module
pub mod metrics;

/// Pipeline orchestration module
pub mod pipeline;

/// Built-in provider implementations
pub mod providers;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
