//! Configuration management
//!
//! Loads, validates, and defaults the Buyflow configuration. Configuration
//! is stored in TOML format at `~/.buyflow/config.toml` and is immutable
//! for the process lifetime. Validation happens once at startup; an invalid
//! configuration is fatal and no events are processed with it.
//!
//! # Configuration Sections
//!
//! - **core**: log level, metrics sink path, inter-event poll pause
//! - **fusion**: fusion weights, buy threshold, policy defaults for the
//!   preference score and the degraded-branch substitution score
//! - **memory**: session memory capacity
//! - **retry**: per-branch retry policies

use crate::fusion::{Weights, DEFER_FLOOR};
use crate::retry::RetryPolicy;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Fusion weights and thresholds
    #[serde(default)]
    pub fusion: FusionConfig,

    /// Session memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Per-branch retry policies
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path of the CSV metrics sink
    #[serde(default = "default_metrics_path")]
    pub metrics_path: PathBuf,

    /// Pause between events in the run loop, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Fusion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Component weights for the buy score
    #[serde(default)]
    pub weights: Weights,

    /// Scores at or above this threshold are BUY
    #[serde(default = "default_buy_threshold")]
    pub buy_threshold: f64,

    /// Preference component score. No adapter produces this signal yet, so
    /// it is supplied by policy.
    #[serde(default = "default_neutral_score")]
    pub preference_score: f64,

    /// Score substituted for a degraded branch
    #[serde(default = "default_neutral_score")]
    pub neutral_score: f64,
}

/// Session memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of (event, decision) pairs retained
    #[serde(default = "default_session_capacity")]
    pub session_capacity: usize,
}

/// Per-branch retry policies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub profile: RetryPolicy,
    #[serde(default)]
    pub cart: RetryPolicy,
    #[serde(default)]
    pub price: RetryPolicy,
    #[serde(default)]
    pub review: RetryPolicy,
    #[serde(default)]
    pub alternative: RetryPolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_path() -> PathBuf {
    PathBuf::from("metrics.csv")
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_buy_threshold() -> f64 {
    0.6
}

fn default_neutral_score() -> f64 {
    0.5
}

fn default_session_capacity() -> usize {
    10
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_path: default_metrics_path(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            buy_threshold: default_buy_threshold(),
            preference_score: default_neutral_score(),
            neutral_score: default_neutral_score(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            session_capacity: default_session_capacity(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (`~/.buyflow/config.toml`),
    /// falling back to defaults if the file does not exist.
    pub fn load_or_default() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Default configuration file path
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(".buyflow").join("config.toml"))
    }

    /// Validate the configuration. Called once at startup; failure is
    /// fatal to the process.
    pub fn validate(&self) -> Result<(), EngineError> {
        let w = &self.fusion.weights;
        for (name, value) in [
            ("affordability", w.affordability),
            ("price", w.price),
            ("sentiment", w.sentiment),
            ("availability", w.availability),
            ("preference", w.preference),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::Config(format!(
                    "fusion weight '{}' must be a non-negative finite number, got {}",
                    name, value
                )));
            }
        }

        if !(DEFER_FLOOR..=1.0).contains(&self.fusion.buy_threshold) {
            return Err(EngineError::Config(format!(
                "fusion.buy_threshold must be in [{}, 1.0], got {}",
                DEFER_FLOOR, self.fusion.buy_threshold
            )));
        }

        for (name, value) in [
            ("preference_score", self.fusion.preference_score),
            ("neutral_score", self.fusion.neutral_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Config(format!(
                    "fusion.{} must be in [0.0, 1.0], got {}",
                    name, value
                )));
            }
        }

        if self.memory.session_capacity == 0 {
            return Err(EngineError::Config(
                "memory.session_capacity must be at least 1".to_string(),
            ));
        }

        for (name, policy) in [
            ("profile", &self.retry.profile),
            ("cart", &self.retry.cart),
            ("price", &self.retry.price),
            ("review", &self.retry.review),
            ("alternative", &self.retry.alternative),
        ] {
            if policy.max_attempts == 0 {
                return Err(EngineError::Config(format!(
                    "retry.{}.max_attempts must be at least 1",
                    name
                )));
            }
            if policy.backoff_multiplier < 1.0 || !policy.backoff_multiplier.is_finite() {
                return Err(EngineError::Config(format!(
                    "retry.{}.backoff_multiplier must be >= 1.0",
                    name
                )));
            }
            if policy.timeout_per_attempt_ms == 0 {
                return Err(EngineError::Config(format!(
                    "retry.{}.timeout_per_attempt_ms must be positive",
                    name
                )));
            }
        }

        Ok(())
    }
}
