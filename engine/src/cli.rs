//! CLI interface for Buyflow
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for driving the decision engine.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Buyflow Decision Engine
///
/// Evaluates purchase-intent events against market, review, and user data
/// and emits BUY / DEFER / NOT_BUY decisions with supporting evidence.
#[derive(Parser, Debug)]
#[command(name = "buyflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process an event file through the pipeline
    Run {
        /// Path to a JSON array of purchase-intent events
        events: PathBuf,

        /// Stop after this many events
        #[arg(long, value_name = "N")]
        stop_after: Option<usize>,
    },

    /// Decide a single ad-hoc event and print the decision
    Decide {
        /// Product to evaluate
        product_id: String,

        /// User the evaluation runs for
        user_id: String,

        /// Observed price that triggered the evaluation
        price: f64,
    },

    /// Run a synthetic simulation and print aggregate statistics
    Evaluate {
        /// Number of synthetic events to generate
        #[arg(long, default_value = "200", value_name = "N")]
        count: usize,

        /// RNG seed for event generation
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Fraction of provider calls that transiently fail, in [0, 1]
        #[arg(long, default_value = "0.0", value_name = "RATE")]
        failure_rate: f64,

        /// Also write the summary as a markdown report to this path
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// Validate configuration and report engine health
    Doctor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["buyflow", "doctor"]);
        assert!(matches!(cli.command, Command::Doctor));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["buyflow", "--json", "--log", "debug", "doctor"]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["buyflow", "run", "events.json", "--stop-after", "5"]);
        if let Command::Run { events, stop_after } = cli.command {
            assert_eq!(events, PathBuf::from("events.json"));
            assert_eq!(stop_after, Some(5));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_decide_command() {
        let cli = Cli::parse_from(["buyflow", "decide", "prod_1001", "user_42", "129.99"]);
        if let Command::Decide {
            product_id,
            user_id,
            price,
        } = cli.command
        {
            assert_eq!(product_id, "prod_1001");
            assert_eq!(user_id, "user_42");
            assert_eq!(price, 129.99);
        } else {
            panic!("Expected Decide command");
        }
    }

    #[test]
    fn test_evaluate_defaults() {
        let cli = Cli::parse_from(["buyflow", "evaluate"]);
        if let Command::Evaluate {
            count,
            seed,
            failure_rate,
            report,
        } = cli.command
        {
            assert_eq!(count, 200);
            assert_eq!(seed, 42);
            assert_eq!(failure_rate, 0.0);
            assert!(report.is_none());
        } else {
            panic!("Expected Evaluate command");
        }
    }

    #[test]
    fn test_evaluate_flags() {
        let cli = Cli::parse_from([
            "buyflow",
            "evaluate",
            "--count",
            "50",
            "--seed",
            "7",
            "--failure-rate",
            "0.25",
            "--report",
            "eval_report.md",
        ]);
        if let Command::Evaluate {
            count,
            seed,
            failure_rate,
            report,
        } = cli.command
        {
            assert_eq!(count, 50);
            assert_eq!(seed, 7);
            assert_eq!(failure_rate, 0.25);
            assert_eq!(report, Some(PathBuf::from("eval_report.md")));
        } else {
            panic!("Expected Evaluate command");
        }
    }

    #[test]
    fn test_config_flag() {
        let cli = Cli::parse_from(["buyflow", "--config", "/tmp/custom.toml", "doctor"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/custom.toml")));
    }
}
