// Buyflow Decision Engine
// Main entry point for the buyflow binary

use clap::Parser;
use buyflow_engine::cli::{Cli, Command};
use buyflow_engine::config::Config;
use buyflow_engine::handlers::{
    handle_decide, handle_doctor, handle_evaluate, handle_run, OutputFormat,
};
use buyflow_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided). Errors here
    // surface on stderr via the anyhow return; nothing is logged yet.
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_default()?
    };

    // The subscriber goes up only once the effective level is known, so
    // --log and core.log_level actually take effect. RUST_LOG still wins.
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Buyflow Engine v{} ({} - {})", version, commit, timestamp);

    // Handle commands
    match cli.command {
        Command::Run { events, stop_after } => {
            tracing::info!("Processing events from {}", events.display());
            handle_run(&events, stop_after, &config, format).await
        }

        Command::Decide {
            product_id,
            user_id,
            price,
        } => {
            tracing::info!("Deciding {} for {} at {}", product_id, user_id, price);
            handle_decide(product_id, user_id, price, &config, format).await
        }

        Command::Evaluate {
            count,
            seed,
            failure_rate,
            report,
        } => {
            tracing::info!("Evaluating {} synthetic events (seed {})", count, seed);
            handle_evaluate(count, seed, failure_rate, report.as_deref(), &config, format).await
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, format).await
        }
    }
}
