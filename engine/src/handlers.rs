//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - run: Process an event file through the pipeline
//! - decide: Evaluate a single ad-hoc event
//! - evaluate: Run a synthetic simulation and summarize the decisions
//! - doctor: Validate configuration and check engine health

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::evaluation::{self, EvaluationSummary};
use crate::events::{self, Event};
use crate::fusion::{Decision, Verdict};
use crate::metrics::{CsvMetricsSink, MetricsSink, NullMetricsSink};
use crate::pipeline::Orchestrator;
use crate::providers::SyntheticProviders;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Build an orchestrator over the given synthetic providers
fn build_orchestrator(
    config: Config,
    providers: Arc<SyntheticProviders>,
    metrics: Arc<dyn MetricsSink>,
) -> Orchestrator {
    Orchestrator::new(
        config,
        Arc::clone(&providers) as Arc<dyn sdk::provider::MarketDataProvider>,
        Arc::clone(&providers) as Arc<dyn sdk::provider::ReviewProvider>,
        providers as Arc<dyn sdk::provider::UserDataProvider>,
        metrics,
    )
}

/// Process an event file through the pipeline
///
/// Reads a JSON array of events, evaluates each one in order, and prints a
/// summary. Ctrl-C stops the loop at the next event boundary.
pub async fn handle_run(
    events_path: &Path,
    stop_after: Option<usize>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let events = events::load_events(events_path)
        .with_context(|| format!("Failed to load events from {}", events_path.display()))?;

    let metrics: Arc<dyn MetricsSink> = Arc::new(CsvMetricsSink::new(&config.core.metrics_path)?);
    let mut orchestrator = build_orchestrator(
        config.clone(),
        Arc::new(SyntheticProviders::new()),
        metrics,
    );

    let stop = orchestrator.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received; stopping after current event");
            stop.stop();
        }
    });

    let processed = orchestrator.run_loop(events, stop_after).await;

    let recent: Vec<(&Event, &Decision)> = orchestrator
        .session_memory()
        .iter()
        .map(|(e, d)| (e, d))
        .collect();
    let buys = recent
        .iter()
        .filter(|(_, d)| d.decision == Verdict::Buy)
        .count();

    match format {
        OutputFormat::Json => {
            let output = json!({
                "processed": processed,
                "recent_decisions": recent
                    .iter()
                    .map(|(e, d)| json!({"event_id": e.event_id, "decision": d}))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("Processed {} event(s).", processed);
            println!("Metrics written to {}", config.core.metrics_path.display());
            if !recent.is_empty() {
                println!(
                    "Recent window: {} decision(s), {} BUY",
                    recent.len(),
                    buys
                );
                for (event, decision) in &recent {
                    println!(
                        "  {}  {:<8} {:.4}  {}",
                        event.event_id,
                        decision.decision.to_string(),
                        decision.buy_score,
                        decision.recommended_action
                    );
                }
            }
        }
    }

    Ok(())
}

/// Evaluate a single ad-hoc event and print the decision
pub async fn handle_decide(
    product_id: String,
    user_id: String,
    price: f64,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let now = chrono::Utc::now();
    let event = Event {
        event_id: format!("evt_{}", now.timestamp_millis()),
        event_type: "price_drop".to_string(),
        product_id,
        user_id,
        price,
        timestamp: now.timestamp() as f64,
    };

    let mut orchestrator = build_orchestrator(
        config.clone(),
        Arc::new(SyntheticProviders::new()),
        Arc::new(NullMetricsSink),
    );
    let decision = orchestrator.process_event(event).await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        OutputFormat::Text => {
            println!("Decision:   {}", decision.decision);
            println!("Buy score:  {:.4}", decision.buy_score);
            println!("Action:     {}", decision.recommended_action);
            println!("Reasoning:  {}", decision.reasoning);
            println!("Components:");
            println!(
                "  affordability:        {:.3}",
                decision.component_scores.affordability
            );
            println!(
                "  price attractiveness: {:.3}",
                decision.component_scores.price_attractiveness
            );
            println!(
                "  sentiment:            {:.3}",
                decision.component_scores.sentiment
            );
            println!(
                "  availability:         {:.3}",
                decision.component_scores.availability
            );
            println!(
                "  preference:           {:.3}",
                decision.component_scores.preference
            );
            if decision.degraded_branches.is_empty() {
                println!("Degraded:   none");
            } else {
                let branches: Vec<&str> =
                    decision.degraded_branches.iter().map(|s| s.as_str()).collect();
                println!("Degraded:   {}", branches.join(", "));
            }
        }
    }

    Ok(())
}

/// Run a synthetic simulation and summarize the decisions
///
/// Generates `count` seeded events, drives them through the pipeline over
/// the synthetic providers (optionally with transient failure injection),
/// and prints aggregate statistics. Metrics rows are still emitted per
/// event, same as `run`.
pub async fn handle_evaluate(
    count: usize,
    seed: u64,
    failure_rate: f64,
    report: Option<&Path>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    if !(0.0..=1.0).contains(&failure_rate) {
        return Err(anyhow::anyhow!(
            "--failure-rate must be in [0, 1], got {}",
            failure_rate
        ));
    }

    let events = evaluation::generate_events(count, seed);

    // Offline batch run; no pacing between events
    let mut config = config.clone();
    config.core.poll_interval_ms = 0;

    let metrics: Arc<dyn MetricsSink> = Arc::new(CsvMetricsSink::new(&config.core.metrics_path)?);
    let providers = Arc::new(SyntheticProviders::with_failure_rate(failure_rate));
    let mut orchestrator = build_orchestrator(config, providers, metrics);

    let mut decisions = Vec::with_capacity(events.len());
    for event in events {
        decisions.push(orchestrator.process_event(event).await);
    }

    let summary = EvaluationSummary::from_decisions(&decisions);

    if let Some(path) = report {
        std::fs::write(path, summary.to_markdown())
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!("Wrote evaluation report to {}", path.display());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            println!(
                "Evaluation over {} synthetic event(s) (seed {}, failure rate {})",
                summary.total, seed, failure_rate
            );
            println!("  BUY:      {}", summary.buys);
            println!("  DEFER:    {}", summary.defers);
            println!("  NOT_BUY:  {}", summary.not_buys);
            println!("  Buy ratio:      {:.3}", summary.buy_ratio);
            println!("  Avg buy score:  {:.4}", summary.avg_buy_score);
            println!("  Degraded:       {} event(s)", summary.degraded_events);
            if let Some(path) = report {
                println!("Report written to {}", path.display());
            }
        }
    }

    Ok(())
}

/// Validate configuration and report engine health
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let config_ok = config.validate().is_ok();
    let config_error = config.validate().err().map(|e| e.to_string());

    let weight_sum = config.fusion.weights.affordability
        + config.fusion.weights.price
        + config.fusion.weights.sentiment
        + config.fusion.weights.availability
        + config.fusion.weights.preference;

    // Metrics path must be creatable or appendable
    let metrics_ok = CsvMetricsSink::new(&config.core.metrics_path).is_ok();

    // Smoke-test the provider stack end to end
    let providers = SyntheticProviders::instant();
    let providers_ok = {
        use sdk::provider::MarketDataProvider;
        providers.search_listings("prod_doctor").await.is_ok()
    };

    let healthy = config_ok && metrics_ok && providers_ok;

    match format {
        OutputFormat::Json => {
            let output = json!({
                "healthy": healthy,
                "config": {
                    "valid": config_ok,
                    "error": config_error,
                    "weight_sum": weight_sum,
                    "buy_threshold": config.fusion.buy_threshold,
                },
                "metrics": {
                    "path": config.core.metrics_path,
                    "writable": metrics_ok,
                },
                "providers": {
                    "synthetic": providers_ok,
                },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("Buyflow doctor");
            println!(
                "  Config:    {}",
                if config_ok {
                    "ok".to_string()
                } else {
                    format!("invalid ({})", config_error.unwrap_or_default())
                }
            );
            println!("  Weights:   sum = {:.4}", weight_sum);
            println!("  Threshold: {:.2}", config.fusion.buy_threshold);
            println!(
                "  Metrics:   {} ({})",
                config.core.metrics_path.display(),
                if metrics_ok { "writable" } else { "NOT writable" }
            );
            println!(
                "  Providers: synthetic {}",
                if providers_ok { "ok" } else { "failing" }
            );
            println!();
            if healthy {
                println!("All checks passed.");
            } else {
                println!("One or more checks failed.");
            }
        }
    }

    if healthy {
        Ok(())
    } else {
        Err(anyhow::anyhow!("doctor found problems"))
    }
}
