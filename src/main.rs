use anyhow::Context;
use correlate::{Correlator, CorrelateConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(version = correlate::version(), "Correlate starting");

    let config = CorrelateConfig::from_env().context("Failed to load configuration")?;
    let period = Duration::from_secs(config.ingest.update_every_secs.max(1));
    let correlator = Arc::new(
        Correlator::from_config(config).context("Failed to build facet search client")?,
    );

    let daemon = {
        let correlator = correlator.clone();
        tokio::spawn(async move { run(correlator, period).await })
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested");
    correlator.shutdown();
    daemon.abort();

    let summary = correlator.summary().await;
    info!(
        entities = summary.entity_count,
        edges = summary.edge_count,
        islands = summary.island_count,
        "Correlate stopped"
    );
    Ok(())
}

/// Pre-warm, then catch up every `period` until aborted
async fn run(correlator: Arc<Correlator>, period: Duration) {
    match correlator.prewarm().await {
        Ok(summaries) if !summaries.is_empty() => {
            info!(cycles = summaries.len(), "Pre-warmed history")
        }
        Ok(_) => {}
        Err(e) => error!(error = %e, "Pre-warm failed, continuing with periodic ingestion"),
    }

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = correlator.ingest_latest().await {
            error!(error = %e, "Ingestion cycle failed, retrying next tick");
        }
    }
}
