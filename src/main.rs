//! ereb-collector Binary Entry Point
//!
//! Polls ereb schedulers and writes metrics to stdout. Logs go to stderr.
//! Core functionality is provided by the `ereb_collector` library crate.

use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ereb_collector::{
    collector::{Collector, CollectorRegistry, ErebCollector, run_collection},
    config::{AppConfig, parse_duration},
    sink::{OutputFormat, SinkBuilder, SinkHandles},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ereb-collector - metrics for ereb job schedulers
#[derive(Parser, Debug)]
#[command(name = "ereb-collector", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, env = "EREB_COLLECTOR_CONFIG")]
    config: Option<PathBuf>,

    /// ereb server base URL; repeatable, replaces configured servers
    #[arg(short, long = "server", env = "EREB_COLLECTOR_SERVERS", value_delimiter = ',')]
    servers: Vec<String>,

    /// Collection interval, e.g. `10s` (overrides config file)
    #[arg(short, long, value_parser = parse_duration)]
    interval: Option<Duration>,

    /// Metric output format: line or json (overrides config file)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Per-unit diagnostics and debug logging
    #[arg(short, long, env = "EREB_COLLECTOR_VERBOSE")]
    verbose: bool,

    /// Run a single collection cycle, flush and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,ereb_collector=debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration (CLI > ENV > config file > defaults)
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration");
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };

    if !cli.servers.is_empty() {
        config.servers = cli.servers;
    }
    if let Some(interval) = cli.interval {
        config.interval = Some(interval);
        config.cron = None;
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    config.verbose |= cli.verbose;
    config.validate()?;

    let output = config
        .output
        .format
        .into_output(BufWriter::new(std::io::stdout()));
    let handles = SinkBuilder::new(output)
        .channel_capacity(config.output.channel_capacity)
        .batch_size(config.output.batch_size)
        .batch_flush_interval(config.output.flush_interval)
        .build()?;

    let collector = ErebCollector::new(config.to_ereb_config()?, handles.writer.clone());
    tracing::info!(
        endpoints = collector.endpoints().len(),
        schedule = %collector.schedule(),
        format = %config.output.format,
        "ereb collector configured"
    );

    if cli.once {
        let result = collector.collect().await;
        shutdown_sink(handles).await;
        let summary = result?;
        tracing::info!(
            records = summary.records,
            failed_units = summary.errors,
            duration_ms = summary.elapsed.as_millis() as u64,
            "Collection complete"
        );
        return Ok(());
    }

    // First cycle runs immediately; the scheduler takes over from there
    let name = collector.name().to_string();
    run_collection(&collector, &name).await;

    let registry = CollectorRegistry::new().await?;
    registry.spawn(collector).await?;
    registry.start().await?;

    tracing::info!("Press Ctrl+C to shutdown");
    shutdown_signal().await;

    tracing::info!("Shutting down collectors...");
    if let Err(e) = registry.shutdown().await {
        tracing::error!(error = %e, "Failed to shutdown collectors");
    }

    shutdown_sink(handles).await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Flush and stop the sink writer thread.
async fn shutdown_sink(handles: SinkHandles) {
    match tokio::task::spawn_blocking(move || handles.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Failed to shutdown sink"),
        Err(e) => tracing::error!(error = %e, "Sink shutdown task failed"),
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
