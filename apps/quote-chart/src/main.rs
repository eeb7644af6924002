//! Quote Chart Binary
//!
//! Reads quote batches, accumulates them, and feeds the cumulative history to
//! a headless quote chart, logging what the chart shows after each change.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin quote-chart < quotes.jsonl
//! ```
//!
//! # Environment Variables
//!
//! - `QUOTE_CHART_INPUT`: JSON-lines file to read (default: stdin, `-` also means stdin)
//! - `QUOTE_CHART_WORKER`: `enabled` | `disabled` (default: enabled)
//! - `QUOTE_CHART_METRICS`: Install the Prometheus recorder (default: true)
//! - `QUOTE_CHART_CHANNEL_CAPACITY`: Feed channel capacity (default: 256)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `RUST_LOG`: Log level (default: quote_chart=info)

use std::sync::Arc;

use quote_chart::infrastructure::feed::forward_batches;
use quote_chart::infrastructure::metrics;
use quote_chart::infrastructure::telemetry;
use quote_chart::{
    ChartConfig, HeadlessViewer, InputSource, JsonLinesSource, LocalWorker, QuoteGraph,
    QuoteRecord, UpdateOutcome, WorkerMode, WorkerPort,
};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let _telemetry_guard = telemetry::init()?;

    tracing::info!("Starting Quote Chart");

    let config = ChartConfig::from_env()?;
    log_config(&config);

    if config.metrics_enabled {
        metrics::init_metrics()?;
    }

    let worker: Option<Arc<dyn WorkerPort>> = match config.worker {
        WorkerMode::Enabled => Some(Arc::new(LocalWorker::new())),
        WorkerMode::Disabled => None,
    };
    let viewer = Arc::new(HeadlessViewer::new());
    let mut graph = QuoteGraph::new(worker, viewer.clone());

    let outcome = graph.initialize()?;
    tracing::info!(?outcome, "Chart initialization finished");

    let shutdown_token = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel::<Vec<QuoteRecord>>(config.channel_capacity);

    let feed_token = shutdown_token.clone();
    let feed = match config.input.clone() {
        InputSource::Stdin => tokio::spawn(forward_batches(JsonLinesSource::stdin(), tx, feed_token)),
        InputSource::File(path) => {
            let source = JsonLinesSource::open(&path).await?;
            tokio::spawn(forward_batches(source, tx, feed_token))
        }
    };

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        await_shutdown(signal_token).await;
    });

    let mut history: Vec<QuoteRecord> = Vec::new();
    loop {
        tokio::select! {
            () = shutdown_token.cancelled() => break,
            batch = rx.recv() => {
                let Some(batch) = batch else { break };
                history.extend(batch);
                apply_snapshot(&mut graph, &viewer, &history);
            }
        }
    }

    shutdown_token.cancel();
    match feed.await {
        Ok(Ok(batches)) => tracing::debug!(batches, "Feed task finished"),
        Ok(Err(e)) => tracing::error!(error = %e, "Quote feed failed"),
        Err(e) => tracing::error!(error = %e, "Feed task failed"),
    }

    report(&viewer);
    graph.dispose();

    if let Some(handle) = metrics::get_metrics_handle() {
        tracing::debug!(metrics = %handle.render(), "Final metrics");
    }

    tracing::info!(quotes = history.len(), "Quote Chart stopped");
    Ok(())
}

/// Feed the cumulative history to the chart and log what changed.
fn apply_snapshot(graph: &mut QuoteGraph, viewer: &HeadlessViewer, history: &[QuoteRecord]) {
    match graph.apply_update(history) {
        Ok(UpdateOutcome::Appended { rows }) => {
            tracing::debug!(rows, total = history.len(), "Chart updated");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Chart update failed"),
    }

    if viewer.has_pending_changes() {
        report(viewer);
    }
}

/// Log the rendered chart: one line per series with its latest point.
fn report(viewer: &HeadlessViewer) {
    let view = match viewer.render() {
        Ok(view) => view,
        Err(e) => {
            tracing::debug!(error = %e, "Nothing to render");
            return;
        }
    };

    tracing::info!(
        rows = view.source_rows(),
        points = view.row_keys().len(),
        series = view.column_keys().len(),
        "Chart rendered"
    );

    let config = viewer.config();
    for column in &config.columns {
        for series in view.column_keys() {
            if let Some((at, value)) = view.series(series, column).last() {
                tracing::info!(
                    series = %series,
                    column = %column,
                    at = %at,
                    value,
                    "Latest point"
                );
            }
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &ChartConfig) {
    let input = match &config.input {
        InputSource::Stdin => "stdin".to_string(),
        InputSource::File(path) => path.display().to_string(),
    };
    tracing::info!(
        input = %input,
        worker = config.worker.as_str(),
        metrics = config.metrics_enabled,
        channel_capacity = config.channel_capacity,
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
        () = shutdown_token.cancelled() => return,
    }

    shutdown_token.cancel();
}
