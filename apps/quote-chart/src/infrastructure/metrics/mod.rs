//! Prometheus Metrics Module
//!
//! Counters and gauges for the chart binding.
//!
//! # Metrics
//!
//! - **Updates**: update calls by outcome, rows appended
//! - **Degradations**: prices defaulted to zero, missing worker
//! - **Table**: current row count
//!
//! Recording is a no-op until [`init_metrics`] installs the recorder.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder.
///
/// Subsequent calls return the handle installed by the first one.
///
/// # Errors
///
/// Returns an error if another recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "quote_chart_updates_total",
        "Update calls received by the chart, by outcome"
    );
    describe_counter!(
        "quote_chart_rows_appended_total",
        "Rows appended to the chart table"
    );
    describe_counter!(
        "quote_chart_prices_defaulted_total",
        "Missing ask/bid prices substituted with zero"
    );
    describe_counter!(
        "quote_chart_worker_unavailable_total",
        "Initializations skipped because no worker was available"
    );
    describe_gauge!("quote_chart_table_rows", "Rows currently in the chart table");
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Outcome label for update calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateLabel {
    /// Rows were appended.
    Appended,
    /// Nothing new since the last update.
    NoNewRecords,
    /// No table bound.
    Unbound,
    /// Table rejected the batch.
    Failed,
}

impl UpdateLabel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Appended => "appended",
            Self::NoNewRecords => "no_new_records",
            Self::Unbound => "unbound",
            Self::Failed => "failed",
        }
    }
}

/// Book side label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Ask side.
    Ask,
    /// Bid side.
    Bid,
}

impl Side {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Bid => "bid",
        }
    }
}

/// Record an update call.
pub fn record_update(outcome: UpdateLabel) {
    counter!("quote_chart_updates_total", "outcome" => outcome.as_str()).increment(1);
}

/// Record rows appended to the table.
pub fn record_rows_appended(count: u64) {
    counter!("quote_chart_rows_appended_total").increment(count);
}

/// Record prices defaulted to zero.
pub fn record_prices_defaulted(side: Side, count: u64) {
    if count > 0 {
        counter!("quote_chart_prices_defaulted_total", "side" => side.as_str()).increment(count);
    }
}

/// Record an initialization skipped for lack of a worker.
pub fn record_worker_unavailable() {
    counter!("quote_chart_worker_unavailable_total").increment(1);
}

/// Update the table row gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_table_rows(rows: usize) {
    gauge!("quote_chart_table_rows").set(rows as f64);
}

// =============================================================================
// Tests
// =============================================================================
