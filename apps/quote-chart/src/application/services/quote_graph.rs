//! Quote Graph
//!
//! Binds a cumulative collection of quote records to a chart surface.
//!
//! The owner drives the lifecycle explicitly:
//!
//! 1. [`QuoteGraph::initialize`] creates the table, configures the surface
//!    and loads the table into it. Runs at most once per binding.
//! 2. [`QuoteGraph::apply_update`] receives *all* records known so far and
//!    appends only those that arrived since the previous call.
//! 3. [`QuoteGraph::dispose`] releases the table. Also runs on drop.

use std::sync::Arc;

use crate::application::ports::{ChartSurface, SurfaceError, TableError, TablePort, WorkerPort};
use crate::domain::chart::{ChartRow, TableRow, ViewConfig, ViewConfigError, chart_schema};
use crate::domain::quote::QuoteRecord;
use crate::infrastructure::metrics::{self, Side, UpdateLabel};

/// Result of [`QuoteGraph::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Table created and loaded into the surface.
    Bound,
    /// A table was already bound; nothing changed.
    AlreadyInitialized,
    /// No worker to create a table with; updates will be no-ops.
    WorkerUnavailable,
}

/// Result of [`QuoteGraph::apply_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Newly arrived records were appended.
    Appended {
        /// Number of rows appended.
        rows: usize,
    },
    /// The collection holds nothing new.
    NoNewRecords,
    /// No table is bound.
    Unbound,
}

/// Chart binding error.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Table creation or append failed.
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// The surface rejected its configuration or the table.
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// The view configuration could not be encoded.
    #[error("view configuration error: {0}")]
    View(#[from] ViewConfigError),
}

/// Live quote chart component.
pub struct QuoteGraph {
    worker: Option<Arc<dyn WorkerPort>>,
    surface: Arc<dyn ChartSurface>,
    view: ViewConfig,
    table: Option<Arc<dyn TablePort>>,
    /// Number of leading records of the caller's collection already appended.
    applied: usize,
}

impl QuoteGraph {
    /// Create an unbound component with the standard quote chart view.
    ///
    /// `worker` is `None` when no computation worker exists in this
    /// environment; the chart then stays disabled.
    #[must_use]
    pub fn new(worker: Option<Arc<dyn WorkerPort>>, surface: Arc<dyn ChartSurface>) -> Self {
        Self {
            worker,
            surface,
            view: ViewConfig::quote_chart(),
            table: None,
            applied: 0,
        }
    }

    /// Replace the view configuration applied on initialization.
    #[must_use]
    pub fn with_view(mut self, view: ViewConfig) -> Self {
        self.view = view;
        self
    }

    /// Whether a table is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.table.is_some()
    }

    /// Number of caller records already appended.
    #[must_use]
    pub const fn applied(&self) -> usize {
        self.applied
    }

    /// The bound table, if any.
    #[must_use]
    pub fn table(&self) -> Option<&Arc<dyn TablePort>> {
        self.table.as_ref()
    }

    /// Create the table and bind it to the surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker fails to create the table or the
    /// surface rejects the configuration. The component stays unbound.
    pub fn initialize(&mut self) -> Result<InitOutcome, GraphError> {
        if self.table.is_some() {
            tracing::debug!("Chart already initialized");
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let Some(worker) = self.worker.as_ref().filter(|w| w.is_available()) else {
            metrics::record_worker_unavailable();
            tracing::warn!("No worker available, chart disabled");
            return Ok(InitOutcome::WorkerUnavailable);
        };

        let table = worker.table(chart_schema())?;

        if let Err(e) = self.bind(&table) {
            table.delete();
            return Err(e);
        }

        self.table = Some(table);
        self.applied = 0;
        metrics::set_table_rows(0);
        tracing::info!(view = self.view.chart_type.as_str(), "Chart initialized");

        Ok(InitOutcome::Bound)
    }

    fn bind(&self, table: &Arc<dyn TablePort>) -> Result<(), GraphError> {
        for (name, value) in self.view.to_attributes()? {
            self.surface.set_attribute(name, &value)?;
        }
        self.surface.load(Arc::clone(table))?;
        Ok(())
    }

    /// Append records that arrived since the previous update.
    ///
    /// `records` is the caller's full collection. If it is shorter than what
    /// was already applied, the caller's history was reset and the whole
    /// collection is appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the table rejects the batch. Nothing is appended
    /// and the next update retries the same records.
    pub fn apply_update(&mut self, records: &[QuoteRecord]) -> Result<UpdateOutcome, GraphError> {
        let Some(table) = self.table.as_ref() else {
            metrics::record_update(UpdateLabel::Unbound);
            tracing::debug!(records = records.len(), "Update ignored, chart not initialized");
            return Ok(UpdateOutcome::Unbound);
        };

        if records.len() < self.applied {
            tracing::info!(
                previous = self.applied,
                current = records.len(),
                "Quote history shrank, treating collection as new"
            );
            self.applied = 0;
        }

        let fresh = &records[self.applied..];
        if fresh.is_empty() {
            metrics::record_update(UpdateLabel::NoNewRecords);
            return Ok(UpdateOutcome::NoNewRecords);
        }

        let missing_asks = fresh.iter().filter(|q| q.top_ask.is_none()).count();
        let missing_bids = fresh.iter().filter(|q| q.top_bid.is_none()).count();
        if missing_asks + missing_bids > 0 {
            tracing::debug!(missing_asks, missing_bids, "Defaulting missing prices to zero");
        }

        let rows: Vec<TableRow> = fresh
            .iter()
            .map(|quote| TableRow::from(ChartRow::from(quote)))
            .collect();

        if let Err(e) = table.update(rows) {
            metrics::record_update(UpdateLabel::Failed);
            tracing::error!(error = %e, "Table rejected update");
            return Err(e.into());
        }

        let appended = fresh.len();
        self.applied = records.len();

        metrics::record_update(UpdateLabel::Appended);
        metrics::record_rows_appended(appended as u64);
        metrics::record_prices_defaulted(Side::Ask, missing_asks as u64);
        metrics::record_prices_defaulted(Side::Bid, missing_bids as u64);
        metrics::set_table_rows(table.size());
        tracing::debug!(rows = appended, total = table.size(), "Appended quotes");

        Ok(UpdateOutcome::Appended { rows: appended })
    }

    /// Release the table and detach it from the surface.
    pub fn dispose(&mut self) {
        if let Some(table) = self.table.take() {
            self.surface.unload();
            table.delete();
            self.applied = 0;
            metrics::set_table_rows(0);
            tracing::info!("Chart disposed");
        }
    }
}

impl Drop for QuoteGraph {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for QuoteGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteGraph")
            .field("has_worker", &self.worker.is_some())
            .field("bound", &self.table.is_some())
            .field("applied", &self.applied)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
