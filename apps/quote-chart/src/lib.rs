#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::needless_pass_by_value,
        clippy::redundant_clone
    )
)]

//! Quote Chart - Live Quote Visualization Binding
//!
//! Binds a growing collection of stock quote snapshots to a columnar table
//! and a chart surface. The table is created once, the surface is configured
//! declaratively, and each update appends only the quotes that arrived since
//! the previous one.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Quote records, chart schema, row projection, view config
//! - **Application**: Ports (worker, table, surface, quote source) and the
//!   `QuoteGraph` binding service
//! - **Infrastructure**: In-process columnar table, headless surface,
//!   JSON-lines feed, configuration, metrics, telemetry
//!
//! # Data Flow
//!
//! ```text
//! quote batches ──► cumulative history ──► QuoteGraph ──► Table ──► Surface
//!                                          (new suffix)   (append)  (render)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Quote and chart types with no I/O.
pub mod domain;

/// Application layer - Chart binding service and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::chart::{ChartRow, TableRow, TableSchema, ViewConfig, chart_schema};
pub use domain::quote::{PriceLevel, QuoteRecord};

// Application
pub use application::ports::{
    ChartSurface, FeedError, QuoteSourcePort, SurfaceError, TableError, TablePort, WorkerPort,
};
pub use application::services::{GraphError, InitOutcome, QuoteGraph, UpdateOutcome};

// Infrastructure adapters
pub use infrastructure::config::{ChartConfig, ConfigError, InputSource, WorkerMode};
pub use infrastructure::feed::JsonLinesSource;
pub use infrastructure::surface::{HeadlessViewer, PivotKey, PivotView};
pub use infrastructure::table::{ColumnarTable, LocalWorker};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
