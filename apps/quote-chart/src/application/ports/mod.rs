//! Port Interfaces
//!
//! Contracts between the chart component and its collaborators.
//!
//! ## Driven Ports (Outbound)
//!
//! - `WorkerPort`: creates tables; may be unavailable
//! - `TablePort`: the columnar table backing a chart
//! - `ChartSurface`: the rendering surface bound to a table
//!
//! ## Driver Ports (Inbound)
//!
//! - `QuoteSourcePort`: batches of quote records from upstream

mod quote_source_port;
mod surface_port;
mod table_port;

pub use quote_source_port::{FeedError, QuoteSourcePort};
pub use surface_port::{ChartSurface, SurfaceError};
pub use table_port::{TableError, TablePort, WorkerPort};

#[cfg(test)]
pub use surface_port::MockChartSurface;
#[cfg(test)]
pub use table_port::MockWorkerPort;
