//! Domain Layer - Quote and chart types.
//!
//! Pure types with no I/O: upstream quote records, the chart table schema,
//! row projection and view configuration.

/// Upstream quote records.
pub mod quote;

/// Chart table schema, rows and view configuration.
pub mod chart;
