//! Application Layer - Chart lifecycle and port definitions.
//!
//! This layer contains the chart binding service and the port interfaces
//! that define how it reaches tables, surfaces and quote sources.

/// Port interfaces for tables, surfaces and quote sources.
pub mod ports;

/// The chart binding service.
pub mod services;
