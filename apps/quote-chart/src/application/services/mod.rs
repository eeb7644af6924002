//! Application Services
//!
//! - `QuoteGraph`: binds quote snapshots to a chart table and surface

mod quote_graph;

pub use quote_graph::{GraphError, InitOutcome, QuoteGraph, UpdateOutcome};
