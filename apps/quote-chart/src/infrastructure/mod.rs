//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// In-process columnar table and worker.
pub mod table;

/// Headless chart surface.
pub mod surface;

/// JSON-lines quote feed.
pub mod feed;

/// Configuration loading.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Tracing and OpenTelemetry integration.
pub mod telemetry;
