//! Configuration Module
//!
//! Configuration loading for the quote chart.

mod settings;

pub use settings::{ChartConfig, ConfigError, InputSource, WorkerMode};
