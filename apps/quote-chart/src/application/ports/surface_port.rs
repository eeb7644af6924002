//! Chart Surface Port (Driven Port)
//!
//! The rendering surface a chart is drawn on. It is configured through named
//! attributes and bound to a table with `load`; afterwards it observes the
//! table and redraws on its own.

use std::sync::Arc;

use super::table_port::{TableError, TablePort};
use crate::domain::chart::ViewConfigError;

/// Chart surface error.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// Attribute rejected by the surface.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(#[from] ViewConfigError),

    /// No table has been loaded.
    #[error("no table loaded")]
    NotLoaded,

    /// Reading the loaded table failed.
    #[error("table error: {0}")]
    Table(#[from] TableError),
}

/// Rendering surface capability.
#[cfg_attr(test, mockall::automock)]
pub trait ChartSurface: Send + Sync {
    /// Set a configuration attribute.
    fn set_attribute(&self, name: &str, value: &str) -> Result<(), SurfaceError>;

    /// Bind a table; the surface re-renders whenever it changes.
    fn load(&self, table: Arc<dyn TablePort>) -> Result<(), SurfaceError>;

    /// Drop the bound table, if any.
    fn unload(&self);
}
