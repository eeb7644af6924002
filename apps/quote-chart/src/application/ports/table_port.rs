//! Table Port (Driven Port)
//!
//! Interface to the columnar table that backs a chart, and to the worker
//! factory that creates tables.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::chart::{SchemaViolation, TableRow, TableSchema};

/// Table error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// A row in the batch does not conform to the table schema.
    #[error("row {index} does not match table schema: {violation}")]
    SchemaMismatch {
        /// Position of the offending row in the batch.
        index: usize,
        /// What was wrong with it.
        violation: SchemaViolation,
    },

    /// The table has been deleted.
    #[error("table has been deleted")]
    Deleted,

    /// The worker cannot create tables.
    #[error("worker unavailable")]
    WorkerUnavailable,

    /// The schema declares no columns.
    #[error("table schema is empty")]
    EmptySchema,
}

/// Append-only columnar table.
pub trait TablePort: Send + Sync {
    /// Declared schema.
    fn schema(&self) -> &TableSchema;

    /// Number of rows stored.
    fn size(&self) -> usize;

    /// Append a batch of rows.
    ///
    /// The batch is applied entirely or not at all.
    fn update(&self, rows: Vec<TableRow>) -> Result<(), TableError>;

    /// Materialize stored rows in append order.
    fn rows(&self) -> Result<Vec<TableRow>, TableError>;

    /// Watch the table version, bumped after each successful update.
    fn subscribe(&self) -> watch::Receiver<u64>;

    /// Release storage. Later updates fail with [`TableError::Deleted`].
    fn delete(&self);

    /// Whether [`TablePort::delete`] has been called.
    fn is_deleted(&self) -> bool;
}

/// Factory for tables, backed by a computation worker that may be absent.
#[cfg_attr(test, mockall::automock)]
pub trait WorkerPort: Send + Sync {
    /// Whether the worker can create tables.
    fn is_available(&self) -> bool;

    /// Create an empty table with the given schema.
    fn table(&self, schema: TableSchema) -> Result<Arc<dyn TablePort>, TableError>;
}
