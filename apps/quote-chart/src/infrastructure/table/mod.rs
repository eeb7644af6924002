//! Columnar Table Adapter
//!
//! In-process implementation of [`TablePort`] and [`WorkerPort`].
//!
//! # Design
//!
//! Each declared column is stored as one typed vector. Appends are staged
//! into fresh vectors first and only spliced into storage once every row in
//! the batch has been accepted, so a rejected batch leaves the table as it
//! was. Readers observe changes through a `watch` channel carrying a version
//! number.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::application::ports::{TableError, TablePort, WorkerPort};
use crate::domain::chart::{CellValue, ColumnType, SchemaViolation, TableRow, TableSchema};

// =============================================================================
// Column Storage
// =============================================================================

#[derive(Debug, Clone)]
enum ColumnData {
    String(Vec<String>),
    Float(Vec<f64>),
    Date(Vec<DateTime<Utc>>),
}

impl ColumnData {
    const fn empty(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::String => Self::String(Vec::new()),
            ColumnType::Float => Self::Float(Vec::new()),
            ColumnType::Date => Self::Date(Vec::new()),
        }
    }

    const fn column_type(&self) -> ColumnType {
        match self {
            Self::String(_) => ColumnType::String,
            Self::Float(_) => ColumnType::Float,
            Self::Date(_) => ColumnType::Date,
        }
    }

    fn push(&mut self, column: &str, value: CellValue) -> Result<(), SchemaViolation> {
        match (self, value) {
            (Self::String(values), CellValue::String(v)) => values.push(v),
            (Self::Float(values), CellValue::Float(v)) => values.push(v),
            (Self::Date(values), CellValue::Date(v)) => values.push(v),
            (this, value) => {
                return Err(SchemaViolation::TypeMismatch {
                    column: column.to_string(),
                    expected: this.column_type(),
                    actual: value.column_type(),
                });
            }
        }
        Ok(())
    }

    fn append(&mut self, other: Self) {
        match (self, other) {
            (Self::String(values), Self::String(more)) => values.extend(more),
            (Self::Float(values), Self::Float(more)) => values.extend(more),
            (Self::Date(values), Self::Date(more)) => values.extend(more),
            // Staged columns are built from the same schema.
            _ => {}
        }
    }

    fn get(&self, index: usize) -> Option<CellValue> {
        match self {
            Self::String(values) => values.get(index).cloned().map(CellValue::String),
            Self::Float(values) => values.get(index).copied().map(CellValue::Float),
            Self::Date(values) => values.get(index).copied().map(CellValue::Date),
        }
    }
}

#[derive(Debug)]
struct Storage {
    columns: Vec<ColumnData>,
    len: usize,
    deleted: bool,
}

// =============================================================================
// Columnar Table
// =============================================================================

/// Append-only in-memory columnar table.
///
/// # Example
///
/// ```rust
/// use quote_chart::application::ports::TablePort;
/// use quote_chart::domain::chart::{CellValue, ColumnType, TableRow, TableSchema};
/// use quote_chart::infrastructure::table::ColumnarTable;
///
/// let schema = TableSchema::new([("price", ColumnType::Float)]);
/// let table = ColumnarTable::new(schema).unwrap();
///
/// table
///     .update(vec![TableRow::new().with("price", CellValue::Float(1.5))])
///     .unwrap();
/// assert_eq!(table.size(), 1);
/// ```
#[derive(Debug)]
pub struct ColumnarTable {
    schema: TableSchema,
    storage: RwLock<Storage>,
    version: watch::Sender<u64>,
}

impl ColumnarTable {
    /// Create an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::EmptySchema`] if the schema has no columns.
    pub fn new(schema: TableSchema) -> Result<Self, TableError> {
        if schema.is_empty() {
            return Err(TableError::EmptySchema);
        }

        let columns = schema
            .columns()
            .iter()
            .map(|c| ColumnData::empty(c.column_type))
            .collect();

        Ok(Self {
            schema,
            storage: RwLock::new(Storage {
                columns,
                len: 0,
                deleted: false,
            }),
            version: watch::Sender::new(0),
        })
    }

    /// Current version; starts at 0 and increases with every change.
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    fn stage(&self, rows: Vec<TableRow>) -> Result<Vec<ColumnData>, TableError> {
        let mut staged: Vec<ColumnData> = self
            .schema
            .columns()
            .iter()
            .map(|c| ColumnData::empty(c.column_type))
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            self.schema
                .validate(&row)
                .map_err(|violation| TableError::SchemaMismatch { index, violation })?;

            for (name, value) in row.into_cells() {
                let Some(position) = self.schema.index_of(&name) else {
                    return Err(TableError::SchemaMismatch {
                        index,
                        violation: SchemaViolation::UnknownColumn(name),
                    });
                };
                staged[position]
                    .push(&name, value)
                    .map_err(|violation| TableError::SchemaMismatch { index, violation })?;
            }
        }

        Ok(staged)
    }
}

impl TablePort for ColumnarTable {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn size(&self) -> usize {
        self.storage.read().len
    }

    fn update(&self, rows: Vec<TableRow>) -> Result<(), TableError> {
        if self.storage.read().deleted {
            return Err(TableError::Deleted);
        }

        let count = rows.len();
        let staged = self.stage(rows)?;

        {
            let mut storage = self.storage.write();
            if storage.deleted {
                return Err(TableError::Deleted);
            }
            for (column, more) in storage.columns.iter_mut().zip(staged) {
                column.append(more);
            }
            storage.len += count;
        }

        self.version.send_modify(|v| *v += 1);
        Ok(())
    }

    fn rows(&self) -> Result<Vec<TableRow>, TableError> {
        let storage = self.storage.read();
        if storage.deleted {
            return Err(TableError::Deleted);
        }

        let rows = (0..storage.len)
            .map(|i| {
                self.schema
                    .columns()
                    .iter()
                    .zip(&storage.columns)
                    .filter_map(|(def, column)| column.get(i).map(|v| (def.name.clone(), v)))
                    .fold(TableRow::new(), |row, (name, value)| row.with(name, value))
            })
            .collect();

        Ok(rows)
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn delete(&self) {
        {
            let mut storage = self.storage.write();
            if storage.deleted {
                return;
            }
            storage.deleted = true;
            storage.columns.clear();
            storage.len = 0;
        }
        self.version.send_modify(|v| *v += 1);
    }

    fn is_deleted(&self) -> bool {
        self.storage.read().deleted
    }
}

// =============================================================================
// Local Worker
// =============================================================================

/// Worker that creates [`ColumnarTable`]s in-process.
#[derive(Debug, Clone, Copy)]
pub struct LocalWorker {
    available: bool,
}

impl Default for LocalWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalWorker {
    /// An available worker.
    #[must_use]
    pub const fn new() -> Self {
        Self { available: true }
    }

    /// A worker that refuses to create tables.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self { available: false }
    }
}

impl WorkerPort for LocalWorker {
    fn is_available(&self) -> bool {
        self.available
    }

    fn table(&self, schema: TableSchema) -> Result<Arc<dyn TablePort>, TableError> {
        if !self.available {
            return Err(TableError::WorkerUnavailable);
        }
        Ok(Arc::new(ColumnarTable::new(schema)?))
    }
}

// =============================================================================
// Tests
// =============================================================================
