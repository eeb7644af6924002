//! Table Schema and Cells
//!
//! Column declarations for the columnar chart table and the typed cell values
//! that rows carry. A row conforms to a schema when it has exactly the
//! declared columns, each holding a value of the declared type.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Column Types
// =============================================================================

/// Declared type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// UTF-8 string.
    String,
    /// 64-bit float.
    Float,
    /// UTC date-time.
    Date,
}

impl ColumnType {
    /// Type name as used in schema declarations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Float => "float",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// String cell.
    String(String),
    /// Float cell.
    Float(f64),
    /// Date cell.
    Date(DateTime<Utc>),
}

impl CellValue {
    /// The column type this value belongs in.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        match self {
            Self::String(_) => ColumnType::String,
            Self::Float(_) => ColumnType::Float,
            Self::Date(_) => ColumnType::Date,
        }
    }

    /// Float payload, if any.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

/// A column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Column type.
    pub column_type: ColumnType,
}

/// Ordered column declarations of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Build a schema from `(name, type)` pairs.
    #[must_use]
    pub fn new<N: Into<String>>(columns: impl IntoIterator<Item = (N, ColumnType)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, column_type)| ColumnDef {
                    name: name.into(),
                    column_type,
                })
                .collect(),
        }
    }

    /// Column declarations in order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema declares no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Declared type of a column.
    #[must_use]
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.column_type)
    }

    /// Check a row against this schema.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self, row: &TableRow) -> Result<(), SchemaViolation> {
        for (name, value) in row.cells() {
            let Some(expected) = self.column_type(name) else {
                return Err(SchemaViolation::UnknownColumn(name.clone()));
            };
            if value.column_type() != expected {
                return Err(SchemaViolation::TypeMismatch {
                    column: name.clone(),
                    expected,
                    actual: value.column_type(),
                });
            }
        }

        if let Some(missing) = self.columns.iter().find(|c| row.get(&c.name).is_none()) {
            return Err(SchemaViolation::MissingColumn(missing.name.clone()));
        }

        Ok(())
    }
}

/// Ways a row can fail to conform to a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    /// Row carries a column the schema does not declare.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    /// Row lacks a declared column.
    #[error("missing column: {0}")]
    MissingColumn(String),
    /// Cell type differs from the declared type.
    #[error("column {column} expects {expected}, got {actual}")]
    TypeMismatch {
        /// Offending column.
        column: String,
        /// Declared type.
        expected: ColumnType,
        /// Type of the supplied value.
        actual: ColumnType,
    },
}

// =============================================================================
// Rows
// =============================================================================

/// A row keyed by column name, as handed to a table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    cells: Vec<(String, CellValue)>,
}

impl TableRow {
    /// Create an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Add a cell, replacing any earlier value for the same column.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: CellValue) -> Self {
        let name = name.into();
        self.cells.retain(|(n, _)| *n != name);
        self.cells.push((name, value));
        self
    }

    /// Look up a cell.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// All cells in insertion order.
    #[must_use]
    pub fn cells(&self) -> &[(String, CellValue)] {
        &self.cells
    }

    /// Consume the row into its cells.
    #[must_use]
    pub fn into_cells(self) -> Vec<(String, CellValue)> {
        self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> TableSchema {
        TableSchema::new([("name", ColumnType::String), ("value", ColumnType::Float)])
    }

    #[test]
    fn conforming_row_validates() {
        let row = TableRow::new()
            .with("value", CellValue::Float(1.5))
            .with("name", CellValue::String("a".to_string()));
        assert!(schema().validate(&row).is_ok());
    }

    #[test]
    fn unknown_column_rejected() {
        let row = TableRow::new()
            .with("name", CellValue::String("a".to_string()))
            .with("value", CellValue::Float(1.5))
            .with("extra", CellValue::Float(0.0));
        assert_eq!(
            schema().validate(&row),
            Err(SchemaViolation::UnknownColumn("extra".to_string()))
        );
    }

    #[test]
    fn missing_column_rejected() {
        let row = TableRow::new().with("name", CellValue::String("a".to_string()));
        assert_eq!(
            schema().validate(&row),
            Err(SchemaViolation::MissingColumn("value".to_string()))
        );
    }

    #[test]
    fn type_mismatch_rejected() {
        let row = TableRow::new()
            .with("name", CellValue::Float(1.0))
            .with("value", CellValue::Float(1.5));
        assert!(matches!(
            schema().validate(&row),
            Err(SchemaViolation::TypeMismatch {
                expected: ColumnType::String,
                actual: ColumnType::Float,
                ..
            })
        ));
    }

    #[test]
    fn with_replaces_existing_cell() {
        let row = TableRow::new()
            .with("value", CellValue::Float(1.0))
            .with("value", CellValue::Float(2.0));
        assert_eq!(row.cells().len(), 1);
        assert_eq!(row.get("value"), Some(&CellValue::Float(2.0)));
    }

    #[test]
    fn column_type_names() {
        assert_eq!(ColumnType::String.as_str(), "string");
        assert_eq!(ColumnType::Float.as_str(), "float");
        assert_eq!(ColumnType::Date.to_string(), "date");
    }
}
