//! Chart Table Types
//!
//! The columnar schema backing the chart, the row projection from quote
//! records, and the declarative view configuration applied to a surface.

mod row;
mod schema;
mod view;

pub use row::{ChartRow, STOCK, TIMESTAMP, TOP_ASK_PRICE, TOP_BID_PRICE, chart_schema};
pub use schema::{CellValue, ColumnDef, ColumnType, SchemaViolation, TableRow, TableSchema};
pub use view::{
    ATTR_AGGREGATES, ATTR_COLUMN_PIVOTS, ATTR_COLUMNS, ATTR_ROW_PIVOTS, ATTR_VIEW, Aggregate,
    ChartType, ViewConfig, ViewConfigError,
};
