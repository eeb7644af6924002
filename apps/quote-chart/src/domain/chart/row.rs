//! Chart Rows
//!
//! Projection of upstream quote records into the chart table's row schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schema::{CellValue, ColumnType, TableRow, TableSchema};
use crate::domain::quote::QuoteRecord;

/// Stock identifier column.
pub const STOCK: &str = "stock";
/// Best ask price column.
pub const TOP_ASK_PRICE: &str = "top_ask_price";
/// Best bid price column.
pub const TOP_BID_PRICE: &str = "top_bid_price";
/// Snapshot time column.
pub const TIMESTAMP: &str = "timestamp";

/// Schema of the chart table.
#[must_use]
pub fn chart_schema() -> TableSchema {
    TableSchema::new([
        (STOCK, ColumnType::String),
        (TOP_ASK_PRICE, ColumnType::Float),
        (TOP_BID_PRICE, ColumnType::Float),
        (TIMESTAMP, ColumnType::Date),
    ])
}

/// One row of the chart table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    /// Stock identifier.
    pub stock: String,
    /// Best ask price, 0 when the book has no ask.
    pub top_ask_price: f64,
    /// Best bid price, 0 when the book has no bid.
    pub top_bid_price: f64,
    /// Snapshot time.
    pub timestamp: DateTime<Utc>,
}

impl From<&QuoteRecord> for ChartRow {
    fn from(quote: &QuoteRecord) -> Self {
        Self {
            stock: quote.stock.clone(),
            top_ask_price: quote.top_ask.map_or(0.0, |level| level.price),
            top_bid_price: quote.top_bid.map_or(0.0, |level| level.price),
            timestamp: quote.timestamp,
        }
    }
}

impl From<ChartRow> for TableRow {
    fn from(row: ChartRow) -> Self {
        Self::new()
            .with(STOCK, CellValue::String(row.stock))
            .with(TOP_ASK_PRICE, CellValue::Float(row.top_ask_price))
            .with(TOP_BID_PRICE, CellValue::Float(row.top_bid_price))
            .with(TIMESTAMP, CellValue::Date(row.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use test_case::test_case;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn projects_end_to_end_example() {
        let quote = QuoteRecord::new("AAPL", ts()).with_ask(150.5, 100);

        let row = ChartRow::from(&quote);

        assert_eq!(
            row,
            ChartRow {
                stock: "AAPL".to_string(),
                top_ask_price: 150.5,
                top_bid_price: 0.0,
                timestamp: ts(),
            }
        );
    }

    #[test_case(None, None => (0.0, 0.0); "both sides absent")]
    #[test_case(Some(10.0), None => (10.0, 0.0); "bid absent")]
    #[test_case(None, Some(9.5) => (0.0, 9.5); "ask absent")]
    #[test_case(Some(10.0), Some(9.5) => (10.0, 9.5); "both sides present")]
    fn missing_prices_default_to_zero(ask: Option<f64>, bid: Option<f64>) -> (f64, f64) {
        let mut quote = QuoteRecord::new("ABC", ts());
        if let Some(price) = ask {
            quote = quote.with_ask(price, 1);
        }
        if let Some(price) = bid {
            quote = quote.with_bid(price, 1);
        }

        let row = ChartRow::from(&quote);
        (row.top_ask_price, row.top_bid_price)
    }

    #[test]
    fn table_row_has_schema_column_order() {
        let row = TableRow::from(ChartRow::from(&QuoteRecord::new("ABC", ts())));
        let names: Vec<_> = row.cells().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, [STOCK, TOP_ASK_PRICE, TOP_BID_PRICE, TIMESTAMP]);
    }

    proptest! {
        #[test]
        fn projected_rows_conform_to_chart_schema(
            stock in "[A-Z]{1,5}",
            ask in proptest::option::of((0.0f64..10_000.0, 0u64..10_000)),
            bid in proptest::option::of((0.0f64..10_000.0, 0u64..10_000)),
            secs in 0i64..4_000_000_000,
        ) {
            let mut quote = QuoteRecord::new(stock, Utc.timestamp_opt(secs, 0).unwrap());
            if let Some((price, size)) = ask {
                quote = quote.with_ask(price, size);
            }
            if let Some((price, size)) = bid {
                quote = quote.with_bid(price, size);
            }

            let row = TableRow::from(ChartRow::from(&quote));

            prop_assert_eq!(row.cells().len(), chart_schema().len());
            prop_assert!(chart_schema().validate(&row).is_ok());
        }
    }
}
